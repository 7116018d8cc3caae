use clap::{Parser, Subcommand};
use shard_unproxy::backend::tcp_factory;
use shard_unproxy::config::{BackendOptions, ProxyConfig};
use shard_unproxy::{Dispatcher, Error};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shard-unproxy", version, about = "Direct-to-shard commands for Twemproxy pools")]
struct Args {
    /// Twemproxy (nutcracker) configuration file
    #[arg(long, default_value = "./nutcracker.yml")]
    config: PathBuf,

    /// Pool in the configuration file whose servers are used
    #[arg(long, default_value = "alpha")]
    pool: String,

    /// Expected number of distinct keys (pre-sizes the key router)
    #[arg(long, default_value_t = 0)]
    key_capacity: usize,

    /// Skip the PING check on every shard at startup
    #[arg(long)]
    no_probe: bool,

    /// Idle connections kept per shard
    #[arg(long, default_value_t = 3)]
    max_idle: usize,

    /// Seconds before an idle connection is closed
    #[arg(long, default_value_t = 240)]
    idle_timeout: u64,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Serve BLPOP/BGSAVE over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// BLPOP a list forever, printing each element
    Listen {
        #[arg(long, default_value = "test:list")]
        key: String,

        /// Seconds each BLPOP blocks for
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tracing::info!("shard-unproxy v{} starting", env!("CARGO_PKG_VERSION"));

    // 1. Configuration:
    let config = ProxyConfig::load(&args.config)?;
    let pool = config.pool(&args.pool)?;
    tracing::info!(
        "Using pool '{}' from {} ({} servers)",
        args.pool,
        args.config.display(),
        pool.servers.len()
    );

    // 2. Shards:
    let options = BackendOptions {
        max_idle: args.max_idle,
        idle_timeout: Duration::from_secs(args.idle_timeout),
        ..BackendOptions::default()
    };
    let dispatcher = Arc::new(
        Dispatcher::connect(pool, args.key_capacity, tcp_factory(options), !args.no_probe).await?,
    );

    // 3. Run:
    match args.mode {
        Mode::Serve { bind } => serve(dispatcher, bind).await,
        Mode::Listen { key, timeout } => listen(&dispatcher, &key, Duration::from_secs(timeout)).await,
    }
}

async fn serve(dispatcher: Arc<Dispatcher>, bind: SocketAddr) -> anyhow::Result<()> {
    let app = shard_unproxy::server::router(dispatcher);

    tracing::info!("HTTP server listening on {}", bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn listen(dispatcher: &Dispatcher, key: &str, timeout: Duration) -> anyhow::Result<()> {
    tracing::info!("Waiting for items on '{}'...", key);

    loop {
        match dispatcher.blpop(key, timeout).await {
            Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
            Err(Error::Timeout { .. }) => {
                tracing::debug!("No items on '{}' within {:?}", key, timeout);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        if let Ok(directive) = level.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
