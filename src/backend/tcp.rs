//! TCP Shard
//!
//! A `Shard` backed by plain TCP connections to one backend, with a small
//! idle pool in front of the dialer.
//!
//! ## Responsibilities
//! - **Dialing**: connect, then AUTH when the pool has a password.
//! - **Reuse**: released connections go back to the idle list (up to
//!   `max_idle`), unless they broke or were dropped mid-command.
//! - **Borrow checks**: idle connections past `idle_timeout` are closed;
//!   the rest are PINGed first when `test_on_borrow` is set.

use super::resp::{Request, RespCodec};
use crate::config::BackendOptions;
use crate::error::{Error, Result};
use crate::routing::{Connection, Reply, Shard, Value};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

type RespStream = Framed<TcpStream, RespCodec>;

struct IdleConn {
    stream: RespStream,
    since: Instant,
}

pub struct TcpShard {
    address: String,
    auth: Option<String>,
    options: BackendOptions,
    idle: Arc<Mutex<Vec<IdleConn>>>,
}

impl TcpShard {
    pub fn new(address: impl Into<String>, auth: Option<&str>, options: BackendOptions) -> Self {
        Self {
            address: address.into(),
            auth: auth.map(str::to_string),
            options,
            idle: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    async fn dial(&self) -> Result<RespStream> {
        let socket = TcpStream::connect(&self.address)
            .await
            .map_err(|e| Error::Acquire(format!("{}: {}", self.address, e)))?;
        socket.set_nodelay(true)?;
        let mut stream = Framed::new(socket, RespCodec);

        if let Some(password) = &self.auth {
            roundtrip(&mut stream, "AUTH", &[Value::from(password.as_str())])
                .await
                .map_err(|e| Error::Acquire(format!("{}: AUTH failed: {}", self.address, e)))?;
        }

        tracing::debug!("Opened connection to {}", self.address);
        Ok(stream)
    }

    /// Takes the freshest usable idle connection, closing stale ones.
    async fn take_idle(&self) -> Option<RespStream> {
        loop {
            let candidate = self.idle.lock().pop()?;

            if candidate.since.elapsed() > self.options.idle_timeout {
                tracing::trace!("Closing idle connection to {}", self.address);
                continue;
            }

            let mut stream = candidate.stream;
            if self.options.test_on_borrow {
                if let Err(e) = roundtrip(&mut stream, "PING", &[]).await {
                    tracing::debug!("Idle connection to {} failed PING: {}", self.address, e);
                    continue;
                }
            }
            return Some(stream);
        }
    }
}

#[async_trait]
impl Shard for TcpShard {
    async fn acquire(&self) -> Result<Box<dyn Connection>> {
        let stream = match self.take_idle().await {
            Some(stream) => stream,
            None => self.dial().await?,
        };

        Ok(Box::new(TcpConnection {
            stream: Some(stream),
            idle: self.idle.clone(),
            max_idle: self.options.max_idle,
            in_flight: false,
            broken: false,
        }))
    }

    fn address(&self) -> &str {
        &self.address
    }
}

pub struct TcpConnection {
    stream: Option<RespStream>,
    idle: Arc<Mutex<Vec<IdleConn>>>,
    max_idle: usize,
    /// Set while a request awaits its reply; a connection released in this
    /// state has an unread reply pending and cannot be reused.
    in_flight: bool,
    broken: bool,
}

#[async_trait]
impl Connection for TcpConnection {
    async fn invoke(&mut self, name: &str, args: &[Value]) -> Reply {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Acquire("connection already released".to_string()))?;

        self.in_flight = true;
        let reply = roundtrip(stream, name, args).await;
        self.in_flight = false;

        if matches!(reply, Err(Error::Io(_)) | Err(Error::Protocol(_))) {
            self.broken = true;
        }
        reply
    }

    fn release(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        if self.broken || self.in_flight {
            return;
        }

        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(IdleConn {
                stream,
                since: Instant::now(),
            });
        }
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.release();
    }
}

/// Sends one request and reads its reply. A top-level error reply becomes
/// `Error::Invocation`.
async fn roundtrip(stream: &mut RespStream, name: &str, args: &[Value]) -> Reply {
    stream
        .send(Request {
            name: name.to_string(),
            args: args.to_vec(),
        })
        .await?;

    match stream.next().await {
        Some(Ok(Value::Error(message))) => Err(Error::Invocation(message)),
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(e),
        None => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed by server",
        ))),
    }
}
