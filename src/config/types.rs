use crate::error::{Error, Result};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// A Twemproxy (nutcracker) configuration file: pool name -> pool.
///
/// Only the keys needed to reach the backends directly are read; listen
/// address, hashing and distribution settings are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ProxyConfig {
    pools: BTreeMap<String, PoolConfig>,
}

/// One named server pool.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default)]
    pub redis_auth: Option<String>,
}

impl ProxyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded proxy configuration from {}", path.display());
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn pool(&self, name: &str) -> Result<&PoolConfig> {
        self.pools
            .get(name)
            .ok_or_else(|| Error::PoolNotFound(name.to_string()))
    }

    pub fn pool_names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }
}

impl PoolConfig {
    /// Password for AUTH, if one is configured.
    pub fn auth(&self) -> Option<&str> {
        self.redis_auth.as_deref().filter(|a| !a.is_empty())
    }

    /// Backend addresses (`host:port`) in configuration order.
    ///
    /// Server entries look like `host:port:weight [name]`; weight and name
    /// only matter to the proxy's own hashing.
    pub fn addresses(&self) -> Result<Vec<String>> {
        if self.servers.is_empty() {
            return Err(Error::Config("pool has no servers".to_string()));
        }

        self.servers.iter().map(|entry| parse_server(entry)).collect()
    }
}

fn parse_server(entry: &str) -> Result<String> {
    let hostport = entry.split_whitespace().next().unwrap_or_default();
    let mut parts = hostport.split(':');

    let host = parts.next().filter(|h| !h.is_empty());
    let port = parts.next().and_then(|p| p.parse::<u16>().ok());

    match (host, port) {
        (Some(host), Some(port)) => Ok(format!("{}:{}", host, port)),
        _ => Err(Error::Config(format!("invalid server entry '{}'", entry))),
    }
}

/// Connection pool settings for each backend.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Idle connections kept per shard.
    pub max_idle: usize,
    /// Idle connections older than this are closed instead of reused.
    pub idle_timeout: Duration,
    /// PING idle connections before handing them out.
    pub test_on_borrow: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            max_idle: 3,
            idle_timeout: Duration::from_secs(240),
            test_on_borrow: true,
        }
    }
}
