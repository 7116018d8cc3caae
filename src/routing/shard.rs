//! Shard & Connection Capabilities
//!
//! The engine only needs three things from a backend client: get a connection
//! from a shard, run a command on it, and give it back. Any client library can
//! be wrapped behind these traits (see `crate::backend` for the bundled one).

use super::types::{Command, Reply, Value};
use crate::error::{Error, Result};

use async_trait::async_trait;
use std::sync::Arc;

/// A live connection to one backend instance.
#[async_trait]
pub trait Connection: Send {
    /// Runs `name args...`. May block for as long as the command does.
    async fn invoke(&mut self, name: &str, args: &[Value]) -> Reply;

    /// Hands the connection back to its shard. Must be idempotent.
    fn release(&mut self);
}

/// One independently reachable backend instance.
#[async_trait]
pub trait Shard: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn Connection>>;

    /// Human readable address, used in logs only.
    fn address(&self) -> &str {
        "<unknown>"
    }
}

pub type ShardRef = Arc<dyn Shard>;

/// Owns an acquired connection and releases it exactly once, on drop or on
/// `release()`, whichever comes first.
///
/// Holding the connection in a guard covers every exit path of a worker,
/// including the worker task being aborted or panicking mid-call.
pub struct ConnectionGuard {
    conn: Option<Box<dyn Connection>>,
}

impl ConnectionGuard {
    pub async fn acquire(shard: &dyn Shard) -> Result<Self> {
        let conn = shard.acquire().await?;
        Ok(Self { conn: Some(conn) })
    }

    pub async fn invoke(&mut self, cmd: &Command) -> Reply {
        self.invoke_raw(cmd.name(), &cmd.wire_args()).await
    }

    pub async fn invoke_raw(&mut self, name: &str, args: &[Value]) -> Reply {
        match self.conn.as_mut() {
            Some(conn) => conn.invoke(name, args).await,
            None => Err(Error::Acquire("connection already released".to_string())),
        }
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.release();
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
