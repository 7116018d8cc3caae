//! Command Dispatcher
//!
//! Entry point of the engine. A command tied to a key runs on the shard that
//! owns the key. Ownership is learnt the first time the key is seen, by racing
//! the command on every shard and keeping the first reply the caller's
//! predicate accepts.
//!
//! ## Paths
//! - **Fast path**: the key is in the `KeyRouter`. One connection from the
//!   mapped shard, one invocation, reply returned verbatim.
//! - **Discovery**: one `RaceWorker` per shard. The dispatcher waits for
//!   every worker, not just the winner, so every connection of the round has
//!   been released before control returns. Discovery latency is therefore the
//!   slowest shard's, not the winner's.
//!
//! Blocking commands must carry their own deadline (e.g. the BLPOP timeout
//! argument); nothing here times out a shard.

use super::race::{RaceWorker, Round, WorkerExit};
use super::router::KeyRouter;
use super::shard::{ConnectionGuard, ShardRef};
use super::types::{AcceptFn, Command, Reply};
use crate::error::Error;

use std::sync::Arc;
use tokio::task::JoinSet;

pub struct Dispatcher {
    /// Fixed at construction; indices are what the router stores.
    shards: Vec<ShardRef>,
    router: Arc<KeyRouter>,
}

impl Dispatcher {
    pub fn new(shards: Vec<ShardRef>) -> Self {
        Self::with_capacity(shards, 0)
    }

    /// `key_capacity` pre-sizes the router for the expected number of keys.
    pub fn with_capacity(shards: Vec<ShardRef>, key_capacity: usize) -> Self {
        Self {
            shards,
            router: Arc::new(KeyRouter::with_capacity(key_capacity)),
        }
    }

    pub fn shards(&self) -> &[ShardRef] {
        &self.shards
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    /// Runs `cmd` on the shard owning its key.
    ///
    /// `accept` decides, during discovery, whether a shard's reply proves it
    /// owns the key. It is never consulted on the fast path.
    ///
    /// # Returns
    /// * The owning shard's reply, value or error, unchanged.
    /// * `Error::NoMappingDetermined` if no shard's reply was accepted. No
    ///   mapping is recorded in that case.
    pub async fn dispatch<F>(&self, cmd: Command, accept: F) -> Reply
    where
        F: Fn(&Reply) -> bool + Send + Sync + 'static,
    {
        self.dispatch_with(cmd, Arc::new(accept)).await
    }

    pub async fn dispatch_with(&self, cmd: Command, accept: AcceptFn) -> Reply {
        if let Some(index) = self.router.lookup(cmd.key()) {
            return self.dispatch_to(index, &cmd).await;
        }

        self.discover(cmd, accept).await
    }

    async fn dispatch_to(&self, index: usize, cmd: &Command) -> Reply {
        let shard = self
            .shards
            .get(index)
            .ok_or_else(|| Error::Acquire(format!("no shard at index {}", index)))?;

        tracing::trace!("{} '{}' -> shard {} (mapped)", cmd.name(), cmd.key(), index);

        let mut conn = ConnectionGuard::acquire(shard.as_ref()).await?;
        conn.invoke(cmd).await
    }

    async fn discover(&self, cmd: Command, accept: AcceptFn) -> Reply {
        tracing::debug!(
            "Discovering owner of '{}' across {} shards with {}",
            cmd.key(),
            self.shards.len(),
            cmd.name()
        );

        let key = cmd.key().to_string();
        let cmd = Arc::new(cmd);
        let round = Arc::new(Round::new());

        let mut workers = JoinSet::new();
        for (index, shard) in self.shards.iter().enumerate() {
            let worker = RaceWorker {
                index,
                shard: shard.clone(),
                cmd: cmd.clone(),
                accept: accept.clone(),
                round: round.clone(),
                router: self.router.clone(),
            };
            workers.spawn(worker.run());
        }

        // Wait for every worker, winner known or not.
        let mut accepted = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(WorkerExit::Won) | Ok(WorkerExit::Lost) => accepted += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Race worker for '{}' did not complete: {}", key, e);
                }
            }
        }

        match round.take_winner().await {
            Some(win) => {
                if accepted > 1 {
                    tracing::warn!(
                        "{} shards accepted '{}'; kept shard {}",
                        accepted,
                        key,
                        win.shard
                    );
                }
                win.reply
            }
            None => {
                tracing::debug!("No shard accepted '{}'", key);
                Err(Error::NoMappingDetermined { key })
            }
        }
    }
}
