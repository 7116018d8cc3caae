//! Race Worker
//!
//! One worker runs per shard per discovery round. Workers of a round share a
//! [`Round`], which keeps three concerns apart:
//!
//! - **Claim**: an atomic flag; the first accepting worker to flip it owns the
//!   result slot. Later accepting workers (an over-permissive predicate) lose
//!   the claim and drop their reply.
//! - **Cancellation**: a broadcast token fired by the winner. Workers look at
//!   it before issuing their command and again after it returns, never during.
//! - **Completion**: not tracked here. The dispatcher joins every worker task,
//!   so a worker completes exactly once whatever path it leaves by.

use super::router::KeyRouter;
use super::shard::{ConnectionGuard, ShardRef};
use super::types::{AcceptFn, Command, Reply};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// The reply adopted for a round and the shard it came from.
#[derive(Debug)]
pub struct Win {
    pub shard: usize,
    pub reply: Reply,
}

/// State shared by all workers of one discovery round.
#[derive(Debug, Default)]
pub struct Round {
    claimed: AtomicBool,
    winner: Mutex<Option<Win>>,
    cancel: CancellationToken,
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-claim-wins. Returns `true` only for the single worker whose
    /// reply becomes the round's result.
    pub async fn claim(&self, shard: usize, reply: Reply) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        *self.winner.lock().await = Some(Win { shard, reply });
        true
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn take_winner(&self) -> Option<Win> {
        self.winner.lock().await.take()
    }
}

/// How a worker left the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Accepted and claimed the result slot; the key now routes here.
    Won,
    /// Accepted, but another shard had already claimed the slot.
    Lost,
    /// The predicate rejected this shard's reply.
    Rejected,
    /// Saw the round cancelled before issuing or after completing its command.
    Cancelled,
}

/// One shard's participation in one discovery round.
pub struct RaceWorker {
    pub index: usize,
    pub shard: ShardRef,
    pub cmd: Arc<Command>,
    pub accept: AcceptFn,
    pub round: Arc<Round>,
    pub router: Arc<KeyRouter>,
}

impl RaceWorker {
    pub async fn run(self) -> WorkerExit {
        let reply = match ConnectionGuard::acquire(self.shard.as_ref()).await {
            Ok(mut conn) => {
                if self.round.is_cancelled() {
                    tracing::trace!("Shard {} cancelled before issuing {}", self.index, self.cmd.name());
                    return WorkerExit::Cancelled;
                }

                let reply = conn.invoke(&self.cmd).await;
                conn.release();
                reply
            }
            Err(e) => {
                tracing::warn!(
                    "Shard {} ({}) unavailable during discovery: {}",
                    self.index,
                    self.shard.address(),
                    e
                );
                Err(e)
            }
        };

        if self.round.is_cancelled() {
            tracing::trace!("Shard {} finished after round was decided", self.index);
            return WorkerExit::Cancelled;
        }

        if !(self.accept)(&reply) {
            if let Err(e) = &reply {
                tracing::warn!("Shard {} rejected with error: {}", self.index, e);
            }
            return WorkerExit::Rejected;
        }

        if !self.round.claim(self.index, reply).await {
            tracing::warn!(
                "Shard {} also accepted key '{}' after another shard won; predicate accepts too much",
                self.index,
                self.cmd.key()
            );
            return WorkerExit::Lost;
        }

        self.router.record(self.cmd.key(), self.index);
        self.round.cancel();

        tracing::debug!("Key '{}' mapped to shard {}", self.cmd.key(), self.index);
        WorkerExit::Won
    }
}
