//! Key Routing Engine
//!
//! Routes commands to the shard that owns their key when nothing in front of
//! the store (e.g. a Twemproxy pool) can do it for us.
//!
//! ## Core Concepts
//! - **Shard**: one backend instance behind the `Shard`/`Connection` traits.
//!   The shard set is fixed at construction.
//! - **KeyRouter**: memoized `key -> shard index`, written once per key.
//! - **Discovery round**: the first command on an unknown key is raced on every
//!   shard; the first reply the caller's predicate accepts fixes the owner.
//! - **Dispatcher**: the single entry point, choosing between the mapped shard
//!   and a discovery round.

pub mod bootstrap;
pub mod dispatcher;
pub mod race;
pub mod router;
pub mod shard;
pub mod types;

pub use dispatcher::Dispatcher;
pub use router::KeyRouter;
pub use shard::{Connection, ConnectionGuard, Shard, ShardRef};
pub use types::{AcceptFn, Command, Reply, Value, accept_array, accept_present};

#[cfg(test)]
pub(crate) mod mock;
