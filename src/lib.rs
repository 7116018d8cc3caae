//! Shard Unproxy Library
//!
//! Runs the commands a Twemproxy pool cannot route (blocking pops, fleet-wide
//! administration) directly against the pool's backends. Callers address data
//! by key only; which backend owns a key is discovered on first use and
//! remembered from then on.
//!
//! ## Modules
//! - **`routing`**: the dispatch engine. Shard/connection traits, the key
//!   router, discovery rounds that race a command on every shard.
//! - **`commands`**: BLPOP and staggered BGSAVE built on the engine.
//! - **`config`**: reads the nutcracker YAML the proxy itself uses.
//! - **`backend`**: RESP2-over-TCP shards with a small idle pool.
//! - **`server`**: HTTP façade over the commands.
//! - **`error`**: the crate's error type.

pub mod backend;
pub mod commands;
pub mod config;
pub mod error;
pub mod routing;
pub mod server;

pub use error::{Error, Result};
pub use routing::{Command, Dispatcher, Value};
