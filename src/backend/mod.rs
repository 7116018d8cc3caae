//! Backend Connection Layer
//!
//! A concrete implementation of the routing engine's `Shard`/`Connection`
//! traits speaking RESP2 over TCP. The engine itself does not depend on it;
//! any other client can be wrapped the same way.

pub mod resp;
pub mod tcp;

pub use tcp::TcpShard;

use crate::config::BackendOptions;
use crate::error::Result;
use crate::routing::ShardRef;

use std::sync::Arc;

/// Shard factory for `Dispatcher::connect` building `TcpShard`s.
pub fn tcp_factory(options: BackendOptions) -> impl Fn(&str, Option<&str>) -> Result<ShardRef> {
    move |address, auth| Ok(Arc::new(TcpShard::new(address, auth, options.clone())) as ShardRef)
}
