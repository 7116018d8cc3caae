//! Configuration Module
//!
//! Reads the Twemproxy (nutcracker) YAML file the proxy itself runs from, so
//! the same file describes both the proxied path and the direct shard path.
//!
//! ## Contents
//! - **`ProxyConfig`**: all pools in the file, looked up by name.
//! - **`PoolConfig`**: servers and AUTH password of one pool.
//! - **`BackendOptions`**: idle-pool settings for the bundled TCP backend.

pub mod types;

pub use types::{BackendOptions, PoolConfig, ProxyConfig};
