//! HTTP Protocol
//!
//! Endpoints and DTOs of the HTTP façade. Values are returned as UTF-8 text
//! (lossy), which is what list consumers of this service push.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_BLPOP: &str = "/blpop/:key";
pub const ENDPOINT_BGSAVE: &str = "/bgsave";
pub const ENDPOINT_STATS: &str = "/stats";

/// Seconds BLPOP waits when the caller does not say.
pub const DEFAULT_BLPOP_TIMEOUT_SECS: f64 = 10.0;

#[derive(Debug, Deserialize)]
pub struct BlpopQuery {
    /// Seconds to block on each shard.
    pub timeout: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlpopResponse {
    pub key: String,
    pub value: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BgSaveRequest {
    /// Pause between two shards, in milliseconds.
    #[serde(default)]
    pub interval_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BgSaveResponse {
    pub triggered: usize,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub shards: usize,
    pub mapped_keys: usize,
}
