//! Error types shared by the routing engine, the backend and the command helpers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A shard could not hand out a connection (pool exhausted, dial failed, ...).
    #[error("Failed to acquire connection: {0}")]
    Acquire(String),

    /// The backend answered the command with an error reply.
    #[error("Backend error reply: {0}")]
    Invocation(String),

    /// A full discovery round finished without any shard's reply being accepted.
    #[error("No results returned that could determine a key mapping for '{key}'")]
    NoMappingDetermined { key: String },

    #[error("BLPOP on '{key}' timed out")]
    Timeout { key: String },

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pool '{0}' not found in configuration")]
    PoolNotFound(String),

    #[error("Liveness probe failed for shard {shard} ({address}): {source}")]
    ProbeFailed {
        shard: usize,
        address: String,
        #[source]
        source: Box<Error>,
    },

    #[error("BGSAVE stopped after {triggered} shard(s): {source}")]
    BgSave {
        triggered: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
