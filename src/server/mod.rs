//! HTTP Façade
//!
//! Exposes the unproxied commands over HTTP for clients that only speak to
//! the Twemproxy pool otherwise.
//!
//! - `GET /blpop/:key?timeout=<secs>`: pop one element (408 on timeout).
//! - `POST /bgsave` `{ "interval_ms": n }`: staggered background save.
//! - `GET /stats`: shard count and number of keys routed so far.

pub mod handlers;
pub mod protocol;

use crate::routing::Dispatcher;
use handlers::{handle_bgsave, handle_blpop, handle_stats};
use protocol::{ENDPOINT_BGSAVE, ENDPOINT_BLPOP, ENDPOINT_STATS};

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(ENDPOINT_BLPOP, get(handle_blpop))
        .route(ENDPOINT_BGSAVE, post(handle_bgsave))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(dispatcher))
}

#[cfg(test)]
mod tests;
