use super::protocol::*;
use crate::error::Error;
use crate::routing::Dispatcher;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Duration;

pub async fn handle_blpop(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Path(key): Path<String>,
    Query(query): Query<BlpopQuery>,
) -> (StatusCode, Json<BlpopResponse>) {
    let secs = query.timeout.unwrap_or(DEFAULT_BLPOP_TIMEOUT_SECS);
    // A zero timeout blocks forever on every shard without the list.
    let timeout = match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        Ok(_) => return invalid_timeout(key, "must be greater than zero".to_string()),
        Err(e) => return invalid_timeout(key, e.to_string()),
    };

    match dispatcher.blpop(&key, timeout).await {
        Ok(value) => (
            StatusCode::OK,
            Json(BlpopResponse {
                key,
                value: Some(String::from_utf8_lossy(&value).into_owned()),
                error: None,
            }),
        ),
        Err(e) => {
            let status = match e {
                Error::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
                _ => {
                    tracing::error!("BLPOP on '{}' failed: {}", key, e);
                    StatusCode::BAD_GATEWAY
                }
            };
            (
                status,
                Json(BlpopResponse {
                    key,
                    value: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

fn invalid_timeout(key: String, reason: String) -> (StatusCode, Json<BlpopResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(BlpopResponse {
            key,
            value: None,
            error: Some(format!("invalid timeout: {}", reason)),
        }),
    )
}

pub async fn handle_bgsave(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Json(req): Json<BgSaveRequest>,
) -> (StatusCode, Json<BgSaveResponse>) {
    match dispatcher.bgsave(Duration::from_millis(req.interval_ms)).await {
        Ok(triggered) => (
            StatusCode::OK,
            Json(BgSaveResponse {
                triggered,
                error: None,
            }),
        ),
        Err(Error::BgSave { triggered, source }) => {
            tracing::error!("BGSAVE stopped after {} shard(s): {}", triggered, source);
            (
                StatusCode::BAD_GATEWAY,
                Json(BgSaveResponse {
                    triggered,
                    error: Some(source.to_string()),
                }),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BgSaveResponse {
                triggered: 0,
                error: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn handle_stats(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
) -> (StatusCode, Json<StatsResponse>) {
    (
        StatusCode::OK,
        Json(StatsResponse {
            shards: dispatcher.shard_count(),
            mapped_keys: dispatcher.router().len(),
        }),
    )
}
