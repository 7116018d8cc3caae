//! Server Module Tests
//!
//! Calls the handlers directly with extracted arguments; no socket involved.

#[cfg(test)]
mod tests {
    use crate::routing::mock::{MockShard, into_shards};
    use crate::routing::{Dispatcher, Value};
    use crate::server::handlers::{handle_bgsave, handle_blpop, handle_stats};
    use crate::server::protocol::{BgSaveRequest, BlpopQuery};
    use axum::Json;
    use axum::extract::{Extension, Path, Query};
    use axum::http::StatusCode;
    use std::sync::Arc;

    fn dispatcher(mocks: Vec<MockShard>) -> Arc<Dispatcher> {
        let (shards, _stats) = into_shards(mocks);
        Arc::new(Dispatcher::new(shards))
    }

    #[tokio::test]
    async fn test_blpop_returns_value() {
        let d = dispatcher(vec![
            MockShard::nil(),
            MockShard::replying(Value::Array(vec![Value::from("jobs"), Value::from("job-1")])),
        ]);

        let (status, Json(body)) = handle_blpop(
            Extension(d.clone()),
            Path("jobs".to_string()),
            Query(BlpopQuery { timeout: Some(1.0) }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.value.as_deref(), Some("job-1"));
        assert_eq!(d.router().lookup("jobs"), Some(1));
    }

    #[tokio::test]
    async fn test_blpop_timeout_maps_to_408() {
        let d = dispatcher(vec![MockShard::nil()]);

        let (status, Json(body)) = handle_blpop(
            Extension(d),
            Path("jobs".to_string()),
            Query(BlpopQuery { timeout: Some(0.1) }),
        )
        .await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert!(body.value.is_none());
        assert!(body.error.is_some());
    }

    #[tokio::test]
    async fn test_blpop_rejects_negative_timeout() {
        let d = dispatcher(vec![MockShard::nil()]);

        let (status, _) = handle_blpop(
            Extension(d),
            Path("jobs".to_string()),
            Query(BlpopQuery { timeout: Some(-1.0) }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blpop_rejects_zero_timeout() {
        let (shards, stats) = into_shards(vec![MockShard::nil(), MockShard::nil()]);
        let d = Arc::new(Dispatcher::new(shards));

        let (status, Json(body)) = handle_blpop(
            Extension(d),
            Path("jobs".to_string()),
            Query(BlpopQuery { timeout: Some(0.0) }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.is_some());
        for s in &stats {
            assert_eq!(s.acquired(), 0, "No shard is asked to block forever");
        }
    }

    #[tokio::test]
    async fn test_bgsave_reports_partial_progress() {
        let d = dispatcher(vec![
            MockShard::replying(Value::Status("OK".to_string())),
            MockShard::failing("ERR busy"),
        ]);

        let (status, Json(body)) =
            handle_bgsave(Extension(d), Json(BgSaveRequest { interval_ms: 0 })).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.triggered, 1);
    }

    #[tokio::test]
    async fn test_stats_counts_mapped_keys() {
        let d = dispatcher(vec![MockShard::nil(), MockShard::nil()]);
        d.router().record("a", 0);
        d.router().record("b", 1);

        let (status, Json(body)) = handle_stats(Extension(d)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.shards, 2);
        assert_eq!(body.mapped_keys, 2);
    }

    #[tokio::test]
    async fn test_stats_json_shape() {
        let d = dispatcher(vec![MockShard::nil()]);

        let (_, Json(body)) = handle_stats(Extension(d)).await;
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json, serde_json::json!({"shards": 1, "mapped_keys": 0}));
    }
}
