//! Commands Module Tests
//!
//! BLPOP and BGSAVE against mock shards.
//!
//! ## Test Scopes
//! - **BLPOP**: discovery on unknown keys, fast path on known ones, timeouts.
//! - **BGSAVE**: sequential fan-out, partial failure accounting, pacing.

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::routing::mock::{MockShard, into_shards};
    use crate::routing::{Dispatcher, Value};
    use std::time::{Duration, Instant};

    const KEY: &str = "parsed:soccer:league:event:match";
    const RESPONSE: &str = "A correct response";

    fn popped() -> Value {
        Value::Array(vec![Value::from(KEY), Value::from(RESPONSE)])
    }

    // ============================================================
    // BLPOP
    // ============================================================

    #[tokio::test]
    async fn test_blpop_single_shard_unknown_key() {
        let (shards, stats) = into_shards(vec![MockShard::replying(popped())]);
        let dispatcher = Dispatcher::new(shards);

        let value = dispatcher.blpop(KEY, Duration::from_secs(5)).await.unwrap();

        assert_eq!(value, RESPONSE.as_bytes());
        assert_eq!(dispatcher.router().lookup(KEY), Some(0));
        assert_eq!(
            stats[0].calls(),
            vec![(
                "BLPOP".to_string(),
                vec![Value::from(KEY), Value::from("5")]
            )]
        );
    }

    #[tokio::test]
    async fn test_blpop_multiple_shards_unknown_key_adds_mapping() {
        // ARRANGE: shard 0 times out (nil), shard 1 holds the list
        let (shards, stats) = into_shards(vec![MockShard::nil(), MockShard::replying(popped())]);
        let dispatcher = Dispatcher::new(shards);

        // ACT
        let value = dispatcher.blpop(KEY, Duration::from_secs(5)).await.unwrap();

        // ASSERT
        assert_eq!(value, RESPONSE.as_bytes());
        assert_eq!(dispatcher.router().lookup(KEY), Some(1));
        assert_eq!(stats[0].released(), stats[0].acquired());
        assert_eq!(stats[1].released(), 1);
    }

    #[tokio::test]
    async fn test_blpop_known_key_goes_straight_to_owner() {
        let (shards, stats) = into_shards(vec![MockShard::replying(popped()), MockShard::nil()]);
        let dispatcher = Dispatcher::new(shards);
        dispatcher.router().record(KEY, 0);

        let value = dispatcher.blpop(KEY, Duration::from_secs(5)).await.unwrap();

        assert_eq!(value, RESPONSE.as_bytes());
        assert_eq!(stats[0].invoked(), 1);
        assert_eq!(stats[1].acquired(), 0, "Unmapped shard must not be touched");
    }

    #[tokio::test]
    async fn test_blpop_times_out_when_no_shard_has_data() {
        let (shards, _stats) = into_shards(vec![MockShard::nil(), MockShard::nil()]);
        let dispatcher = Dispatcher::new(shards);

        let result = dispatcher.blpop(KEY, Duration::from_secs(1)).await;

        match result {
            Err(Error::Timeout { key }) => assert_eq!(key, KEY),
            other => panic!("Expected timeout, got {:?}", other),
        }
        assert!(dispatcher.router().lookup(KEY).is_none());
    }

    #[tokio::test]
    async fn test_blpop_times_out_on_mapped_key() {
        let (shards, _stats) = into_shards(vec![MockShard::nil()]);
        let dispatcher = Dispatcher::new(shards);
        dispatcher.router().record(KEY, 0);

        let result = dispatcher.blpop(KEY, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_blpop_backend_error_passes_through() {
        let (shards, _stats) = into_shards(vec![MockShard::failing("WRONGTYPE")]);
        let dispatcher = Dispatcher::new(shards);
        dispatcher.router().record(KEY, 0);

        let result = dispatcher.blpop(KEY, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(Error::Invocation(_))));
    }

    #[tokio::test]
    async fn test_blpop_malformed_array_is_unexpected_reply() {
        let (shards, _stats) = into_shards(vec![MockShard::replying(Value::Array(vec![
            Value::from(KEY),
        ]))]);
        let dispatcher = Dispatcher::new(shards);

        let result = dispatcher.blpop(KEY, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(Error::UnexpectedReply(_))));
    }

    // ============================================================
    // BGSAVE
    // ============================================================

    #[tokio::test]
    async fn test_bgsave_runs_on_each_shard() {
        let ok = || MockShard::replying(Value::Status("Background saving started".to_string()));
        let (shards, stats) = into_shards(vec![ok(), ok()]);
        let dispatcher = Dispatcher::new(shards);

        let n = dispatcher.bgsave(Duration::from_millis(1)).await.unwrap();

        assert_eq!(n, 2);
        for s in &stats {
            assert_eq!(s.calls(), vec![("BGSAVE".to_string(), vec![])]);
            assert_eq!(s.released(), 1);
        }
    }

    #[tokio::test]
    async fn test_bgsave_reports_progress_on_failure() {
        let (shards, stats) = into_shards(vec![
            MockShard::replying(Value::Status("OK".to_string())),
            MockShard::failing("ERR Background save already in progress"),
            MockShard::replying(Value::Status("OK".to_string())),
        ]);
        let dispatcher = Dispatcher::new(shards);

        let result = dispatcher.bgsave(Duration::from_millis(1)).await;

        match result {
            Err(Error::BgSave { triggered, source }) => {
                assert_eq!(triggered, 1);
                assert!(matches!(*source, Error::Invocation(_)));
            }
            other => panic!("Expected BgSave error, got {:?}", other),
        }
        assert_eq!(stats[1].released(), 1);
        assert_eq!(stats[2].acquired(), 0, "Stops at the first failure");
    }

    #[tokio::test]
    async fn test_bgsave_paces_between_shards() {
        let ok = || MockShard::replying(Value::Status("OK".to_string()));
        let (shards, _stats) = into_shards(vec![ok(), ok(), ok()]);
        let dispatcher = Dispatcher::new(shards);

        let started = Instant::now();
        dispatcher.bgsave(Duration::from_millis(50)).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_bgsave_ignores_key_routing() {
        let (shards, stats) = into_shards(vec![
            MockShard::replying(Value::Status("OK".to_string())),
            MockShard::replying(Value::Status("OK".to_string())),
        ]);
        let dispatcher = Dispatcher::new(shards);
        dispatcher.router().record("anything", 1);

        dispatcher.bgsave(Duration::ZERO).await.unwrap();

        assert_eq!(stats[0].invoked(), 1);
        assert_eq!(stats[1].invoked(), 1);
    }
}
