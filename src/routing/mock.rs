//! In-process shards for exercising the engine without a backend.

use super::shard::{Connection, Shard, ShardRef};
use super::types::{Reply, Value};
use crate::error::Error;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Arc<dyn Fn(&str, &[Value]) -> Reply + Send + Sync>;

/// Per-shard accounting of what the engine did with it.
#[derive(Default)]
pub(crate) struct MockStats {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub invoked: AtomicUsize,
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn invoked(&self) -> usize {
        self.invoked.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

pub(crate) struct MockShard {
    respond: Responder,
    delay: Duration,
    acquire_delay: Duration,
    unreachable: bool,
    stats: Arc<MockStats>,
}

impl MockShard {
    pub fn responding<F>(respond: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Reply + Send + Sync + 'static,
    {
        Self {
            respond: Arc::new(respond),
            delay: Duration::ZERO,
            acquire_delay: Duration::ZERO,
            unreachable: false,
            stats: Arc::new(MockStats::default()),
        }
    }

    pub fn replying(value: Value) -> Self {
        Self::responding(move |_, _| Ok(value.clone()))
    }

    pub fn nil() -> Self {
        Self::replying(Value::Nil)
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::responding(move |_, _| Err(Error::Invocation(message.clone())))
    }

    pub fn unreachable() -> Self {
        let mut shard = Self::nil();
        shard.unreachable = true;
        shard
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes `acquire` itself slow, as with a pool waiting on a connection.
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl Shard for MockShard {
    async fn acquire(&self) -> crate::error::Result<Box<dyn Connection>> {
        if !self.acquire_delay.is_zero() {
            tokio::time::sleep(self.acquire_delay).await;
        }
        if self.unreachable {
            return Err(Error::Acquire("connection refused".to_string()));
        }

        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            respond: self.respond.clone(),
            delay: self.delay,
            stats: self.stats.clone(),
            released: false,
        }))
    }

    fn address(&self) -> &str {
        "mock"
    }
}

struct MockConnection {
    respond: Responder,
    delay: Duration,
    stats: Arc<MockStats>,
    released: bool,
}

#[async_trait]
impl Connection for MockConnection {
    async fn invoke(&mut self, name: &str, args: &[Value]) -> Reply {
        self.stats.invoked.fetch_add(1, Ordering::SeqCst);
        self.stats
            .calls
            .lock()
            .unwrap()
            .push((name.to_string(), args.to_vec()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        (self.respond)(name, args)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stats.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Splits mocks into the shard list a dispatcher wants and their stats.
pub(crate) fn into_shards(mocks: Vec<MockShard>) -> (Vec<ShardRef>, Vec<Arc<MockStats>>) {
    let stats = mocks.iter().map(|m| m.stats()).collect();
    let shards = mocks
        .into_iter()
        .map(|m| Arc::new(m) as ShardRef)
        .collect();
    (shards, stats)
}
