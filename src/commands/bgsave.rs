use crate::error::{Error, Result};
use crate::routing::{ConnectionGuard, Dispatcher, Reply, ShardRef};

use std::time::Duration;

impl Dispatcher {
    /// Issues BGSAVE on each shard in order, pausing `interval` between shards.
    ///
    /// Each connection is released before the pause. Stops at the first
    /// failure with `Error::BgSave`, which carries how many shards had
    /// already been triggered.
    ///
    /// # Returns
    /// The number of shards a BGSAVE was issued on.
    pub async fn bgsave(&self, interval: Duration) -> Result<usize> {
        let mut triggered = 0;

        for (index, shard) in self.shards().iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(interval).await;
            }

            if let Err(e) = run_unrouted(shard, "BGSAVE").await {
                tracing::warn!("BGSAVE failed on shard {} ({}): {}", index, shard.address(), e);
                return Err(Error::BgSave {
                    triggered,
                    source: Box::new(e),
                });
            }

            triggered += 1;
            tracing::info!("BGSAVE started on shard {} ({})", index, shard.address());
        }

        Ok(triggered)
    }
}

async fn run_unrouted(shard: &ShardRef, name: &str) -> Reply {
    let mut conn = ConnectionGuard::acquire(shard.as_ref()).await?;
    conn.invoke_raw(name, &[]).await
}
