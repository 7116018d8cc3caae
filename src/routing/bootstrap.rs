use super::dispatcher::Dispatcher;
use super::shard::{ConnectionGuard, ShardRef};
use crate::config::PoolConfig;
use crate::error::{Error, Result};

impl Dispatcher {
    /// Builds a dispatcher over every server of `pool`, in configuration order.
    ///
    /// `factory(address, auth)` is called once per server. With `probe` set,
    /// each shard must answer a PING before it is admitted; a shard that does
    /// not aborts construction, since a missing shard would silently break
    /// ownership routing for every key it holds.
    pub async fn connect<F>(
        pool: &PoolConfig,
        key_capacity: usize,
        factory: F,
        probe: bool,
    ) -> Result<Self>
    where
        F: Fn(&str, Option<&str>) -> Result<ShardRef>,
    {
        let addresses = pool.addresses()?;
        let mut shards = Vec::with_capacity(addresses.len());

        for (index, address) in addresses.iter().enumerate() {
            let shard = factory(address, pool.auth())?;

            if probe {
                ping(&shard).await.map_err(|e| Error::ProbeFailed {
                    shard: index,
                    address: address.clone(),
                    source: Box::new(e),
                })?;
                tracing::info!("Shard {} ({}) is alive", index, address);
            }

            shards.push(shard);
        }

        tracing::info!("Dispatcher ready with {} shards", shards.len());
        Ok(Self::with_capacity(shards, key_capacity))
    }
}

async fn ping(shard: &ShardRef) -> Result<()> {
    let mut conn = ConnectionGuard::acquire(shard.as_ref()).await?;
    conn.invoke_raw("PING", &[]).await?;
    Ok(())
}
