//! Price-indicator history: one tick per (pool, epoch), last write wins

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::trace;
use crate::shared::types::{Epoch, PoolId, Tick};

/// Store of the latest price indicator written for each (pool, epoch)
#[async_trait]
pub trait IndicatorHistory: Send + Sync {
    /// Overwrite the indicator at (pool, epoch)
    async fn record_indicator(&self, pool: &PoolId, epoch: Epoch, tick: Tick);

    async fn read_indicator(&self, pool: &PoolId, epoch: Epoch) -> Option<Tick>;

    /// Drop every entry of `pool` older than `epoch`, returning how many were removed
    async fn prune_before(&self, pool: &PoolId, epoch: Epoch) -> usize;

    /// Number of epochs currently held for `pool`
    async fn len(&self, pool: &PoolId) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemoryIndicatorHistory {
    entries: RwLock<HashMap<PoolId, BTreeMap<Epoch, Tick>>>,
}

impl InMemoryIndicatorHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndicatorHistory for InMemoryIndicatorHistory {
    async fn record_indicator(&self, pool: &PoolId, epoch: Epoch, tick: Tick) {
        let mut entries = self.entries.write().await;
        let previous = entries.entry(pool.clone()).or_default().insert(epoch, tick);
        trace!(%pool, epoch, tick, ?previous, "recorded indicator");
    }

    async fn read_indicator(&self, pool: &PoolId, epoch: Epoch) -> Option<Tick> {
        let entries = self.entries.read().await;
        entries.get(pool).and_then(|ticks| ticks.get(&epoch).copied())
    }

    async fn prune_before(&self, pool: &PoolId, epoch: Epoch) -> usize {
        let mut entries = self.entries.write().await;
        match entries.get_mut(pool) {
            Some(ticks) => {
                let kept = ticks.split_off(&epoch);
                let removed = ticks.len();
                *ticks = kept;
                removed
            }
            None => 0,
        }
    }

    async fn len(&self, pool: &PoolId) -> usize {
        let entries = self.entries.read().await;
        entries.get(pool).map_or(0, BTreeMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_write_in_epoch_wins() {
        let history = InMemoryIndicatorHistory::new();
        let pool = PoolId::new("ETH-USDC");

        history.record_indicator(&pool, 100, 10).await;
        history.record_indicator(&pool, 100, -4).await;

        assert_eq!(history.read_indicator(&pool, 100).await, Some(-4));
        assert_eq!(history.len(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_absent_entries() {
        let history = InMemoryIndicatorHistory::new();
        let pool = PoolId::new("ETH-USDC");

        assert_eq!(history.read_indicator(&pool, 1).await, None);
        history.record_indicator(&pool, 2, 0).await;
        assert_eq!(history.read_indicator(&pool, 2).await, Some(0));
        assert_eq!(history.read_indicator(&PoolId::new("other"), 2).await, None);
    }

    #[tokio::test]
    async fn test_prune_before() {
        let history = InMemoryIndicatorHistory::new();
        let pool = PoolId::new("ETH-USDC");
        for epoch in 1..=5 {
            history.record_indicator(&pool, epoch, epoch as Tick).await;
        }

        assert_eq!(history.prune_before(&pool, 4).await, 3);
        assert_eq!(history.len(&pool).await, 2);
        assert_eq!(history.read_indicator(&pool, 3).await, None);
        assert_eq!(history.read_indicator(&pool, 4).await, Some(4));
        assert_eq!(history.prune_before(&PoolId::new("missing"), 4).await, 0);
    }
}
