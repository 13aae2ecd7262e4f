//! Fee history: write-once buy/sell fees per (pool, epoch)

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::trace;
use crate::shared::types::{Epoch, FeePips, FeeRecord, PoolId, Side};

/// Memoization store for computed fees.
///
/// Each (pool, epoch, side) slot is written at most once. `try_store` is a
/// compare-and-set: concurrent writers race, one wins, and every caller gets
/// the winning value back.
#[async_trait]
pub trait FeeHistory: Send + Sync {
    /// Store `fee` unless the slot is already taken; returns the value that ends up stored
    async fn try_store(&self, pool: &PoolId, epoch: Epoch, side: Side, fee: FeePips) -> FeePips;

    async fn read(&self, pool: &PoolId, epoch: Epoch, side: Side) -> Option<FeePips>;

    async fn read_record(&self, pool: &PoolId, epoch: Epoch) -> FeeRecord;

    /// Drop every record of `pool` older than `epoch`, returning how many were removed
    async fn prune_before(&self, pool: &PoolId, epoch: Epoch) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemoryFeeHistory {
    records: RwLock<HashMap<PoolId, BTreeMap<Epoch, FeeRecord>>>,
}

impl InMemoryFeeHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeeHistory for InMemoryFeeHistory {
    async fn try_store(&self, pool: &PoolId, epoch: Epoch, side: Side, fee: FeePips) -> FeePips {
        let mut records = self.records.write().await;
        let slot = records
            .entry(pool.clone())
            .or_default()
            .entry(epoch)
            .or_default()
            .slot_mut(side);

        match *slot {
            Some(existing) => existing,
            None => {
                *slot = Some(fee);
                trace!(%pool, epoch, %side, fee, "stored fee");
                fee
            }
        }
    }

    async fn read(&self, pool: &PoolId, epoch: Epoch, side: Side) -> Option<FeePips> {
        self.read_record(pool, epoch).await.get(side)
    }

    async fn read_record(&self, pool: &PoolId, epoch: Epoch) -> FeeRecord {
        let records = self.records.read().await;
        records
            .get(pool)
            .and_then(|by_epoch| by_epoch.get(&epoch).copied())
            .unwrap_or_default()
    }

    async fn prune_before(&self, pool: &PoolId, epoch: Epoch) -> usize {
        let mut records = self.records.write().await;
        match records.get_mut(pool) {
            Some(by_epoch) => {
                let kept = by_epoch.split_off(&epoch);
                let removed = by_epoch.len();
                *by_epoch = kept;
                removed
            }
            None => 0,
        }
    }
}
