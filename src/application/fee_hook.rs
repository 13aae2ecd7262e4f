//! Swap hook: wires fee queries, price-indicator updates and liquidity
//! withdrawals into the dynamic fee engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use crate::domain::fee::DynamicFeeEngine;
use crate::domain::history::{
    FeeHistory, InMemoryFeeHistory, InMemoryIndicatorHistory, IndicatorHistory, RetentionPolicy,
};
use crate::domain::liquidity::{Deposit, YieldIntegration, YieldRouter};
use crate::domain::pool::PoolManager;
use crate::shared::config::FeeConfig;
use crate::shared::errors::{AppError, HookError, PoolError};
use crate::shared::types::{Epoch, FeePips, FeeTier, LiquidityDelta, Pool, PoolId, Side, Tick};

/// Hook counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookStats {
    pub fee_queries: u64,
    pub indicators_recorded: u64,
    pub entries_pruned: u64,
    pub deposits_forwarded: u64,
}

/// Per-pool sequencer holding the last epoch seen. Its lock is held for the
/// whole of a fee query or indicator write on that pool.
type Lane = Arc<Mutex<Option<Epoch>>>;

/// Entry point for the pool's swap lifecycle.
///
/// Operations on one pool run one at a time and anything older than the last
/// epoch seen is rejected, so a fee query always reads the committed
/// indicators of E-1 and E-2. Different pools proceed independently.
pub struct DynamicFeeHook {
    pools: PoolManager,
    engine: DynamicFeeEngine,
    indicators: Arc<dyn IndicatorHistory>,
    fees: Arc<dyn FeeHistory>,
    router: YieldRouter,
    retention: RetentionPolicy,
    lanes: RwLock<HashMap<PoolId, Lane>>,
    stats: RwLock<HookStats>,
}

impl DynamicFeeHook {
    pub fn new(retention: RetentionPolicy, integration: YieldIntegration) -> Self {
        Self::with_stores(
            Arc::new(InMemoryIndicatorHistory::new()),
            Arc::new(InMemoryFeeHistory::new()),
            retention,
            integration,
        )
    }

    pub fn with_stores(
        indicators: Arc<dyn IndicatorHistory>,
        fees: Arc<dyn FeeHistory>,
        retention: RetentionPolicy,
        integration: YieldIntegration,
    ) -> Self {
        Self {
            pools: PoolManager::new(),
            engine: DynamicFeeEngine::new(Arc::clone(&indicators), Arc::clone(&fees)),
            indicators,
            fees,
            router: YieldRouter::new(integration),
            retention,
            lanes: RwLock::new(HashMap::new()),
            stats: RwLock::new(HookStats::default()),
        }
    }

    /// Build a hook and register every configured pool
    pub async fn from_config(config: &FeeConfig) -> Result<Self, AppError> {
        let hook = Self::new(config.retention, config.integration);
        for (id, fee_tier) in &config.pools {
            hook.register_pool(id.clone(), *fee_tier).await?;
        }
        info!(
            pools = config.pools.len(),
            integration = config.integration.as_str(),
            retention = ?config.retention.keep_epochs(),
            "dynamic fee hook ready"
        );
        Ok(hook)
    }

    pub async fn register_pool(&self, id: PoolId, fee_tier: FeeTier) -> Result<Pool, PoolError> {
        let pool = self.pools.register(id, fee_tier).await?;
        self.lanes.write().await.insert(pool.id.clone(), Lane::default());
        Ok(pool)
    }

    /// Fee to charge a trade on `side` before it is priced
    pub async fn before_swap(&self, pool: &PoolId, epoch: Epoch, side: Side) -> Result<FeePips, HookError> {
        let (pool, lane) = self.pool_lane(pool).await?;
        let mut last_seen = lane.lock().await;
        observe_epoch(&mut last_seen, &pool.id, epoch)?;

        let fee = self.engine.get_fee(&pool, epoch, side).await;
        drop(last_seen);

        self.stats.write().await.fee_queries += 1;
        debug!(pool = %pool.id, epoch, %side, fee, "fee quoted");
        Ok(fee)
    }

    /// Record the price indicator reached after a trade settled
    pub async fn after_swap(&self, pool: &PoolId, epoch: Epoch, tick: Tick) -> Result<(), HookError> {
        let (pool, lane) = self.pool_lane(pool).await?;
        let mut last_seen = lane.lock().await;
        observe_epoch(&mut last_seen, &pool.id, epoch)?;

        self.indicators.record_indicator(&pool.id, epoch, tick).await;
        let pruned = self.prune(&pool.id, epoch).await;
        drop(last_seen);

        let mut stats = self.stats.write().await;
        stats.indicators_recorded += 1;
        stats.entries_pruned += pruned as u64;
        Ok(())
    }

    /// Forward liquidity withdrawn from `pool` to the configured integration
    pub async fn after_remove_liquidity(
        &self,
        pool: &PoolId,
        amounts: LiquidityDelta,
    ) -> Result<Option<Deposit>, HookError> {
        let pool = self.pool(pool).await?;
        let deposit = self.router.route(&pool.id, amounts).await;
        if deposit.is_some() {
            self.stats.write().await.deposits_forwarded += 1;
        }
        Ok(deposit)
    }

    pub async fn get_indicator(&self, pool: &PoolId, epoch: Epoch) -> Option<Tick> {
        self.engine.get_indicator(pool, epoch).await
    }

    pub async fn get_buy_fee(&self, pool: &PoolId, epoch: Epoch) -> Option<FeePips> {
        self.engine.get_buy_fee(pool, epoch).await
    }

    pub async fn get_sell_fee(&self, pool: &PoolId, epoch: Epoch) -> Option<FeePips> {
        self.engine.get_sell_fee(pool, epoch).await
    }

    pub async fn pools(&self) -> Vec<Pool> {
        self.pools.pools().await
    }

    pub fn integration(&self) -> YieldIntegration {
        self.router.integration()
    }

    pub async fn deposits(&self) -> Vec<Deposit> {
        self.router.deposits().await
    }

    pub async fn stats(&self) -> HookStats {
        self.stats.read().await.clone()
    }

    async fn pool(&self, id: &PoolId) -> Result<Pool, HookError> {
        self.pools
            .get(id)
            .await
            .ok_or_else(|| HookError::UnknownPool(id.clone()))
    }

    async fn pool_lane(&self, id: &PoolId) -> Result<(Pool, Lane), HookError> {
        let pool = self.pool(id).await?;
        let lane = self
            .lanes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| HookError::UnknownPool(id.clone()))?;
        Ok((pool, lane))
    }

    async fn prune(&self, pool: &PoolId, epoch: Epoch) -> usize {
        let Some(floor) = self.retention.prune_floor(epoch) else {
            return 0;
        };
        let removed = self.indicators.prune_before(pool, floor).await
            + self.fees.prune_before(pool, floor).await;
        if removed > 0 {
            debug!(%pool, floor, removed, "pruned history");
        }
        removed
    }
}

fn observe_epoch(last_seen: &mut Option<Epoch>, pool: &PoolId, epoch: Epoch) -> Result<(), HookError> {
    if let Some(last_seen) = *last_seen {
        if epoch < last_seen {
            warn!(%pool, epoch, last_seen, "rejected out-of-order epoch");
            return Err(HookError::StaleEpoch { pool: pool.clone(), epoch, last_seen });
        }
    }
    *last_seen = Some(epoch);
    Ok(())
}
