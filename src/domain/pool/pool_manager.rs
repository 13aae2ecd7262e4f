//! Pool manager: setup validation and lookup of dynamic-fee pools

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, warn};
use crate::shared::errors::PoolError;
use crate::shared::types::{FeeTier, Pool, PoolId, MAX_FEE_PIPS};

/// Registry of pools allowed to use the dynamic fee engine
#[derive(Debug, Default)]
pub struct PoolManager {
    pools: RwLock<HashMap<PoolId, Pool>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a pool. Only variable-fee tiers are accepted.
    pub async fn register(&self, id: PoolId, fee_tier: FeeTier) -> Result<Pool, PoolError> {
        validate_fee_tier(&id, fee_tier)?;

        let mut pools = self.pools.write().await;
        if pools.contains_key(&id) {
            warn!(pool = %id, "rejected duplicate pool registration");
            return Err(PoolError::AlreadyRegistered(id));
        }

        let pool = Pool { id: id.clone(), fee_tier };
        pools.insert(id, pool.clone());
        info!(pool = %pool.id, base_fee = pool.base_fee(), "registered dynamic fee pool");
        Ok(pool)
    }

    pub async fn get(&self, id: &PoolId) -> Option<Pool> {
        self.pools.read().await.get(id).cloned()
    }

    /// All registered pools, ordered by id
    pub async fn pools(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = self.pools.read().await.values().cloned().collect();
        pools.sort_by(|a, b| a.id.cmp(&b.id));
        pools
    }
}

fn validate_fee_tier(id: &PoolId, fee_tier: FeeTier) -> Result<(), PoolError> {
    if !fee_tier.is_dynamic() {
        warn!(pool = %id, raw_fee = fee_tier.raw(), "rejected static fee pool");
        return Err(PoolError::StaticFee(id.clone()));
    }
    if fee_tier.base_fee() > MAX_FEE_PIPS {
        return Err(PoolError::FeeTooLarge {
            pool: id.clone(),
            fee: fee_tier.base_fee(),
            max: MAX_FEE_PIPS,
        });
    }
    Ok(())
}
