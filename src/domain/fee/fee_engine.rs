//! Dynamic fee engine

use std::sync::Arc;
use tracing::debug;
use crate::domain::history::{FeeHistory, IndicatorHistory};
use crate::shared::types::{Epoch, FeePips, Pool, PoolId, Side, Tick};
use super::trend::{fee_step, next_fee, Trend};

/// Derives asymmetric buy/sell fees from the last two epochs of price movement.
///
/// The fee for epoch E depends only on the fee record of E-1 and the
/// indicators of E-1 and E-2, never on E's own indicator. Every computed
/// side is stored once and returned unchanged afterwards.
pub struct DynamicFeeEngine {
    indicators: Arc<dyn IndicatorHistory>,
    fees: Arc<dyn FeeHistory>,
}

impl DynamicFeeEngine {
    pub fn new(indicators: Arc<dyn IndicatorHistory>, fees: Arc<dyn FeeHistory>) -> Self {
        Self { indicators, fees }
    }

    /// Fee to charge a trade on `side` of `pool` during `epoch`
    pub async fn get_fee(&self, pool: &Pool, epoch: Epoch, side: Side) -> FeePips {
        let older = match epoch.checked_sub(2) {
            Some(lookback) => self.indicators.read_indicator(&pool.id, lookback).await,
            None => None,
        };

        let Some(older) = older else {
            return self.cold_start(pool, epoch, side).await;
        };

        if let Some(fee) = self.fees.read(&pool.id, epoch, side).await {
            debug!(pool = %pool.id, epoch, %side, fee, "memoized fee");
            return fee;
        }

        // No trade in E-1 means the price did not move
        let newer = self
            .indicators
            .read_indicator(&pool.id, epoch - 1)
            .await
            .unwrap_or(older);

        let fee = self.compute_side(pool, epoch, side, older, newer).await;
        self.fees.try_store(&pool.id, epoch, side, fee).await
    }

    async fn cold_start(&self, pool: &Pool, epoch: Epoch, side: Side) -> FeePips {
        let base_fee = pool.base_fee();
        let buy = self.fees.try_store(&pool.id, epoch, Side::Buy, base_fee).await;
        let sell = self.fees.try_store(&pool.id, epoch, Side::Sell, base_fee).await;
        debug!(pool = %pool.id, epoch, base_fee, "cold start, charging base fee");

        match side {
            Side::Buy => buy,
            Side::Sell => sell,
        }
    }

    async fn compute_side(&self, pool: &Pool, epoch: Epoch, side: Side, older: Tick, newer: Tick) -> FeePips {
        let base_fee = pool.base_fee();
        let prev = self.fees.read_record(&pool.id, epoch - 1).await;
        let prev_buy = prev.buy.unwrap_or(base_fee);
        let prev_sell = prev.sell.unwrap_or(base_fee);

        let trend = Trend::between(older, newer);
        let delta = fee_step(prev_buy, prev_sell);
        let prev_side = match side {
            Side::Buy => prev_buy,
            Side::Sell => prev_sell,
        };
        let fee = next_fee(side, trend, prev_side, delta);

        debug!(
            pool = %pool.id,
            epoch,
            %side,
            ?trend,
            prev_buy,
            prev_sell,
            delta,
            fee,
            "computed dynamic fee"
        );
        fee
    }

    pub async fn get_indicator(&self, pool: &PoolId, epoch: Epoch) -> Option<Tick> {
        self.indicators.read_indicator(pool, epoch).await
    }

    pub async fn get_buy_fee(&self, pool: &PoolId, epoch: Epoch) -> Option<FeePips> {
        self.fees.read(pool, epoch, Side::Buy).await
    }

    pub async fn get_sell_fee(&self, pool: &PoolId, epoch: Epoch) -> Option<FeePips> {
        self.fees.read(pool, epoch, Side::Sell).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::{InMemoryFeeHistory, InMemoryIndicatorHistory};
    use crate::shared::types::{FeeTier, PoolId, MAX_FEE_PIPS};

    struct Fixture {
        engine: DynamicFeeEngine,
        indicators: Arc<InMemoryIndicatorHistory>,
        fees: Arc<InMemoryFeeHistory>,
    }

    fn fixture() -> Fixture {
        let indicators = Arc::new(InMemoryIndicatorHistory::new());
        let fees = Arc::new(InMemoryFeeHistory::new());
        let engine = DynamicFeeEngine::new(indicators.clone(), fees.clone());
        Fixture { engine, indicators, fees }
    }

    fn pool(id: &str, base_fee: FeePips) -> Pool {
        Pool { id: PoolId::new(id), fee_tier: FeeTier::dynamic(base_fee) }
    }

    #[tokio::test]
    async fn test_cold_start_returns_base_fee() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);

        assert_eq!(f.engine.get_fee(&pool, 100, Side::Sell).await, 3000);
        assert_eq!(f.engine.get_fee(&pool, 100, Side::Buy).await, 3000);
        assert_eq!(f.engine.get_buy_fee(&pool.id, 100).await, Some(3000));
        assert_eq!(f.engine.get_sell_fee(&pool.id, 100).await, Some(3000));
    }

    #[tokio::test]
    async fn test_cold_start_keeps_already_stored_fee() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.fees.try_store(&pool.id, 100, Side::Buy, 1234).await;

        assert_eq!(f.engine.get_fee(&pool, 100, Side::Buy).await, 1234);
        assert_eq!(f.engine.get_fee(&pool, 100, Side::Buy).await, 1234);
        assert_eq!(f.engine.get_buy_fee(&pool.id, 100).await, Some(1234));
        // the empty side still gets the base fee
        assert_eq!(f.engine.get_sell_fee(&pool.id, 100).await, Some(3000));
    }

    #[tokio::test]
    async fn test_cold_start_is_not_recomputed_once_history_arrives() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 3000);

        f.indicators.record_indicator(&pool.id, 100, 10).await;
        f.indicators.record_indicator(&pool.id, 101, 20).await;

        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 3000);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 3000);
    }

    #[tokio::test]
    async fn test_cold_start_at_genesis_epochs() {
        let f = fixture();
        let pool = pool("ETH-USDC", 500);

        assert_eq!(f.engine.get_fee(&pool, 0, Side::Buy).await, 500);
        assert_eq!(f.engine.get_fee(&pool, 1, Side::Sell).await, 500);
    }

    #[tokio::test]
    async fn test_one_epoch_of_history_is_still_cold() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 10).await;

        assert_eq!(f.engine.get_fee(&pool, 101, Side::Buy).await, 3000);
        assert_eq!(f.engine.get_fee(&pool, 101, Side::Sell).await, 3000);
    }

    #[tokio::test]
    async fn test_increasing_trend_raises_buy_and_lowers_sell() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 10).await;
        f.indicators.record_indicator(&pool.id, 101, 20).await;

        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 3300);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 2700);
    }

    #[tokio::test]
    async fn test_tie_counts_as_not_increasing() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 7).await;
        f.indicators.record_indicator(&pool.id, 101, 7).await;

        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 2700);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 3300);
    }

    #[tokio::test]
    async fn test_missing_previous_epoch_counts_as_flat() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 7).await;

        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 2700);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 3300);
    }

    #[tokio::test]
    async fn test_uses_previous_epoch_fees() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.fees.try_store(&pool.id, 101, Side::Buy, 2700).await;
        f.fees.try_store(&pool.id, 101, Side::Sell, 3300).await;
        f.indicators.record_indicator(&pool.id, 100, 20).await;
        f.indicators.record_indicator(&pool.id, 101, 10).await;

        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 3600);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 2400);
    }

    #[tokio::test]
    async fn test_missing_previous_side_falls_back_to_base() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.fees.try_store(&pool.id, 101, Side::Sell, 1000).await;
        f.indicators.record_indicator(&pool.id, 100, 0).await;
        f.indicators.record_indicator(&pool.id, 101, 1).await;

        // delta = (3000 + 1000) / 2 / 10 = 200
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 3200);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 800);
    }

    #[tokio::test]
    async fn test_stored_zero_is_not_replaced_by_base_fee() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.fees.try_store(&pool.id, 101, Side::Buy, 0).await;
        f.fees.try_store(&pool.id, 101, Side::Sell, 200).await;
        f.indicators.record_indicator(&pool.id, 100, 5).await;
        f.indicators.record_indicator(&pool.id, 101, 1).await;

        // delta = (0 + 200) / 2 / 10 = 10
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 0);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 210);
    }

    #[tokio::test]
    async fn test_memoized_fee_ignores_later_history_changes() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 10).await;
        f.indicators.record_indicator(&pool.id, 101, 20).await;

        let first = f.engine.get_fee(&pool, 102, Side::Buy).await;
        f.indicators.record_indicator(&pool.id, 101, 0).await;
        let second = f.engine.get_fee(&pool, 102, Side::Buy).await;

        assert_eq!(first, 3300);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_current_epoch_indicator_is_ignored() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 10).await;
        f.indicators.record_indicator(&pool.id, 101, 20).await;
        f.indicators.record_indicator(&pool.id, 102, -1000).await;

        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 3300);
    }

    #[tokio::test]
    async fn test_sides_are_stored_independently() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 10).await;
        f.indicators.record_indicator(&pool.id, 101, 20).await;

        f.engine.get_fee(&pool, 102, Side::Sell).await;

        assert_eq!(f.engine.get_sell_fee(&pool.id, 102).await, Some(2700));
        assert_eq!(f.engine.get_buy_fee(&pool.id, 102).await, None);
    }

    #[tokio::test]
    async fn test_fees_step_apart_then_converge() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);

        for side in [Side::Sell, Side::Buy] {
            assert_eq!(f.engine.get_fee(&pool, 100, side).await, 3000);
        }
        f.indicators.record_indicator(&pool.id, 100, 50).await;

        for side in [Side::Sell, Side::Buy] {
            assert_eq!(f.engine.get_fee(&pool, 101, side).await, 3000);
        }
        f.indicators.record_indicator(&pool.id, 101, 40).await;

        // falling price: sell side dearer, buy side cheaper
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Sell).await, 3300);
        assert_eq!(f.engine.get_fee(&pool, 102, Side::Buy).await, 2700);
        f.indicators.record_indicator(&pool.id, 102, 45).await;

        // reversal: delta = (2700 + 3300) / 2 / 10 = 300
        assert_eq!(f.engine.get_fee(&pool, 103, Side::Sell).await, 3000);
        assert_eq!(f.engine.get_fee(&pool, 103, Side::Buy).await, 3000);
    }

    #[tokio::test]
    async fn test_repeated_fall_never_goes_negative() {
        let f = fixture();
        let pool = pool("ETH-USDC", 3000);

        let mut tick = 0;
        for epoch in 0..200u64 {
            let buy = f.engine.get_fee(&pool, epoch, Side::Buy).await;
            let sell = f.engine.get_fee(&pool, epoch, Side::Sell).await;
            assert!(sell <= MAX_FEE_PIPS);
            if epoch >= 3 {
                let prev_buy = f.engine.get_buy_fee(&pool.id, epoch - 1).await.unwrap();
                assert!(buy <= prev_buy);
            }
            f.indicators.record_indicator(&pool.id, epoch, tick).await;
            tick -= 10;
        }

        assert_eq!(f.engine.get_buy_fee(&pool.id, 199).await, Some(0));
    }

    #[tokio::test]
    async fn test_pools_are_independent() {
        let f = fixture();
        let a = pool("A", 3000);
        let b = pool("B", 500);
        f.indicators.record_indicator(&a.id, 100, 1).await;
        f.indicators.record_indicator(&a.id, 101, 2).await;

        assert_eq!(f.engine.get_fee(&a, 102, Side::Buy).await, 3300);
        assert_eq!(f.engine.get_fee(&b, 102, Side::Buy).await, 500);
        assert_eq!(f.engine.get_buy_fee(&a.id, 102).await, Some(3300));
        assert_eq!(f.engine.get_indicator(&b.id, 101).await, None);
    }

    #[tokio::test]
    async fn test_concurrent_queries_observe_one_value() {
        let f = fixture();
        let engine = Arc::new(f.engine);
        let pool = pool("ETH-USDC", 3000);
        f.indicators.record_indicator(&pool.id, 100, 1).await;
        f.indicators.record_indicator(&pool.id, 101, 2).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let pool = pool.clone();
                tokio::spawn(async move { engine.get_fee(&pool, 102, Side::Sell).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 2700);
        }
    }

    #[tokio::test]
    async fn test_get_indicator() {
        let f = fixture();
        let pool = PoolId::new("ETH-USDC");
        f.indicators.record_indicator(&pool, 5, -12).await;

        assert_eq!(f.engine.get_indicator(&pool, 5).await, Some(-12));
        assert_eq!(f.engine.get_indicator(&pool, 6).await, None);
    }
}
