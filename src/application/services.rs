//! Application services: scenario replay and tick random-walk simulation

use anyhow::{Context, Result};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use crate::application::fee_hook::DynamicFeeHook;
use crate::report::{FeeReport, FeeRow, PoolSummary};
use crate::shared::errors::{AppError, ConfigError, HookError};
use crate::shared::types::{Epoch, LiquidityDelta, PoolId, Side, Tick};

/// Event in a replayable scenario file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioEvent {
    /// A trade: the fee is quoted, then `tick` is recorded as the settled indicator
    Swap {
        epoch: Epoch,
        pool: String,
        side: Side,
        tick: Tick,
    },
    RemoveLiquidity {
        pool: String,
        amount0: u64,
        amount1: u64,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read scenario {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(s).context("parse scenario")?;
        Ok(scenario)
    }
}

/// Random-walk simulation parameters
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub start_epoch: Epoch,
    pub epochs: u64,
    pub seed: u64,
    /// Largest tick move per epoch, in either direction
    pub volatility: Tick,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            start_epoch: 1,
            epochs: 20,
            seed: 42,
            volatility: 50,
        }
    }
}

/// Drives the hook the way a pool's swap lifecycle would
pub struct FeeService {
    hook: Arc<DynamicFeeHook>,
}

impl FeeService {
    pub fn new(hook: Arc<DynamicFeeHook>) -> Self {
        Self { hook }
    }

    pub fn hook(&self) -> &DynamicFeeHook {
        &self.hook
    }

    /// Replay scenario events in file order
    pub async fn replay(&self, scenario: &Scenario) -> Result<FeeReport, AppError> {
        info!(events = scenario.events.len(), "replaying scenario");
        let mut rows = Vec::new();

        for event in &scenario.events {
            match event {
                ScenarioEvent::Swap { epoch, pool, side, tick } => {
                    let pool = PoolId::new(pool.as_str());
                    rows.push(self.swap(&pool, *epoch, *side, *tick).await?);
                }
                ScenarioEvent::RemoveLiquidity { pool, amount0, amount1 } => {
                    let amounts = LiquidityDelta::new(*amount0 as u128, *amount1 as u128);
                    self.hook
                        .after_remove_liquidity(&PoolId::new(pool.as_str()), amounts)
                        .await?;
                }
            }
        }

        Ok(self.build_report(rows).await)
    }

    /// Simulate one trade per pool per epoch on a seeded random tick walk.
    /// Pools are driven concurrently within an epoch.
    pub async fn simulate(&self, params: &SimulationParams) -> Result<FeeReport, AppError> {
        let pools = self.hook.pools().await;
        info!(
            pools = pools.len(),
            epochs = params.epochs,
            seed = params.seed,
            volatility = params.volatility,
            "starting simulation"
        );

        let end = params
            .start_epoch
            .checked_add(params.epochs)
            .ok_or(ConfigError::EpochOverflow { start: params.start_epoch, epochs: params.epochs })?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut ticks: HashMap<PoolId, Tick> = HashMap::new();
        let volatility = params.volatility.max(0);
        let mut rows = Vec::new();

        for epoch in params.start_epoch..end {
            // plan sequentially so the walk only depends on the seed
            let plan: Vec<(PoolId, Side, Tick)> = pools
                .iter()
                .map(|pool| {
                    let side = Side::from_zero_for_one(rng.gen_bool(0.5));
                    let step = rng.gen_range(-volatility..=volatility);
                    let tick = ticks.entry(pool.id.clone()).or_insert(0);
                    *tick = tick.saturating_add(step);
                    (pool.id.clone(), side, *tick)
                })
                .collect();

            let results = join_all(
                plan.iter()
                    .map(|(pool, side, tick)| self.swap(pool, epoch, *side, *tick)),
            )
            .await;

            for row in results {
                rows.push(row?);
            }
        }

        Ok(self.build_report(rows).await)
    }

    async fn swap(&self, pool: &PoolId, epoch: Epoch, side: Side, tick: Tick) -> Result<FeeRow, HookError> {
        let fee = self.hook.before_swap(pool, epoch, side).await?;
        self.hook.after_swap(pool, epoch, tick).await?;
        Ok(FeeRow { epoch, pool: pool.clone(), side, fee, tick })
    }

    /// Report of `rows` plus the latest stored fees per pool
    pub async fn build_report(&self, rows: Vec<FeeRow>) -> FeeReport {
        let mut last_epochs: HashMap<&PoolId, Epoch> = HashMap::new();
        for row in &rows {
            let last = last_epochs.entry(&row.pool).or_insert(row.epoch);
            *last = (*last).max(row.epoch);
        }

        let mut summaries = Vec::new();
        for pool in self.hook.pools().await {
            let last_epoch = last_epochs.get(&pool.id).copied();
            let (buy_fee, sell_fee) = match last_epoch {
                Some(epoch) => (
                    self.hook.get_buy_fee(&pool.id, epoch).await,
                    self.hook.get_sell_fee(&pool.id, epoch).await,
                ),
                None => (None, None),
            };
            summaries.push(PoolSummary {
                pool: pool.id.clone(),
                base_fee: pool.base_fee(),
                last_epoch,
                buy_fee,
                sell_fee,
            });
        }

        FeeReport::new(self.hook.integration(), rows, self.hook.stats().await)
            .with_pools(summaries)
            .with_deposits(self.hook.deposits().await)
    }
}
