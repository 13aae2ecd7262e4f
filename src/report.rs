// src/report.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::application::HookStats;
use crate::domain::liquidity::{Deposit, YieldIntegration};
use crate::shared::types::{Epoch, FeePips, PoolId, Side, Tick};
use crate::shared::utils::format_fee;

/// One fee quote and the indicator recorded after the trade settled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRow {
    pub epoch: Epoch,
    pub pool: PoolId,
    pub side: Side,
    pub fee: FeePips,
    pub tick: Tick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub pool: PoolId,
    pub base_fee: FeePips,
    pub last_epoch: Option<Epoch>,
    pub buy_fee: Option<FeePips>,
    pub sell_fee: Option<FeePips>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeeReport {
    pub integration: YieldIntegration,
    pub rows: Vec<FeeRow>,
    pub pools: Vec<PoolSummary>,
    pub deposits: Vec<Deposit>,
    pub stats: HookStats,

    // Метаданные
    pub timestamp: DateTime<Utc>,
}

impl FeeReport {
    pub fn new(integration: YieldIntegration, rows: Vec<FeeRow>, stats: HookStats) -> Self {
        Self {
            integration,
            rows,
            pools: Vec::new(),
            deposits: Vec::new(),
            stats,
            timestamp: Utc::now(),
        }
    }

    pub fn with_pools(mut self, pools: Vec<PoolSummary>) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_deposits(mut self, deposits: Vec<Deposit>) -> Self {
        self.deposits = deposits;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human readable table, one line per quote
    pub fn to_table(&self) -> String {
        let mut out = format!("{:>8}  {:<16} {:<5} {:>10} {:>9}\n", "epoch", "pool", "side", "fee", "tick");
        for row in &self.rows {
            out.push_str(&format!(
                "{:>8}  {:<16} {:<5} {:>10} {:>9}\n",
                row.epoch,
                row.pool.as_str(),
                row.side.as_str(),
                format_fee(row.fee),
                row.tick
            ));
        }
        for pool in &self.pools {
            out.push_str(&format!(
                "{}: base {} buy {} sell {}\n",
                pool.pool,
                format_fee(pool.base_fee),
                pool.buy_fee.map_or_else(|| "-".to_string(), format_fee),
                pool.sell_fee.map_or_else(|| "-".to_string(), format_fee),
            ));
        }
        out
    }
}
