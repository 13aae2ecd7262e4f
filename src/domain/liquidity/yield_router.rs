//! Forwarding of withdrawn liquidity to an external yield integration

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, info};
use crate::shared::errors::ConfigError;
use crate::shared::types::{LiquidityDelta, PoolId};

/// Supported yield integrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YieldIntegration {
    /// Withdrawn funds stay with the caller
    None,
    Aave,
    Compound,
    Morpho,
}

impl YieldIntegration {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldIntegration::None => "none",
            YieldIntegration::Aave => "aave",
            YieldIntegration::Compound => "compound",
            YieldIntegration::Morpho => "morpho",
        }
    }

    pub fn all() -> Vec<YieldIntegration> {
        vec![
            YieldIntegration::None,
            YieldIntegration::Aave,
            YieldIntegration::Compound,
            YieldIntegration::Morpho,
        ]
    }
}

impl FromStr for YieldIntegration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::all()
            .into_iter()
            .find(|integration| integration.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownIntegration(name.to_string()))
    }
}

/// Record of an amount handed to an integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub pool: PoolId,
    pub integration: YieldIntegration,
    pub amounts: LiquidityDelta,
    pub timestamp: DateTime<Utc>,
}

/// Destination for withdrawn liquidity
#[async_trait]
pub trait YieldSink: Send + Sync {
    fn integration(&self) -> YieldIntegration;

    async fn deposit(&self, pool: &PoolId, amounts: LiquidityDelta) -> Deposit;
}

/// Sink that only keeps a ledger of what it was handed
#[derive(Debug)]
pub struct LedgerSink {
    integration: YieldIntegration,
    deposits: RwLock<Vec<Deposit>>,
}

impl LedgerSink {
    pub fn new(integration: YieldIntegration) -> Self {
        Self { integration, deposits: RwLock::new(Vec::new()) }
    }

    pub async fn deposits(&self) -> Vec<Deposit> {
        self.deposits.read().await.clone()
    }
}

#[async_trait]
impl YieldSink for LedgerSink {
    fn integration(&self) -> YieldIntegration {
        self.integration
    }

    async fn deposit(&self, pool: &PoolId, amounts: LiquidityDelta) -> Deposit {
        let deposit = Deposit {
            pool: pool.clone(),
            integration: self.integration,
            amounts,
            timestamp: Utc::now(),
        };
        self.deposits.write().await.push(deposit.clone());
        deposit
    }
}

/// Routes liquidity-decreased events to the sink chosen at configuration time
pub struct YieldRouter {
    sink: Option<LedgerSink>,
}

impl YieldRouter {
    pub fn new(integration: YieldIntegration) -> Self {
        let sink = match integration {
            YieldIntegration::None => None,
            other => Some(LedgerSink::new(other)),
        };
        Self { sink }
    }

    pub fn integration(&self) -> YieldIntegration {
        self.sink
            .as_ref()
            .map_or(YieldIntegration::None, |sink| sink.integration())
    }

    /// Forward a withdrawal; returns `None` when nothing was forwarded
    pub async fn route(&self, pool: &PoolId, amounts: LiquidityDelta) -> Option<Deposit> {
        let sink = self.sink.as_ref()?;
        if amounts.is_zero() {
            debug!(%pool, "empty withdrawal, nothing to forward");
            return None;
        }

        let deposit = sink.deposit(pool, amounts).await;
        info!(
            %pool,
            integration = deposit.integration.as_str(),
            amount0 = %amounts.amount0,
            amount1 = %amounts.amount1,
            "forwarded withdrawn liquidity"
        );
        Some(deposit)
    }

    pub async fn deposits(&self) -> Vec<Deposit> {
        match &self.sink {
            Some(sink) => sink.deposits().await,
            None => Vec::new(),
        }
    }
}
