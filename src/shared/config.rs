//! TOML configuration loading and validation

use std::fs;
use std::path::Path;
use serde::Deserialize;
use tracing::debug;
use crate::domain::history::{RetentionPolicy, MIN_RETAINED_EPOCHS};
use crate::domain::liquidity::YieldIntegration;
use crate::shared::errors::ConfigError;
use crate::shared::types::{FeeTier, FeePips, PoolId};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineCfg {
    /// Epochs of history kept per pool; absent keeps everything
    pub retention_epochs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YieldCfg {
    pub integration: String,
}

impl Default for YieldCfg {
    fn default() -> Self {
        Self { integration: "none".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolCfg {
    pub id: String,
    pub base_fee: FeePips,
    #[serde(default = "default_dynamic")]
    pub dynamic: bool,
}

fn default_dynamic() -> bool {
    true
}

impl PoolCfg {
    pub fn fee_tier(&self) -> FeeTier {
        if self.dynamic {
            FeeTier::dynamic(self.base_fee)
        } else {
            FeeTier::fixed(self.base_fee)
        }
    }
}

/// Raw contents of the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub engine: EngineCfg,
    #[serde(default, rename = "yield")]
    pub yield_cfg: YieldCfg,
    #[serde(default)]
    pub pools: Vec<PoolCfg>,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct FeeConfig {
    pub retention: RetentionPolicy,
    pub integration: YieldIntegration,
    pub pools: Vec<(PoolId, FeeTier)>,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::keep_all(),
            integration: YieldIntegration::None,
            pools: Vec::new(),
        }
    }
}

/// Config loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FeeConfig, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<FeeConfig, ConfigError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::resolve(file)
    }

    /// Turn the raw file into a validated config; integration names are parsed here, once
    pub fn resolve(file: ConfigFile) -> Result<FeeConfig, ConfigError> {
        let retention = match file.engine.retention_epochs {
            None => RetentionPolicy::keep_all(),
            Some(n) if n < MIN_RETAINED_EPOCHS => {
                return Err(ConfigError::RetentionTooShort { min: MIN_RETAINED_EPOCHS, got: n });
            }
            Some(n) => RetentionPolicy::keep_last(n),
        };

        let integration: YieldIntegration = file.yield_cfg.integration.parse()?;

        let mut pools = Vec::with_capacity(file.pools.len());
        for pool in &file.pools {
            if pool.id.trim().is_empty() {
                return Err(ConfigError::InvalidPool("empty pool id".to_string()));
            }
            pools.push((PoolId::new(pool.id.trim()), pool.fee_tier()));
        }

        debug!(?retention, ?integration, pools = pools.len(), "resolved configuration");

        Ok(FeeConfig { retention, integration, pools })
    }
}
