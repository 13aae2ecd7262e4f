//! Error handling for the application

use thiserror::Error;
use crate::shared::types::{Epoch, FeePips, PoolId};

/// Pool setup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool {0} does not request a dynamic fee")]
    StaticFee(PoolId),

    #[error("Pool {pool} base fee {fee} exceeds maximum {max}")]
    FeeTooLarge { pool: PoolId, fee: FeePips, max: FeePips },

    #[error("Pool already registered: {0}")]
    AlreadyRegistered(PoolId),
}

/// Swap hook errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Pool not registered: {0}")]
    UnknownPool(PoolId),

    #[error("Epoch {epoch} for pool {pool} is older than last seen epoch {last_seen}")]
    StaleEpoch { pool: PoolId, epoch: Epoch, last_seen: Epoch },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown yield integration: {0}")]
    UnknownIntegration(String),

    #[error("Retention must keep at least {min} epochs, got {got}")]
    RetentionTooShort { min: u64, got: u64 },

    #[error("Invalid pool configuration: {0}")]
    InvalidPool(String),

    #[error("Simulation of {epochs} epochs from {start} overflows the epoch counter")]
    EpochOverflow { start: Epoch, epochs: u64 },

    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
