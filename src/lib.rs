//! Trendfee - trend-adaptive dynamic fees for AMM pools
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod application;
pub mod shared;
pub mod report;

// Re-export main types for convenience
pub use application::{DynamicFeeHook, FeeService};
pub use domain::fee::DynamicFeeEngine;
pub use domain::history::{FeeHistory, IndicatorHistory, RetentionPolicy};
pub use domain::liquidity::YieldIntegration;
pub use domain::pool::PoolManager;
pub use shared::types::{Epoch, FeePips, FeeTier, Pool, PoolId, Side, Tick};
