//! Common types used across the application

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker bit carried by the nominal fee of pools that use a variable fee
pub const DYNAMIC_FEE_FLAG: u32 = 0x80_0000;

/// Upper bound for any fee rate, in pips (1_000_000 = 100%)
pub const MAX_FEE_PIPS: u32 = 1_000_000;

/// Global settlement sequence index (e.g. block height)
pub type Epoch = u64;

/// Price indicator; higher value means higher price
pub type Tick = i32;

/// Fee rate in pips (parts per million)
pub type FeePips = u32;

/// Stable pool identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(String);

impl PoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Nominal fee as configured on the pool plus the dynamic marker.
///
/// The base fee and the marker are kept apart so a base fee that happens to
/// overlap `DYNAMIC_FEE_FLAG` is never silently truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeTier {
    base_fee: FeePips,
    dynamic: bool,
}

impl FeeTier {
    /// Tier requesting variable fee computation around `base_fee`
    pub fn dynamic(base_fee: FeePips) -> Self {
        Self { base_fee, dynamic: true }
    }

    /// Tier with a fixed fee
    pub fn fixed(fee: FeePips) -> Self {
        Self { base_fee: fee, dynamic: false }
    }

    /// Nominal fee word as a pool would carry it on chain
    pub fn raw(&self) -> u32 {
        if self.dynamic {
            self.base_fee | DYNAMIC_FEE_FLAG
        } else {
            self.base_fee
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Nominal fee without the dynamic marker
    pub fn base_fee(&self) -> FeePips {
        self.base_fee
    }
}

/// Registered pool. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub fee_tier: FeeTier,
}

impl Pool {
    pub fn base_fee(&self) -> FeePips {
        self.fee_tier.base_fee()
    }
}

/// Which side of the pair the trader gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Giving up asset 0 is a sell, giving up asset 1 is a buy
    pub fn from_zero_for_one(zero_for_one: bool) -> Self {
        if zero_for_one {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buy/sell fee pair stored per (pool, epoch). `None` means not computed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub buy: Option<FeePips>,
    pub sell: Option<FeePips>,
}

impl FeeRecord {
    pub fn get(&self, side: Side) -> Option<FeePips> {
        match side {
            Side::Buy => self.buy,
            Side::Sell => self.sell,
        }
    }

    pub(crate) fn slot_mut(&mut self, side: Side) -> &mut Option<FeePips> {
        match side {
            Side::Buy => &mut self.buy,
            Side::Sell => &mut self.sell,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_none() && self.sell.is_none()
    }
}

/// Token amounts withdrawn from a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityDelta {
    pub amount0: u128,
    pub amount1: u128,
}

impl LiquidityDelta {
    pub fn new(amount0: u128, amount1: u128) -> Self {
        Self { amount0, amount1 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }
}
