//! Trend detection and per-epoch fee step helpers

use crate::shared::types::{FeePips, Side, Tick, MAX_FEE_PIPS};

/// Fees move by a tenth of the previous buy/sell average each epoch
pub const FEE_STEP_DIVISOR: u64 = 10;

/// Direction of the price indicator between two consecutive epochs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    /// Falling or flat
    NotIncreasing,
}

impl Trend {
    pub fn between(older: Tick, newer: Tick) -> Self {
        if newer > older {
            Trend::Increasing
        } else {
            Trend::NotIncreasing
        }
    }

    /// Whether a fee on `side` rises under this trend
    pub fn raises(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (Trend::Increasing, Side::Buy) | (Trend::NotIncreasing, Side::Sell)
        )
    }
}

/// Step size: floor of 10% of the average of the previous buy and sell fees
pub fn fee_step(prev_buy: FeePips, prev_sell: FeePips) -> FeePips {
    let average = (prev_buy as u64 + prev_sell as u64) / 2;
    // average fits in u32, so the step does too
    (average / FEE_STEP_DIVISOR) as FeePips
}

/// Next fee for `side`. Never drops below zero, never exceeds `MAX_FEE_PIPS`.
pub fn next_fee(side: Side, trend: Trend, prev: FeePips, delta: FeePips) -> FeePips {
    if trend.raises(side) {
        prev.saturating_add(delta).min(MAX_FEE_PIPS)
    } else {
        prev.saturating_sub(delta)
    }
}
