//! Utility functions and helpers

use crate::shared::types::FeePips;

/// Format a fee in pips as a percentage string
pub fn format_fee(fee: FeePips) -> String {
    format!("{:.4}%", fee as f64 / 10_000.0)
}
