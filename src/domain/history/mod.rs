//! History domain - per-pool, per-epoch indicator and fee stores

mod indicator_history;
mod fee_history;

pub use indicator_history::{IndicatorHistory, InMemoryIndicatorHistory};
pub use fee_history::{FeeHistory, InMemoryFeeHistory};

use crate::shared::types::Epoch;

/// The engine looks back two epochs, so the current epoch plus two must survive pruning
pub const MIN_RETAINED_EPOCHS: u64 = 3;

/// How many epochs of history each store keeps per pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep_epochs: Option<u64>,
}

impl RetentionPolicy {
    pub fn keep_all() -> Self {
        Self { keep_epochs: None }
    }

    /// Keep the last `n` epochs; values below `MIN_RETAINED_EPOCHS` are raised to it
    pub fn keep_last(n: u64) -> Self {
        Self { keep_epochs: Some(n.max(MIN_RETAINED_EPOCHS)) }
    }

    pub fn keep_epochs(&self) -> Option<u64> {
        self.keep_epochs
    }

    /// First epoch that must be retained when `current` is the newest epoch
    pub fn prune_floor(&self, current: Epoch) -> Option<Epoch> {
        let keep = self.keep_epochs?;
        current.checked_sub(keep - 1).filter(|floor| *floor > 0)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::keep_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_all_never_prunes() {
        assert_eq!(RetentionPolicy::keep_all().prune_floor(1_000_000), None);
    }

    #[test]
    fn test_keep_last_floor() {
        let policy = RetentionPolicy::keep_last(3);
        assert_eq!(policy.prune_floor(102), Some(100));
        assert_eq!(policy.prune_floor(2), None);
        assert_eq!(policy.prune_floor(1), None);
    }

    #[test]
    fn test_keep_last_is_raised_to_minimum() {
        assert_eq!(RetentionPolicy::keep_last(1).keep_epochs(), Some(MIN_RETAINED_EPOCHS));
    }
}
