//! Liquidity domain - routing of withdrawn liquidity to yield integrations

mod yield_router;

pub use yield_router::{Deposit, LedgerSink, YieldIntegration, YieldRouter, YieldSink};
