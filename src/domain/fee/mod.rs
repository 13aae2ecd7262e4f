//! Fee domain - trend-driven dynamic fee computation

mod fee_engine;
pub mod trend;

pub use fee_engine::DynamicFeeEngine;
pub use trend::Trend;
