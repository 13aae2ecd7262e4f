//! Domain layer - core business logic and entities

pub mod fee;
pub mod history;
pub mod liquidity;
pub mod pool;
