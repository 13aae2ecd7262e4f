//! Pool domain - dynamic fee pool registration

mod pool_manager;

pub use pool_manager::PoolManager;
