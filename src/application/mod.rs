//! Application layer - swap hook orchestration, services and CLI commands

pub mod commands;
pub mod fee_hook;
pub mod services;

pub use commands::{Cli, Commands, CommandExecutor};
pub use fee_hook::{DynamicFeeHook, HookStats};
pub use services::{FeeService, Scenario, ScenarioEvent, SimulationParams};
