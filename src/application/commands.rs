//! CLI commands and handlers
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use crate::application::fee_hook::DynamicFeeHook;
use crate::application::services::{FeeService, Scenario, SimulationParams};
use crate::domain::history::{RetentionPolicy, MIN_RETAINED_EPOCHS};
use crate::domain::liquidity::YieldIntegration;
use crate::report::FeeReport;
use crate::shared::config::{ConfigLoader, FeeConfig};
use crate::shared::errors::ConfigError;
use crate::shared::types::{FeeTier, FeePips, PoolId, Tick};
use crate::shared::utils::format_fee;

#[derive(Parser, Debug)]
#[command(name = "trendfee")]
#[command(version, about = "Trend-adaptive dynamic fee engine for AMM pools")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra pool as ID:BASE_FEE, may be repeated
    #[arg(long = "pool", value_parser = parse_pool_arg, global = true)]
    pub pools: Vec<(PoolId, FeeTier)>,

    /// Yield integration for withdrawn liquidity (overrides config)
    #[arg(long, global = true)]
    pub integration: Option<YieldIntegration>,

    /// Epochs of history kept per pool (overrides config)
    #[arg(long, global = true)]
    pub retention: Option<u64>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter, RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay swap and withdrawal events from a scenario file
    Replay {
        /// Scenario TOML file
        scenario: PathBuf,
    },

    /// Simulate trades on a seeded random tick walk
    Simulate {
        /// Number of epochs to simulate
        #[arg(short, long, default_value_t = 20)]
        epochs: u64,

        /// First simulated epoch
        #[arg(long, default_value_t = 1)]
        start_epoch: u64,

        /// RNG seed
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Largest tick move per epoch
        #[arg(short, long, default_value_t = 50)]
        volatility: Tick,
    },

    /// Show the resolved configuration
    Inspect,
}

fn parse_pool_arg(s: &str) -> Result<(PoolId, FeeTier), String> {
    let (id, fee) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:BASE_FEE, got {s}"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err("empty pool id".to_string());
    }
    let fee: FeePips = fee
        .trim()
        .parse()
        .map_err(|e| format!("invalid base fee {fee}: {e}"))?;
    Ok((PoolId::new(id), FeeTier::dynamic(fee)))
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(cli: Cli) -> Result<()> {
        let config = Self::resolve_config(&cli.global)?;

        match cli.command {
            Commands::Replay { scenario } => {
                let scenario = Scenario::from_file(&scenario)?;
                let service = Self::service(&config).await?;
                let report = service.replay(&scenario).await?;
                Self::print_report(&report, cli.global.json)
            }
            Commands::Simulate { epochs, start_epoch, seed, volatility } => {
                let service = Self::service(&config).await?;
                let params = SimulationParams { start_epoch, epochs, seed, volatility };
                let report = service.simulate(&params).await?;
                Self::print_report(&report, cli.global.json)
            }
            Commands::Inspect => {
                Self::execute_inspect_command(&config);
                Ok(())
            }
        }
    }

    /// Priority: CLI args > config file > defaults
    pub fn resolve_config(args: &GlobalArgs) -> Result<FeeConfig> {
        let mut config = match &args.config {
            Some(path) => ConfigLoader::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => FeeConfig::default(),
        };

        if let Some(integration) = args.integration {
            config.integration = integration;
        }
        if let Some(retention) = args.retention {
            if retention < MIN_RETAINED_EPOCHS {
                return Err(ConfigError::RetentionTooShort { min: MIN_RETAINED_EPOCHS, got: retention }.into());
            }
            config.retention = RetentionPolicy::keep_last(retention);
        }
        config.pools.extend(args.pools.iter().cloned());

        Ok(config)
    }

    async fn service(config: &FeeConfig) -> Result<FeeService> {
        if config.pools.is_empty() {
            anyhow::bail!("no pools configured, use --config or --pool ID:BASE_FEE");
        }
        let hook = DynamicFeeHook::from_config(config).await?;
        Ok(FeeService::new(Arc::new(hook)))
    }

    fn print_report(report: &FeeReport, json: bool) -> Result<()> {
        if json {
            println!("{}", report.to_json()?);
        } else {
            print!("{}", report.to_table());
        }
        info!(
            quotes = report.rows.len(),
            deposits = report.deposits.len(),
            pruned = report.stats.entries_pruned,
            "report complete"
        );
        Ok(())
    }

    fn execute_inspect_command(config: &FeeConfig) {
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!("Integration: {}", config.integration.as_str());
        match config.retention.keep_epochs() {
            Some(n) => println!("Retention: last {n} epochs"),
            None => println!("Retention: unbounded"),
        }
        println!("Pools:");
        for (id, tier) in &config.pools {
            println!(
                "  {} base {} {}",
                id,
                format_fee(tier.base_fee()),
                if tier.is_dynamic() { "dynamic" } else { "static (will be rejected)" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pool_arg() {
        let (id, tier) = parse_pool_arg("ETH-USDC:3000").unwrap();
        assert_eq!(id, PoolId::new("ETH-USDC"));
        assert_eq!(tier, FeeTier::dynamic(3000));

        assert!(parse_pool_arg("ETH-USDC").is_err());
        assert!(parse_pool_arg(":3000").is_err());
        assert!(parse_pool_arg("ETH-USDC:abc").is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "trendfee",
            "--pool",
            "ETH-USDC:3000",
            "--integration",
            "morpho",
            "--retention",
            "5",
            "simulate",
            "--epochs",
            "3",
        ]);
        let config = CommandExecutor::resolve_config(&cli.global).unwrap();

        assert_eq!(config.integration, YieldIntegration::Morpho);
        assert_eq!(config.retention, RetentionPolicy::keep_last(5));
        assert_eq!(config.pools.len(), 1);
        assert!(matches!(cli.command, Commands::Simulate { epochs: 3, .. }));
    }

    #[test]
    fn test_cli_rejects_short_retention() {
        let cli = Cli::parse_from(["trendfee", "--retention", "2", "inspect"]);
        assert!(CommandExecutor::resolve_config(&cli.global).is_err());
    }

    #[tokio::test]
    async fn test_service_requires_pools() {
        assert!(CommandExecutor::service(&FeeConfig::default()).await.is_err());
    }
}
