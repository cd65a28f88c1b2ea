//! Jito Bundler - Main Application Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{ConfigLoader, ConfigValidator};
use std::{env, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod keys;
mod transfer;

use app::Application;
use transfer::TransferSpec;
use types::utils::lamports_to_sol;

#[derive(Debug, Parser)]
#[command(name = "bundler", version, about = "Submit tipped transaction bundles to a Jito block engine")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "CONFIG_PATH", default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the block engine's current tip accounts
    TipAccounts,
    /// Probe the block engine
    Health,
    /// Bundle SOL transfers and resubmit until the bundle lands
    Transfer {
        /// FROM_ENV:TO:LAMPORTS, where TO is a pubkey or a key variable name
        #[arg(long = "transfer", required = true, value_name = "FROM_ENV:TO:LAMPORTS")]
        transfers: Vec<TransferSpec>,

        /// Environment variable holding the tip payer's secret key
        #[arg(long, default_value = keys::TIP_PAYER_ENV)]
        tip_payer_env: String,

        /// Stop after this many attempts instead of retrying forever
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Write the default configuration to a file
    InitConfig {
        #[arg(default_value = "config.yaml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let cli = Cli::parse();

    if let Command::InitConfig { path } = &cli.command {
        ConfigLoader::create_example(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = ConfigLoader::load(&cli.config).context("Failed to load configuration")?;

    init_logging(&config.logging.level, &config.logging.format)?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if !e.not_found() => warn!("Could not load .env file: {}", e),
        Err(_) => {}
    }

    info!("Starting Jito Bundler v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config.display());

    let report = ConfigValidator::validate(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, "{}", warning.message);
    }

    let app = Application::new(config).context("Failed to create application")?;

    // Setup signal handling
    let shutdown = app.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let result = run(&app, cli.command).await;
    app.shutdown();

    if let Err(e) = &result {
        tracing::error!("Application error: {:#}", e);
    }
    result
}

async fn run(app: &Application, command: Command) -> Result<()> {
    match command {
        Command::TipAccounts => {
            for account in app.tip_accounts().await? {
                println!("{}", account);
            }
        }
        Command::Health => {
            let check = app.health().await;
            println!(
                "{}: {:?} (latency: {} ms, consecutive failures: {})",
                check.name,
                check.status,
                check
                    .response_time_ms
                    .map_or_else(|| "-".to_string(), |ms| ms.to_string()),
                check.consecutive_failures
            );
            if let Some(error) = check.error_message {
                anyhow::bail!("Block engine unhealthy: {}", error);
            }
        }
        Command::Transfer {
            transfers,
            tip_payer_env,
            max_attempts,
        } => {
            let accepted = app
                .submit_transfers(&transfers, &tip_payer_env, max_attempts)
                .await?;
            println!(
                "Bundle {} landed in slot {} after {} attempt(s) (tip {} SOL)",
                accepted.bundle_id,
                accepted.slot,
                accepted.attempts,
                lamports_to_sol(app.config().bundle.tip_lamports)
            );
        }
        Command::InitConfig { .. } => {}
    }
    Ok(())
}

/// Initialize logging from the configuration, `RUST_LOG` and `LOG_FORMAT`
fn init_logging(level: &str, format: &str) -> Result<()> {
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!("Logging initialized");
    info!("Log level: {}", level);
    info!("Log format: {}", log_format);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transfer_command() {
        let cli = Cli::try_parse_from([
            "bundler",
            "transfer",
            "--transfer",
            "WALLET1_PRIV_KEY:WALLET2_PRIV_KEY:1000000",
            "--transfer",
            "WALLET2_PRIV_KEY:WALLET3_PRIV_KEY:500000",
            "--max-attempts",
            "5",
        ])
        .unwrap();

        match cli.command {
            Command::Transfer {
                transfers,
                tip_payer_env,
                max_attempts,
            } => {
                assert_eq!(transfers.len(), 2);
                assert_eq!(tip_payer_env, keys::TIP_PAYER_ENV);
                assert_eq!(max_attempts, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_transfer_requires_specs() {
        assert!(Cli::try_parse_from(["bundler", "transfer"]).is_err());
        assert!(Cli::try_parse_from(["bundler", "transfer", "--transfer", "bad"]).is_err());
    }
}
