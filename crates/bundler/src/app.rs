//! Application wiring: configuration, keys, relay client and engine

use crate::{
    keys::{self, AUTH_KEY_ENV},
    transfer::{TransferPlan, TransferSpec},
};
use anyhow::{Context, Result};
use config::Config;
use engine::{EngineSettings, RetryDriver, RpcBlockhashSource};
use relay_client::{BlockEngineClient, RelayClient, RelayHealthMonitor};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::{utils::format_lamports, AcceptedBundle, RelayHealthCheck};

/// Main application that coordinates all components
pub struct Application {
    config: Config,
    client: BlockEngineClient,
    blockhash_source: Arc<RpcBlockhashSource>,
    shutdown: CancellationToken,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        let auth_keypair = auth_keypair(&config)?;

        let client = BlockEngineClient::new(config.to_block_engine_relay(), auth_keypair)
            .context("Failed to create block engine client")?;

        let blockhash_source = RpcBlockhashSource::new(
            config.network.rpc_url.clone(),
            &config.network.commitment,
        )
        .context("Failed to create RPC client")?;

        info!(
            block_engine = %config.block_engine.url,
            rpc_url = %config.network.rpc_url,
            "Application components initialized successfully"
        );

        Ok(Self {
            config,
            client,
            blockhash_source: Arc::new(blockhash_source),
            shutdown: CancellationToken::new(),
        })
    }

    /// Token cancelled on shutdown; cancelling it stops any running submission
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current tip accounts of the block engine
    pub async fn tip_accounts(&self) -> Result<Vec<Pubkey>> {
        let accounts = self
            .client
            .fetch_tip_accounts()
            .await
            .context("Failed to fetch tip accounts")?;
        info!(count = accounts.len(), "Fetched tip accounts");
        Ok(accounts)
    }

    /// Probe the block engine once
    pub async fn health(&self) -> RelayHealthCheck {
        let mut monitor = RelayHealthMonitor::new(&self.config.block_engine.name);
        monitor.probe(&self.client).await.clone()
    }

    /// Bundle the given transfers and resubmit until the bundle lands.
    ///
    /// Without `max_attempts` (here or in the configuration) this only
    /// returns on acceptance or shutdown.
    pub async fn submit_transfers(
        &self,
        specs: &[TransferSpec],
        tip_payer_env: &str,
        max_attempts: Option<u32>,
    ) -> Result<AcceptedBundle> {
        let tip_payer = keys::keypair_from_env(tip_payer_env).context("Failed to load tip payer key")?;

        let plan = TransferPlan::resolve(specs).context("Failed to load transfers")?;

        let mut settings = EngineSettings::from(&self.config);
        if max_attempts.is_some() {
            settings.retry.max_attempts = max_attempts;
        }
        if settings.retry.max_attempts.is_none() {
            warn!("No attempt ceiling configured; retrying until the bundle lands or Ctrl+C");
        }

        info!(
            transfers = plan.len(),
            tip = %format_lamports(settings.tip_lamports),
            tip_payer = %tip_payer.pubkey(),
            "Submitting transfer bundle"
        );

        let driver = RetryDriver::new(self.client.clone(), self.blockhash_source.clone(), settings);
        let accepted = driver
            .run_until_accepted(&plan, &tip_payer, &self.shutdown)
            .await
            .context("Bundle submission failed")?;

        Ok(accepted)
    }

    /// Shutdown the application gracefully
    pub fn shutdown(&self) {
        info!("Shutting down application...");
        self.shutdown.cancel();
    }
}

/// Keypair for the block engine's challenge/response handshake.
///
/// Only read when `block_engine.challenge_auth` is enabled.
fn auth_keypair(config: &Config) -> Result<Option<Keypair>> {
    if !config.block_engine.challenge_auth {
        if config.block_engine.auth_uuid.is_some() {
            info!("Block engine access via x-jito-auth UUID");
        } else {
            info!("Using unauthenticated block engine access");
        }
        return Ok(None);
    }

    let keypair = keys::optional_keypair_from_env(AUTH_KEY_ENV)
        .context("Failed to load block engine auth key")?;
    match &keypair {
        Some(keypair) => info!(pubkey = %keypair.pubkey(), "Block engine challenge authentication enabled"),
        None => warn!(
            "block_engine.challenge_auth is set but {} is not; skipping the handshake",
            AUTH_KEY_ENV
        ),
    }
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ConfigLoader;

    #[test]
    fn test_application_from_config_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        ConfigLoader::create_example(file.path()).unwrap();
        let config = ConfigLoader::load(file.path()).unwrap();

        let app = Application::new(config).unwrap();
        assert_eq!(app.config().bundle.transaction_limit, 3);

        let token = app.shutdown_token();
        assert!(!token.is_cancelled());
        app.shutdown();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_submit_transfers_requires_tip_payer() {
        let app = Application::new(Config::default()).unwrap();
        let err = app
            .submit_transfers(&[], "BUNDLER_TEST_APP_NO_TIP_PAYER", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tip payer"));
    }

    #[test]
    fn test_auth_key_only_read_with_challenge_auth() {
        std::env::set_var(AUTH_KEY_ENV, "not-a-key");

        let mut config = Config::default();
        assert!(auth_keypair(&config).unwrap().is_none());

        config.block_engine.challenge_auth = true;
        assert!(auth_keypair(&config).is_err());

        std::env::remove_var(AUTH_KEY_ENV);
        assert!(auth_keypair(&config).unwrap().is_none());
    }
}
