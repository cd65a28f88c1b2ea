//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::{BlockEngineRelay, DEFAULT_BUNDLE_TRANSACTION_LIMIT};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Solana network configuration
    pub network: NetworkConfig,
    /// Block engine configuration
    pub block_engine: BlockEngineConfig,
    /// Bundle assembly configuration
    #[serde(default)]
    pub bundle: BundleConfig,
    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Solana RPC URL used for blockhashes
    pub rpc_url: String,
    /// Commitment level for blockhash queries (processed, confirmed, finalized)
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

/// Block engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEngineConfig {
    /// Block engine name, used in logs
    #[serde(default = "default_block_engine_name")]
    pub name: String,
    /// Block engine base URL
    pub url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Bundle status poll interval in milliseconds
    #[serde(default = "default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,
    /// Jito auth UUID, sent as the `x-jito-auth` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_uuid: Option<String>,
    /// Keypair challenge/response auth over REST, only for relays that serve
    /// `/api/v1/auth/*`. Uses `JITO_AUTH_PRIV_KEY` when enabled.
    #[serde(default)]
    pub challenge_auth: bool,
}

/// Bundle assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Maximum caller transactions per bundle, tip excluded
    #[serde(default = "default_transaction_limit")]
    pub transaction_limit: usize,
    /// Fixed tip paid per bundle in lamports
    #[serde(default = "default_tip_lamports")]
    pub tip_lamports: u64,
    /// How long to wait for an acceptance before resubmitting
    #[serde(default = "default_result_timeout_seconds")]
    pub result_timeout_seconds: u64,
}

/// Retry policy configuration.
///
/// Defaults keep retrying forever with no delay between attempts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetryConfig {
    /// Attempt ceiling, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Delay between attempts in milliseconds
    #[serde(default)]
    pub backoff_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_commitment() -> String {
    "finalized".to_string()
}

fn default_block_engine_name() -> String {
    "block-engine".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_status_poll_interval_ms() -> u64 {
    1_000
}

fn default_transaction_limit() -> usize {
    DEFAULT_BUNDLE_TRANSACTION_LIMIT
}

fn default_tip_lamports() -> u64 {
    5_000
}

fn default_result_timeout_seconds() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Block engine endpoint as used by the relay client
    pub fn to_block_engine_relay(&self) -> BlockEngineRelay {
        BlockEngineRelay {
            name: self.block_engine.name.clone(),
            url: self.block_engine.url.trim_end_matches('/').to_string(),
            timeout_seconds: self.block_engine.timeout_seconds,
            status_poll_interval_ms: self.block_engine.status_poll_interval_ms,
            auth_uuid: self.block_engine.auth_uuid.clone(),
            challenge_auth: self.block_engine.challenge_auth,
        }
    }
}

impl BundleConfig {
    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_seconds)
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                commitment: default_commitment(),
            },
            block_engine: BlockEngineConfig {
                name: "tokyo".to_string(),
                url: "https://tokyo.mainnet.block-engine.jito.wtf".to_string(),
                timeout_seconds: default_timeout_seconds(),
                status_poll_interval_ms: default_status_poll_interval_ms(),
                auth_uuid: None,
                challenge_auth: false,
            },
            bundle: BundleConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            transaction_limit: default_transaction_limit(),
            tip_lamports: default_tip_lamports(),
            result_timeout_seconds: default_result_timeout_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
