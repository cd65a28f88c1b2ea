//! Recent blockhash sources

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
};
use std::{str::FromStr, sync::Arc};
use types::{BundlerError, ConfigError, Result};

/// Provides a fresh blockhash for every bundle attempt
#[async_trait]
pub trait BlockhashSource: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash>;
}

#[async_trait]
impl<T: BlockhashSource + ?Sized> BlockhashSource for Arc<T> {
    async fn latest_blockhash(&self) -> Result<Hash> {
        (**self).latest_blockhash().await
    }
}

/// Blockhash source backed by a Solana JSON-RPC node
pub struct RpcBlockhashSource {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcBlockhashSource {
    /// `commitment` is one of processed, confirmed or finalized
    pub fn new(rpc_url: String, commitment: &str) -> Result<Self> {
        let level = CommitmentLevel::from_str(commitment).map_err(|_| ConfigError::InvalidValue {
            field: "network.commitment".to_string(),
            value: commitment.to_string(),
        })?;
        let commitment = CommitmentConfig { commitment: level };

        Ok(Self {
            client: RpcClient::new_with_commitment(rpc_url, commitment),
            commitment,
        })
    }
}

#[async_trait]
impl BlockhashSource for RpcBlockhashSource {
    async fn latest_blockhash(&self) -> Result<Hash> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| BundlerError::ExternalService {
                service: "solana-rpc".to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(%blockhash, last_valid_block_height, "Fetched latest blockhash");
        Ok(blockhash)
    }
}
