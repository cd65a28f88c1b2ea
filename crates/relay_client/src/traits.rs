//! Relay client traits and interfaces

use async_trait::async_trait;
use futures::stream::BoxStream;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use types::{Bundle, BundleId, BundleResult, SubmitError};

/// Stream of outcome events for bundles submitted through one client.
///
/// Events are not filtered per bundle; consumers correlate by bundle id.
pub type BundleResultStream = BoxStream<'static, BundleResult>;

/// A connection to one bundle relay
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Currently valid tip destinations. Never cached: accounts may rotate.
    async fn fetch_tip_accounts(&self) -> Result<Vec<Pubkey>, SubmitError>;

    /// Send an assembled bundle, returning the relay-assigned id
    async fn submit(&self, bundle: &Bundle) -> Result<BundleId, SubmitError>;

    /// Subscribe to results for bundles submitted through this client.
    ///
    /// Subscribe before submitting, otherwise an early result can be missed.
    async fn subscribe_results(&self) -> Result<BundleResultStream, SubmitError>;

    /// Name of the relay, used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: RelayClient + ?Sized> RelayClient for Arc<T> {
    async fn fetch_tip_accounts(&self) -> Result<Vec<Pubkey>, SubmitError> {
        (**self).fetch_tip_accounts().await
    }

    async fn submit(&self, bundle: &Bundle) -> Result<BundleId, SubmitError> {
        (**self).submit(bundle).await
    }

    async fn subscribe_results(&self) -> Result<BundleResultStream, SubmitError> {
        (**self).subscribe_results().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
