//! Per-attempt transaction construction

use solana_sdk::{hash::Hash, transaction::VersionedTransaction};
use types::Result;

/// Produces the caller transactions for one bundle attempt.
///
/// Called with each attempt's fresh blockhash, so transactions that embed a
/// blockhash are re-signed instead of expiring partway through a long run.
/// Any closure `Fn(Hash) -> Result<Vec<VersionedTransaction>>` is a builder.
pub trait TransactionBuilder: Send + Sync {
    fn build(&self, recent_blockhash: Hash) -> Result<Vec<VersionedTransaction>>;
}

impl<F> TransactionBuilder for F
where
    F: Fn(Hash) -> Result<Vec<VersionedTransaction>> + Send + Sync,
{
    fn build(&self, recent_blockhash: Hash) -> Result<Vec<VersionedTransaction>> {
        self(recent_blockhash)
    }
}
