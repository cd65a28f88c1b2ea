//! Bundle-related types and structures

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use solana_sdk::{hash::Hash, pubkey::Pubkey, transaction::VersionedTransaction};

/// Identifier assigned to a bundle by the block engine
pub type BundleId = String;

/// Hard cap on transactions per bundle enforced by the block engine,
/// tip transaction included
pub const MAX_BUNDLE_TRANSACTIONS: usize = 5;

/// Default number of caller transactions allowed in one bundle
pub const DEFAULT_BUNDLE_TRANSACTION_LIMIT: usize = 3;

/// An ordered set of signed transactions followed by exactly one tip transaction.
///
/// Bundles are built fresh for every submission attempt: the tip transaction
/// embeds a recent blockhash and a tip account that may rotate, so a bundle is
/// never resubmitted once an attempt has ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    /// Caller transactions in submission order, tip transaction last
    transactions: Vec<VersionedTransaction>,
    /// Tip destination chosen for this bundle
    tip_account: Pubkey,
    /// Tip amount in lamports
    tip_lamports: u64,
    /// Blockhash the tip transaction was built against
    blockhash: Hash,
}

/// Outcome event streamed by the block engine for a submitted bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BundleResult {
    /// Bundle landed on chain
    Accepted { bundle_id: BundleId, slot: u64 },
    /// Bundle was dropped by a leader or failed simulation
    Rejected { bundle_id: BundleId, reason: String },
    /// No terminal event yet
    Pending { bundle_id: BundleId },
}

/// Result of a single submit-and-wait attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The awaited bundle was accepted in `slot`
    Accepted { bundle_id: BundleId, slot: u64 },
    /// The deadline elapsed without an acceptance
    TimedOut,
    /// The wait was cancelled externally
    Cancelled,
}

/// Final result returned once a bundle has been accepted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptedBundle {
    /// Identifier of the accepted bundle
    pub bundle_id: BundleId,
    /// Slot the bundle landed in
    pub slot: u64,
    /// Number of submission attempts it took
    pub attempts: u32,
}

impl Bundle {
    /// Create a bundle from caller transactions and an already-signed tip transaction.
    ///
    /// The tip transaction is always placed last. Size limits are enforced by
    /// the assembler before calling this.
    pub fn new(
        mut transactions: Vec<VersionedTransaction>,
        tip_transaction: VersionedTransaction,
        tip_account: Pubkey,
        tip_lamports: u64,
        blockhash: Hash,
    ) -> Self {
        transactions.push(tip_transaction);
        Self {
            transactions,
            tip_account,
            tip_lamports,
            blockhash,
        }
    }

    /// All transactions in bundle order, tip transaction included
    pub fn transactions(&self) -> &[VersionedTransaction] {
        &self.transactions
    }

    /// The trailing tip transaction
    pub fn tip_transaction(&self) -> &VersionedTransaction {
        // `new` always pushes the tip, so the vector is never empty
        &self.transactions[self.transactions.len() - 1]
    }

    /// Total number of transactions, tip included
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// A bundle always holds its tip transaction
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn tip_account(&self) -> &Pubkey {
        &self.tip_account
    }

    pub fn tip_lamports(&self) -> u64 {
        self.tip_lamports
    }

    pub fn blockhash(&self) -> &Hash {
        &self.blockhash
    }

    /// Wire encoding expected by `sendBundle`: bincode-serialized, base64 encoded
    pub fn encode_base64(&self) -> Result<Vec<String>, bincode::Error> {
        self.transactions
            .iter()
            .map(|tx| bincode::serialize(tx).map(|bytes| STANDARD.encode(bytes)))
            .collect()
    }
}

impl BundleResult {
    /// Bundle identifier the event refers to
    pub fn bundle_id(&self) -> &str {
        match self {
            BundleResult::Accepted { bundle_id, .. }
            | BundleResult::Rejected { bundle_id, .. }
            | BundleResult::Pending { bundle_id } => bundle_id,
        }
    }
}
