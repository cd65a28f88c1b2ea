//! Tip/bundle assembly

use crate::forger::TipTransactionForger;
use solana_sdk::{
    hash::Hash, packet::PACKET_DATA_SIZE, pubkey::Pubkey, signature::Keypair,
    transaction::VersionedTransaction,
};
use types::{Bundle, CapacityError};

/// Builds bundles of caller transactions plus one trailing tip transaction
#[derive(Debug, Clone)]
pub struct BundleAssembler {
    transaction_limit: usize,
    forger: TipTransactionForger,
}

impl BundleAssembler {
    /// `transaction_limit` bounds caller transactions; the tip is not counted
    pub fn new(transaction_limit: usize) -> Self {
        Self {
            transaction_limit,
            forger: TipTransactionForger::new(),
        }
    }

    pub fn transaction_limit(&self) -> usize {
        self.transaction_limit
    }

    /// Reject transaction sets that can never form a valid bundle
    pub fn check_capacity(&self, transactions: &[VersionedTransaction]) -> Result<(), CapacityError> {
        if transactions.len() > self.transaction_limit {
            return Err(CapacityError::TooManyTransactions {
                count: transactions.len(),
                limit: self.transaction_limit,
            });
        }

        for (index, tx) in transactions.iter().enumerate() {
            let size = bincode::serialized_size(tx)
                .map(|size| size as usize)
                .unwrap_or(usize::MAX);
            if size > PACKET_DATA_SIZE {
                return Err(CapacityError::OversizedTransaction {
                    index,
                    size,
                    max: PACKET_DATA_SIZE,
                });
            }
        }

        Ok(())
    }

    /// Assemble a bundle, appending a tip transaction signed by `tip_payer`.
    ///
    /// Pure construction: no network I/O happens here.
    pub fn assemble(
        &self,
        transactions: Vec<VersionedTransaction>,
        tip_payer: &Keypair,
        tip_lamports: u64,
        tip_account: Pubkey,
        recent_blockhash: Hash,
    ) -> Result<Bundle, CapacityError> {
        self.check_capacity(&transactions)?;

        let tip = self
            .forger
            .forge_tip_transaction(tip_payer, &tip_account, tip_lamports, recent_blockhash);

        Ok(Bundle::new(
            transactions,
            tip,
            tip_account,
            tip_lamports,
            recent_blockhash,
        ))
    }
}
