//! Tip transaction forging

use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, VersionedTransaction},
};
use solana_system_interface::instruction as system_instruction;

/// Transaction forger for creating tip transactions
#[derive(Debug, Clone, Default)]
pub struct TipTransactionForger;

impl TipTransactionForger {
    /// Create a new tip transaction forger
    pub fn new() -> Self {
        Self
    }

    /// Forge a signed transfer of `lamports` from `payer` to `tip_account`.
    ///
    /// The payer is both fee payer and sole signer.
    pub fn forge_tip_transaction(
        &self,
        payer: &Keypair,
        tip_account: &Pubkey,
        lamports: u64,
        recent_blockhash: Hash,
    ) -> VersionedTransaction {
        let instruction = system_instruction::transfer(&payer.pubkey(), tip_account, lamports);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&payer.pubkey()),
            &[payer],
            recent_blockhash,
        );
        transaction.into()
    }
}
