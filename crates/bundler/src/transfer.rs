//! SOL transfer bundles built from command-line specs

use crate::keys::keypair_from_env;
use engine::TransactionBuilder;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, VersionedTransaction},
};
use solana_system_interface::instruction as system_instruction;
use std::{fmt, str::FromStr};
use types::{BundlerError, Result};

/// Where a transfer sends its lamports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Pubkey(Pubkey),
    /// Public half of the keypair held in this environment variable
    KeyEnv(String),
}

impl Recipient {
    fn resolve(&self) -> Result<Pubkey> {
        match self {
            Recipient::Pubkey(pubkey) => Ok(*pubkey),
            Recipient::KeyEnv(var) => Ok(keypair_from_env(var)?.pubkey()),
        }
    }
}

/// One transfer, written `FROM_ENV:TO:LAMPORTS`.
///
/// `FROM_ENV` names the environment variable holding the sender's secret key.
/// `TO` is either a base58 pubkey or another key variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub from_env: String,
    pub to: Recipient,
    pub lamports: u64,
}

impl FromStr for TransferSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [from_env, to, lamports] = parts.as_slice() else {
            return Err(format!("expected FROM_ENV:TO:LAMPORTS, got '{}'", s));
        };

        if !is_env_name(from_env) {
            return Err(format!("'{}' is not an environment variable name", from_env));
        }

        let to = if let Ok(pubkey) = Pubkey::from_str(to) {
            Recipient::Pubkey(pubkey)
        } else if is_env_name(to) {
            Recipient::KeyEnv(to.to_string())
        } else {
            return Err(format!("'{}' is neither a pubkey nor an environment variable name", to));
        };

        let lamports: u64 = lamports
            .replace('_', "")
            .parse()
            .map_err(|e| format!("invalid lamports '{}': {}", lamports, e))?;
        if lamports == 0 {
            return Err("lamports must be greater than 0".to_string());
        }

        Ok(Self {
            from_env: from_env.to_string(),
            to,
            lamports,
        })
    }
}

impl fmt::Display for TransferSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            Recipient::Pubkey(pubkey) => write!(f, "{}:{}:{}", self.from_env, pubkey, self.lamports),
            Recipient::KeyEnv(var) => write!(f, "{}:{}:{}", self.from_env, var, self.lamports),
        }
    }
}

fn is_env_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

struct ResolvedTransfer {
    from: Keypair,
    to: Pubkey,
    lamports: u64,
}

/// Transfers with their keys loaded, ready to be signed against any blockhash
pub struct TransferPlan {
    transfers: Vec<ResolvedTransfer>,
}

impl TransferPlan {
    /// Load every sender key and recipient named by `specs`
    pub fn resolve(specs: &[TransferSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(BundlerError::Config("At least one transfer is required".to_string()));
        }

        let transfers = specs
            .iter()
            .map(|spec| {
                Ok(ResolvedTransfer {
                    from: keypair_from_env(&spec.from_env)?,
                    to: spec.to.resolve()?,
                    lamports: spec.lamports,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { transfers })
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// One signed transfer per spec, in order
    pub fn sign(&self, recent_blockhash: Hash) -> Vec<VersionedTransaction> {
        self.transfers
            .iter()
            .map(|transfer| {
                tracing::debug!(
                    from = %transfer.from.pubkey(),
                    to = %transfer.to,
                    lamports = transfer.lamports,
                    %recent_blockhash,
                    "Signing transfer"
                );
                let instruction =
                    system_instruction::transfer(&transfer.from.pubkey(), &transfer.to, transfer.lamports);
                Transaction::new_signed_with_payer(
                    &[instruction],
                    Some(&transfer.from.pubkey()),
                    &[&transfer.from],
                    recent_blockhash,
                )
                .into()
            })
            .collect()
    }
}

impl TransactionBuilder for TransferPlan {
    fn build(&self, recent_blockhash: Hash) -> Result<Vec<VersionedTransaction>> {
        Ok(self.sign(recent_blockhash))
    }
}
