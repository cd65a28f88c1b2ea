//! Keypair loading from base58-encoded environment variables

use solana_sdk::signature::Keypair;
use std::env;
use types::{BundlerError, Result};

/// Keypair used to authenticate with the block engine
pub const AUTH_KEY_ENV: &str = "JITO_AUTH_PRIV_KEY";

/// Keypair that pays the bundle tip
pub const TIP_PAYER_ENV: &str = "WALLET_2_PAY_JITO_FEES";

/// Decode a base58 secret key (64 bytes: secret followed by public half)
pub fn keypair_from_base58(encoded: &str) -> Result<Keypair> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| BundlerError::Key(format!("Invalid base58 secret key: {}", e)))?;

    Keypair::from_bytes(&bytes)
        .map_err(|e| BundlerError::Key(format!("Invalid secret key bytes: {}", e)))
}

/// Load a required keypair from `var`
pub fn keypair_from_env(var: &str) -> Result<Keypair> {
    let encoded = env::var(var)
        .map_err(|_| BundlerError::Key(format!("Environment variable {} is not set", var)))?;

    keypair_from_base58(&encoded)
        .map_err(|e| BundlerError::Key(format!("{}: {}", var, e)))
}

/// Load a keypair from `var` if it is set and non-empty
pub fn optional_keypair_from_env(var: &str) -> Result<Option<Keypair>> {
    match env::var(var) {
        Ok(encoded) if !encoded.trim().is_empty() => keypair_from_env(var).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    fn encoded(keypair: &Keypair) -> String {
        bs58::encode(keypair.to_bytes()).into_string()
    }

    #[test]
    fn test_keypair_from_base58() {
        let keypair = Keypair::new();
        let decoded = keypair_from_base58(&format!(" {}\n", encoded(&keypair))).unwrap();
        assert_eq!(decoded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(keypair_from_base58("not-base58!"), Err(BundlerError::Key(_))));
        // Valid base58 but only 32 bytes
        let short = bs58::encode([7u8; 32]).into_string();
        assert!(matches!(keypair_from_base58(&short), Err(BundlerError::Key(_))));
    }

    #[test]
    fn test_keypair_from_env() {
        let keypair = Keypair::new();
        env::set_var("BUNDLER_TEST_KEYS_PRESENT", encoded(&keypair));

        let loaded = keypair_from_env("BUNDLER_TEST_KEYS_PRESENT").unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());

        let err = keypair_from_env("BUNDLER_TEST_KEYS_MISSING").unwrap_err();
        assert!(err.to_string().contains("BUNDLER_TEST_KEYS_MISSING"));
    }

    #[test]
    fn test_optional_keypair_from_env() {
        env::set_var("BUNDLER_TEST_KEYS_EMPTY", "  ");
        assert!(optional_keypair_from_env("BUNDLER_TEST_KEYS_EMPTY").unwrap().is_none());
        assert!(optional_keypair_from_env("BUNDLER_TEST_KEYS_UNSET").unwrap().is_none());

        env::set_var("BUNDLER_TEST_KEYS_GARBAGE", "zzz");
        assert!(optional_keypair_from_env("BUNDLER_TEST_KEYS_GARBAGE").is_err());
    }
}
