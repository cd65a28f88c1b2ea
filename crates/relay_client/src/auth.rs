//! Keypair challenge/response authentication against the block engine

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use tokio::sync::RwLock;
use types::{
    relay::{AuthChallengeRequest, AuthChallengeResponse, AuthTokensRequest, AuthTokensResponse},
    AuthToken, BlockEngineRelay, SubmitError,
};

/// Tokens are re-acquired when they expire within this many seconds
const REFRESH_MARGIN_SECONDS: i64 = 60;

const SEARCHER_ROLE: &str = "searcher";

/// Holds the auth keypair and the current access token
#[derive(Debug)]
pub struct Authenticator {
    keypair: Keypair,
    token: RwLock<Option<AuthToken>>,
}

impl Authenticator {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            token: RwLock::new(None),
        }
    }

    /// Public key the block engine knows this searcher by
    pub fn pubkey(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    /// Return a valid access token, performing the handshake if needed
    pub async fn access_token(
        &self,
        http_client: &Client,
        relay: &BlockEngineRelay,
    ) -> Result<String, SubmitError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if !token.expires_within(REFRESH_MARGIN_SECONDS) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref() {
            if !token.expires_within(REFRESH_MARGIN_SECONDS) {
                return Ok(token.value.clone());
            }
        }

        let token = self.handshake(http_client, relay).await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next request authenticates again
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    async fn handshake(
        &self,
        http_client: &Client,
        relay: &BlockEngineRelay,
    ) -> Result<AuthToken, SubmitError> {
        let pubkey = self.pubkey();
        tracing::debug!(relay = %relay.name, pubkey = %pubkey, "Requesting auth challenge");

        let challenge: AuthChallengeResponse = post_json(
            http_client,
            relay,
            &format!("{}/api/v1/auth/challenge", relay.url),
            &AuthChallengeRequest {
                role: SEARCHER_ROLE.to_string(),
                pubkey: pubkey.clone(),
            },
        )
        .await?;

        let challenge = format!("{}-{}", pubkey, challenge.challenge);
        let signature = self.keypair.sign_message(challenge.as_bytes());

        let tokens: AuthTokensResponse = post_json(
            http_client,
            relay,
            &format!("{}/api/v1/auth/tokens", relay.url),
            &AuthTokensRequest {
                client_pubkey: pubkey,
                challenge,
                signed_challenge: signature.to_string(),
            },
        )
        .await?;

        tracing::info!(
            relay = %relay.name,
            expires_at = %tokens.access_token.expires_at_utc,
            "Authenticated with block engine"
        );

        Ok(tokens.access_token)
    }
}

async fn post_json<B: Serialize, T: DeserializeOwned>(
    http_client: &Client,
    relay: &BlockEngineRelay,
    url: &str,
    body: &B,
) -> Result<T, SubmitError> {
    let auth_error = |message: String| SubmitError::Authentication {
        relay: relay.name.clone(),
        message,
    };

    let response = http_client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| auth_error(format!("request failed: {}", e)))?;

    match response.status() {
        status if status.is_success() => {}
        StatusCode::TOO_MANY_REQUESTS => {
            return Err(SubmitError::RateLimited {
                relay: relay.name.clone(),
            })
        }
        status => return Err(auth_error(format!("HTTP {}", status.as_u16()))),
    }

    response
        .json::<T>()
        .await
        .map_err(|e| auth_error(format!("invalid response: {}", e)))
}
