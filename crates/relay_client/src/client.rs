//! JSON-RPC client for a single Jito block engine

use crate::{
    auth::Authenticator,
    subscription::ResultPoller,
    traits::{BundleResultStream, RelayClient},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::{
    collections::HashMap,
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::RwLock, time::timeout};
use types::{
    relay::{SendBundleOptions, SendBundleParams},
    BlockEngineRelay, Bundle, BundleId, BundlerError, InflightBundleStatuses, JsonRpcRequest,
    JsonRpcResponse, RelayResult, Result, SubmitError,
};
use uuid::Uuid;

/// Maximum bundle ids accepted by one `getInflightBundleStatuses` call
pub const MAX_STATUS_QUERY_IDS: usize = 5;

/// The block engine only reports bundles submitted within this window
pub const INFLIGHT_LOOKBACK: Duration = Duration::from_secs(300);

const JITO_AUTH_HEADER: &str = "x-jito-auth";

/// HTTP client for one block engine
#[derive(Debug, Clone)]
pub struct BlockEngineClient {
    relay: BlockEngineRelay,
    http_client: Client,
    auth: Option<Arc<Authenticator>>,
    /// Bundles submitted through this client whose result is still open
    inflight: Arc<RwLock<HashMap<BundleId, Instant>>>,
}

impl BlockEngineClient {
    /// Create a new block engine client.
    ///
    /// `auth_keypair` is only used when `relay.challenge_auth` is set: every
    /// request then carries a bearer token obtained through the
    /// challenge/response handshake. `relay.auth_uuid` is sent as the
    /// `x-jito-auth` header regardless.
    pub fn new(relay: BlockEngineRelay, auth_keypair: Option<Keypair>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(relay.timeout_seconds))
            .user_agent(concat!("jito-bundler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BundlerError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let auth = auth_keypair
            .filter(|_| relay.challenge_auth)
            .map(|keypair| Arc::new(Authenticator::new(keypair)));

        Ok(Self {
            relay,
            http_client,
            auth,
            inflight: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Get relay configuration
    pub fn relay(&self) -> &BlockEngineRelay {
        &self.relay
    }

    /// Query the status of recently submitted bundles
    pub async fn get_inflight_bundle_statuses(
        &self,
        bundle_ids: &[BundleId],
    ) -> std::result::Result<InflightBundleStatuses, SubmitError> {
        self.call("getInflightBundleStatuses", serde_json::json!([bundle_ids]))
            .await
    }

    /// Perform health check on the block engine
    pub async fn health_check(&self) -> std::result::Result<Duration, SubmitError> {
        let start = Instant::now();
        self.fetch_tip_accounts().await?;
        Ok(start.elapsed())
    }

    /// Open bundle ids, dropping those older than the block engine lookback
    pub(crate) async fn inflight_ids(&self) -> Vec<BundleId> {
        let mut inflight = self.inflight.write().await;
        inflight.retain(|_, submitted_at| submitted_at.elapsed() < INFLIGHT_LOOKBACK);
        inflight.keys().cloned().collect()
    }

    /// Stop tracking a bundle once its result is final
    pub(crate) async fn forget(&self, bundle_id: &str) {
        self.inflight.write().await.remove(bundle_id);
    }

    fn bundles_url(&self) -> String {
        format!("{}/api/v1/bundles", self.relay.url)
    }

    /// Send one JSON-RPC call and decode its result
    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> std::result::Result<T, SubmitError> {
        let request = JsonRpcRequest::new(self.generate_request_id(), method, params);

        let mut builder = self.http_client.post(self.bundles_url()).json(&request);
        if let Some(uuid) = &self.relay.auth_uuid {
            builder = builder.header(JITO_AUTH_HEADER, uuid);
        }
        if let Some(auth) = &self.auth {
            let token = auth.access_token(&self.http_client, &self.relay).await?;
            builder = builder.bearer_auth(token);
        }

        let response = timeout(Duration::from_secs(self.relay.timeout_seconds), builder.send())
            .await
            .map_err(|_| SubmitError::ConnectionTimeout {
                relay: self.relay.name.clone(),
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::ConnectionTimeout {
                        relay: self.relay.name.clone(),
                    }
                } else {
                    SubmitError::HttpError {
                        relay: self.relay.name.clone(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    }
                }
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SubmitError::RateLimited {
                    relay: self.relay.name.clone(),
                })
            }
            StatusCode::UNAUTHORIZED => {
                if let Some(auth) = &self.auth {
                    auth.invalidate().await;
                }
                return Err(SubmitError::Authentication {
                    relay: self.relay.name.clone(),
                    message: "access token rejected".to_string(),
                });
            }
            status => {
                return Err(SubmitError::HttpError {
                    relay: self.relay.name.clone(),
                    status: status.as_u16(),
                })
            }
        }

        let raw_text = response
            .text()
            .await
            .map_err(|e| SubmitError::InvalidResponse {
                relay: self.relay.name.clone(),
                message: format!("error reading response body: {}", e),
            })?;

        parse_rpc_response(&self.relay.name, method, &raw_text)
    }

    /// Generate a unique request ID
    fn generate_request_id(&self) -> u64 {
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        u64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }
}

#[async_trait]
impl RelayClient for BlockEngineClient {
    async fn fetch_tip_accounts(&self) -> std::result::Result<Vec<Pubkey>, SubmitError> {
        let accounts: Vec<String> = self.call("getTipAccounts", serde_json::json!([])).await?;

        accounts
            .iter()
            .map(|account| {
                Pubkey::from_str(account).map_err(|e| SubmitError::InvalidResponse {
                    relay: self.relay.name.clone(),
                    message: format!("invalid tip account {}: {}", account, e),
                })
            })
            .collect()
    }

    async fn submit(&self, bundle: &Bundle) -> std::result::Result<BundleId, SubmitError> {
        let encoded = bundle
            .encode_base64()
            .map_err(|e| SubmitError::Malformed(format!("failed to encode bundle: {}", e)))?;

        tracing::info!(
            relay = %self.relay.name,
            tx_count = encoded.len(),
            tip_account = %bundle.tip_account(),
            tip_lamports = bundle.tip_lamports(),
            "Submitting bundle to block engine"
        );

        let params: SendBundleParams = (
            encoded,
            SendBundleOptions {
                encoding: "base64".to_string(),
            },
        );
        let bundle_id: BundleId = self.call("sendBundle", params).await?;

        self.inflight
            .write()
            .await
            .insert(bundle_id.clone(), Instant::now());

        tracing::info!(relay = %self.relay.name, bundle_id = %bundle_id, "Bundle submitted");
        Ok(bundle_id)
    }

    async fn subscribe_results(&self) -> std::result::Result<BundleResultStream, SubmitError> {
        let poll_interval = Duration::from_millis(self.relay.status_poll_interval_ms.max(1));
        Ok(ResultPoller::spawn(self.clone(), poll_interval))
    }

    fn name(&self) -> &str {
        &self.relay.name
    }
}

/// Parse a JSON-RPC response with fallbacks for loosely shaped errors
fn parse_rpc_response<T: DeserializeOwned>(
    relay_name: &str,
    method: &str,
    raw_text: &str,
) -> std::result::Result<T, SubmitError> {
    // 1) Try strict schema
    if let Ok(resp) = serde_json::from_str::<JsonRpcResponse<T>>(raw_text) {
        return match resp.result {
            RelayResult::Success { result } => Ok(result),
            RelayResult::Error { error } => Err(rpc_error(relay_name, method, error.code, error.message)),
        };
    }

    // 2) Loose parsing
    let value: Value = serde_json::from_str(raw_text).map_err(|e| SubmitError::InvalidResponse {
        relay: relay_name.to_string(),
        message: format!("invalid JSON response: {} | raw: {}", e, raw_text),
    })?;

    if let Some(result) = value.get("result") {
        return serde_json::from_value(result.clone()).map_err(|e| SubmitError::InvalidResponse {
            relay: relay_name.to_string(),
            message: format!("unexpected {} result: {} | raw: {}", method, e, raw_text),
        });
    }

    // error path
    let (code, message) = if let Some(err) = value.get("error") {
        (
            err.get("code").and_then(|c| c.as_i64()).unwrap_or(0) as i32,
            err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown error").to_string(),
        )
    } else {
        (
            value.get("code").and_then(|c| c.as_i64()).unwrap_or(0) as i32,
            value.get("message").and_then(|m| m.as_str()).unwrap_or("invalid response").to_string(),
        )
    };

    Err(rpc_error(relay_name, method, code, message))
}

/// A JSON-RPC error on `sendBundle` means the relay refused the bundle itself
fn rpc_error(relay_name: &str, method: &str, code: i32, message: String) -> SubmitError {
    if method == "sendBundle" {
        SubmitError::BundleRejected {
            relay: relay_name.to_string(),
            reason: format!("code {}: {}", code, message),
        }
    } else {
        SubmitError::InvalidResponse {
            relay: relay_name.to_string(),
            message: format!("{} failed (code {}): {}", method, code, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use solana_sdk::{hash::Hash, signature::Signer, transaction::Transaction};
    use solana_system_interface::instruction as system_instruction;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn relay(url: String) -> BlockEngineRelay {
        BlockEngineRelay {
            name: "test".to_string(),
            url,
            timeout_seconds: 5,
            status_poll_interval_ms: 50,
            auth_uuid: None,
            challenge_auth: false,
        }
    }

    fn transfer(from: &Keypair, to: &Pubkey, lamports: u64, blockhash: Hash) -> Transaction {
        let ix = system_instruction::transfer(&from.pubkey(), to, lamports);
        Transaction::new_signed_with_payer(&[ix], Some(&from.pubkey()), &[from], blockhash)
    }

    fn bundle() -> Bundle {
        let payer = Keypair::new();
        let blockhash = Hash::new_unique();
        let tip_account = Pubkey::new_unique();
        let work = transfer(&Keypair::new(), &Pubkey::new_unique(), 10, blockhash);
        let tip = transfer(&payer, &tip_account, 5_000, blockhash);
        Bundle::new(vec![work.into()], tip.into(), tip_account, 5_000, blockhash)
    }

    async fn mount_rpc(server: &MockServer, rpc_method: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path("/api/v1/bundles"))
            .and(body_partial_json(serde_json::json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_bundle_submission() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "sendBundle",
            serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": "2id3YC2jK9G5Wo2phDx4gJVAew8DcY5NAojnVuao8rkxwPYPe8cSwE5GzhEgJA2y8fVjDEo6iR6ykBvDxrTQrtpb" }),
        )
        .await;

        let client = BlockEngineClient::new(relay(server.uri()), None).unwrap();
        let bundle = bundle();
        let bundle_id = client.submit(&bundle).await.unwrap();
        assert!(bundle_id.starts_with("2id3YC"));
        assert_eq!(client.inflight_ids().await, vec![bundle_id]);

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["method"], "sendBundle");
        assert_eq!(body["params"][0].as_array().unwrap().len(), 2);
        assert_eq!(body["params"][0], serde_json::json!(bundle.encode_base64().unwrap()));
        assert_eq!(body["params"][1]["encoding"], "base64");
    }

    #[tokio::test]
    async fn test_bundle_submission_error() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "sendBundle",
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "bundle contains an expired blockhash" }
            }),
        )
        .await;

        let client = BlockEngineClient::new(relay(server.uri()), None).unwrap();
        let result = client.submit(&bundle()).await;

        assert!(matches!(result, Err(SubmitError::BundleRejected { .. })));
        assert!(client.inflight_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = BlockEngineClient::new(relay(server.uri()), None).unwrap();
        assert!(matches!(
            client.fetch_tip_accounts().await,
            Err(SubmitError::RateLimited { .. })
        ));
        assert!(matches!(
            client.fetch_tip_accounts().await,
            Err(SubmitError::HttpError { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_tip_accounts() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "getTipAccounts",
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": [
                    "96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5",
                    "HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe"
                ]
            }),
        )
        .await;

        let client = BlockEngineClient::new(relay(server.uri()), None).unwrap();
        let accounts = client.fetch_tip_accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(
            accounts[0],
            Pubkey::from_str("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5").unwrap()
        );
    }

    #[tokio::test]
    async fn test_invalid_tip_account() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "getTipAccounts",
            serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": ["not-a-key"] }),
        )
        .await;

        let client = BlockEngineClient::new(relay(server.uri()), None).unwrap();
        assert!(matches!(
            client.fetch_tip_accounts().await,
            Err(SubmitError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_authenticated_requests_carry_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/challenge"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "challenge": "c" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": { "value": "tok", "expires_at_utc": Utc::now() + chrono::Duration::hours(1) },
                "refresh_token": { "value": "ref", "expires_at_utc": Utc::now() + chrono::Duration::hours(24) }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/bundles"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0", "id": 1, "result": [Keypair::new().pubkey().to_string()]
            })))
            .mount(&server)
            .await;

        let mut relay = relay(server.uri());
        relay.challenge_auth = true;
        let client = BlockEngineClient::new(relay, Some(Keypair::new())).unwrap();
        assert_eq!(client.fetch_tip_accounts().await.unwrap().len(), 1);
        assert_eq!(client.fetch_tip_accounts().await.unwrap().len(), 1);

        // One handshake, two RPC calls
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_keypair_without_challenge_auth_skips_handshake() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "getTipAccounts",
            serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": [Pubkey::new_unique().to_string()] }),
        )
        .await;

        let client = BlockEngineClient::new(relay(server.uri()), Some(Keypair::new())).unwrap();
        assert_eq!(client.fetch_tip_accounts().await.unwrap().len(), 1);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/api/v1/bundles");
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_auth_uuid_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/bundles"))
            .and(header("x-jito-auth", "3f2504e0-4f89-11d3-9a0c-0305e82c3301"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0", "id": 1, "result": [Pubkey::new_unique().to_string()]
            })))
            .mount(&server)
            .await;

        let mut relay = relay(server.uri());
        relay.auth_uuid = Some("3f2504e0-4f89-11d3-9a0c-0305e82c3301".to_string());
        let client = BlockEngineClient::new(relay, None).unwrap();
        assert_eq!(client.fetch_tip_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let server = MockServer::start().await;
        mount_rpc(
            &server,
            "getTipAccounts",
            serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": [] }),
        )
        .await;

        let client = BlockEngineClient::new(relay(server.uri()), None).unwrap();
        assert!(client.health_check().await.is_ok());
    }

    #[test]
    fn test_parse_loose_error() {
        let result: std::result::Result<String, SubmitError> =
            parse_rpc_response("test", "getTipAccounts", r#"{"code": 500, "message": "overloaded"}"#);
        match result {
            Err(SubmitError::InvalidResponse { message, .. }) => assert!(message.contains("overloaded")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
