//! Relay-related types and structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Block engine endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEngineRelay {
    /// Human readable name, used in logs and errors
    pub name: String,
    /// Base URL of the block engine (scheme and host)
    pub url: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Interval between bundle status polls in milliseconds
    pub status_poll_interval_ms: u64,
    /// Sent as the `x-jito-auth` header on every JSON-RPC request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_uuid: Option<String>,
    /// Run the keypair challenge/response handshake before JSON-RPC calls.
    ///
    /// Relay-specific: needs `<url>/api/v1/auth/challenge` and
    /// `<url>/api/v1/auth/tokens`. The public Jito block engines authenticate
    /// keypairs over gRPC only and do not serve these routes.
    #[serde(default)]
    pub challenge_auth: bool,
}

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<P> {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Request ID
    pub id: u64,
    /// Method name
    pub method: String,
    /// Request parameters
    pub params: P,
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Request ID
    pub id: u64,
    /// Result or error
    #[serde(flatten)]
    pub result: RelayResult<T>,
}

/// Relay response result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayResult<T> {
    /// Successful response
    Success { result: T },
    /// Error response
    Error { error: RelayError },
}

/// Relay error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<serde_json::Value>,
}

/// Encoding options passed alongside `sendBundle` transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendBundleOptions {
    pub encoding: String,
}

/// `sendBundle` parameters: encoded transactions plus encoding options
pub type SendBundleParams = (Vec<String>, SendBundleOptions);

/// Slot context returned with status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcContext {
    pub slot: u64,
}

/// `getInflightBundleStatuses` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflightBundleStatuses {
    pub context: RpcContext,
    pub value: Vec<InflightBundleStatus>,
}

/// Status of one recently submitted bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflightBundleStatus {
    /// Bundle identifier
    pub bundle_id: String,
    /// Current status
    pub status: InflightStatus,
    /// Slot the bundle landed in, if it landed
    pub landed_slot: Option<u64>,
}

/// Bundle status as reported by the block engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InflightStatus {
    /// Unknown to the block engine within its lookback window
    Invalid,
    /// Not yet landed or failed
    Pending,
    /// All regions marked the bundle as failed
    Failed,
    /// Bundle landed on chain
    Landed,
}

/// Request for an authentication challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthChallengeRequest {
    pub role: String,
    pub pubkey: String,
}

/// Challenge issued by the block engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthChallengeResponse {
    pub challenge: String,
}

/// Signed challenge exchanged for tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokensRequest {
    pub client_pubkey: String,
    /// `"<pubkey>-<challenge>"`
    pub challenge: String,
    /// Base58 signature of `challenge`
    pub signed_challenge: String,
}

/// Tokens granted after a successful handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokensResponse {
    pub access_token: AuthToken,
    pub refresh_token: AuthToken,
}

/// A bearer token with its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub value: String,
    pub expires_at_utc: DateTime<Utc>,
}

/// Health status of a relay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayHealth {
    /// Relay is healthy and responding
    Healthy,
    /// Relay is not responding
    Unhealthy,
    /// Relay health is unknown
    #[default]
    Unknown,
}

/// Relay health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayHealthCheck {
    /// Relay name
    pub name: String,
    /// Current health status
    pub status: RelayHealth,
    /// Response time in milliseconds
    pub response_time_ms: Option<u64>,
    /// Last check timestamp
    pub last_check: DateTime<Utc>,
    /// Error message if unhealthy
    pub error_message: Option<String>,
    /// Number of consecutive failures
    pub consecutive_failures: u32,
}

impl<P> JsonRpcRequest<P> {
    /// Create a new JSON-RPC 2.0 request
    pub fn new(id: u64, method: &str, params: P) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

impl InflightStatus {
    /// Whether the status should be reported as a rejection
    pub fn is_rejection(&self) -> bool {
        matches!(self, InflightStatus::Failed | InflightStatus::Invalid)
    }
}

impl AuthToken {
    /// Whether the token expires within `margin_seconds`
    pub fn expires_within(&self, margin_seconds: i64) -> bool {
        self.expires_at_utc - chrono::Duration::seconds(margin_seconds) <= Utc::now()
    }
}

impl RelayHealthCheck {
    /// Create a new health check result
    pub fn new(name: String, status: RelayHealth) -> Self {
        Self {
            name,
            status,
            response_time_ms: None,
            last_check: Utc::now(),
            error_message: None,
            consecutive_failures: 0,
        }
    }

    /// Mark as healthy with response time
    pub fn mark_healthy(&mut self, response_time_ms: u64) {
        self.status = RelayHealth::Healthy;
        self.response_time_ms = Some(response_time_ms);
        self.last_check = Utc::now();
        self.error_message = None;
        self.consecutive_failures = 0;
    }

    /// Mark as unhealthy with error message
    pub fn mark_unhealthy(&mut self, error_message: String) {
        self.status = RelayHealth::Unhealthy;
        self.response_time_ms = None;
        self.last_check = Utc::now();
        self.error_message = Some(error_message);
        self.consecutive_failures += 1;
    }
}

impl Default for BlockEngineRelay {
    fn default() -> Self {
        Self {
            name: "tokyo".to_string(),
            url: "https://tokyo.mainnet.block-engine.jito.wtf".to_string(),
            timeout_seconds: 10,
            status_poll_interval_ms: 1_000,
            auth_uuid: None,
            challenge_auth: false,
        }
    }
}
