//! Error types for the bundle submission system

use thiserror::Error;

/// Main error type for the bundler system
#[derive(Error, Debug)]
pub enum BundlerError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bundle does not fit the block engine's limits
    #[error("Bundle capacity error: {0}")]
    Capacity(String),

    /// Relay communication errors
    #[error("Relay communication error: {relay}: {message}")]
    RelayCommunication { relay: String, message: String },

    /// Key material could not be loaded
    #[error("Key error: {0}")]
    Key(String),

    /// Submission engine errors
    #[error("Engine error: {0}")]
    Engine(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// External service errors
    #[error("External service error: {service}: {message}")]
    ExternalService { service: String, message: String },
}

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Bundle exceeds what the block engine will accept.
///
/// This is always a caller bug and is never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// More caller transactions than the configured limit
    #[error("Bundle has {count} transactions, limit is {limit}")]
    TooManyTransactions { count: usize, limit: usize },

    /// A single transaction does not fit in a packet
    #[error("Transaction {index} is {size} bytes, maximum is {max}")]
    OversizedTransaction { index: usize, size: usize, max: usize },
}

/// Relay submission and transport errors
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Connection timeout
    #[error("Connection timeout to relay: {relay}")]
    ConnectionTimeout { relay: String },

    /// HTTP error
    #[error("HTTP error from relay {relay}: {status}")]
    HttpError { relay: String, status: u16 },

    /// Invalid response format
    #[error("Invalid response format from relay {relay}: {message}")]
    InvalidResponse { relay: String, message: String },

    /// Bundle rejected by relay at submission time
    #[error("Bundle rejected by relay {relay}: {reason}")]
    BundleRejected { relay: String, reason: String },

    /// Bundle could not be encoded for the wire
    #[error("Malformed bundle: {0}")]
    Malformed(String),

    /// Rate limited by relay
    #[error("Rate limited by relay: {relay}")]
    RateLimited { relay: String },

    /// Authentication handshake failed
    #[error("Authentication with relay {relay} failed: {message}")]
    Authentication { relay: String, message: String },
}

/// Errors that end a submission run
#[derive(Error, Debug)]
pub enum EngineError {
    /// The bundle can never be accepted as built
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// The caller's transactions could not be built for an attempt
    #[error("Failed to build bundle transactions: {0}")]
    Build(String),

    /// A configured attempt ceiling was reached
    #[error("Bundle not accepted after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },

    /// The run was cancelled externally
    #[error("Bundle submission cancelled")]
    Cancelled,
}

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

// Conversion implementations for common error types

impl From<CapacityError> for BundlerError {
    fn from(err: CapacityError) -> Self {
        BundlerError::Capacity(err.to_string())
    }
}

impl From<SubmitError> for BundlerError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::ConnectionTimeout { relay } => BundlerError::RelayCommunication {
                relay,
                message: "Connection timeout".to_string(),
            },
            SubmitError::HttpError { relay, status } => BundlerError::RelayCommunication {
                relay,
                message: format!("HTTP error: {}", status),
            },
            SubmitError::InvalidResponse { relay, message } => {
                BundlerError::RelayCommunication { relay, message }
            }
            SubmitError::BundleRejected { relay, reason } => BundlerError::RelayCommunication {
                relay,
                message: format!("Bundle rejected: {}", reason),
            },
            SubmitError::Malformed(message) => BundlerError::Internal(message),
            SubmitError::RateLimited { relay } => BundlerError::RelayCommunication {
                relay,
                message: "Rate limited".to_string(),
            },
            SubmitError::Authentication { relay, message } => BundlerError::RelayCommunication {
                relay,
                message: format!("Authentication failed: {}", message),
            },
        }
    }
}

impl From<EngineError> for BundlerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Capacity(err) => err.into(),
            other => BundlerError::Engine(other.to_string()),
        }
    }
}

impl From<ConfigError> for BundlerError {
    fn from(err: ConfigError) -> Self {
        BundlerError::Config(err.to_string())
    }
}
