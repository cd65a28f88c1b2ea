//! Shared types for the bundle submission system
//!
//! This crate contains the domain types shared by the relay client,
//! the submission engine and the bundler binary.

pub mod bundle;
pub mod error;
pub mod relay;
pub mod utils;

// Re-export commonly used types
pub use bundle::*;
pub use error::{BundlerError, CapacityError, ConfigError, EngineError, Result, SubmitError};
pub use relay::{
    AuthToken, BlockEngineRelay, InflightBundleStatus, InflightBundleStatuses, InflightStatus,
    JsonRpcRequest, JsonRpcResponse, RelayError, RelayHealth, RelayHealthCheck, RelayResult,
};
