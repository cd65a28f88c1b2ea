//! Block engine health monitoring

use crate::client::BlockEngineClient;
use types::{RelayHealth, RelayHealthCheck};

/// Health monitor tracking the status of one block engine
#[derive(Debug)]
pub struct RelayHealthMonitor {
    check: RelayHealthCheck,
}

impl RelayHealthMonitor {
    /// Create a new health monitor
    pub fn new(relay_name: &str) -> Self {
        Self {
            check: RelayHealthCheck::new(relay_name.to_string(), RelayHealth::Unknown),
        }
    }

    /// Probe the block engine once and record the result
    pub async fn probe(&mut self, client: &BlockEngineClient) -> &RelayHealthCheck {
        match client.health_check().await {
            Ok(elapsed) => self.check.mark_healthy(elapsed.as_millis() as u64),
            Err(e) => {
                tracing::warn!(relay = %self.check.name, error = %e, "Block engine health check failed");
                self.check.mark_unhealthy(e.to_string());
            }
        }
        &self.check
    }

    /// Latest recorded health
    pub fn health(&self) -> &RelayHealthCheck {
        &self.check
    }
}
