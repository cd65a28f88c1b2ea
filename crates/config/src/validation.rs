//! Configuration validation utilities

use crate::schema::Config;
use types::MAX_BUNDLE_TRANSACTIONS;

/// Smallest tip the block engine will consider
pub const MIN_TIP_LAMPORTS: u64 = 1_000;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_network(config, &mut report);
        Self::validate_block_engine(config, &mut report);
        Self::validate_bundle(config, &mut report);
        Self::validate_retry(config, &mut report);
        Self::validate_logging(config, &mut report);

        report
    }

    fn validate_network(config: &Config, report: &mut ValidationReport) {
        let rpc_url = &config.network.rpc_url;
        if rpc_url.is_empty() {
            report.add_error("network.rpc_url", "RPC URL cannot be empty");
        } else if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            report.add_error("network.rpc_url", "RPC URL must start with http:// or https://");
        }

        let valid_commitments = ["processed", "confirmed", "finalized"];
        if !valid_commitments.contains(&config.network.commitment.as_str()) {
            report.add_error(
                "network.commitment",
                &format!("Invalid commitment: {}. Valid levels: {:?}", config.network.commitment, valid_commitments),
            );
        } else if config.network.commitment == "processed" {
            report.add_warning("network.commitment", "Processed blockhashes may belong to a dropped fork");
        }
    }

    fn validate_block_engine(config: &Config, report: &mut ValidationReport) {
        let engine = &config.block_engine;
        if engine.name.is_empty() {
            report.add_error("block_engine.name", "Block engine name cannot be empty");
        }

        if engine.url.is_empty() {
            report.add_error("block_engine.url", "Block engine URL cannot be empty");
        } else if !engine.url.starts_with("http://") && !engine.url.starts_with("https://") {
            report.add_error("block_engine.url", &format!("Invalid block engine URL format: {}", engine.url));
        } else if !engine.url.starts_with("https://") {
            report.add_warning("block_engine.url", "Block engine URL should use HTTPS");
        }

        if engine.timeout_seconds == 0 {
            report.add_error("block_engine.timeout_seconds", "Timeout cannot be zero");
        } else if engine.timeout_seconds > 60 {
            report.add_warning("block_engine.timeout_seconds", &format!("Timeout is very high ({}s)", engine.timeout_seconds));
        }

        if engine.status_poll_interval_ms == 0 {
            report.add_error("block_engine.status_poll_interval_ms", "Status poll interval cannot be zero");
        } else if engine.status_poll_interval_ms < 200 {
            report.add_warning("block_engine.status_poll_interval_ms", "Status poll interval is very low, the block engine may rate limit");
        }

        if engine.auth_uuid.as_deref().is_some_and(|uuid| uuid.trim().is_empty()) {
            report.add_error("block_engine.auth_uuid", "Auth UUID cannot be empty");
        }

        if engine.challenge_auth {
            report.add_warning(
                "block_engine.challenge_auth",
                "Challenge auth needs a relay serving /api/v1/auth/*; public Jito block engines do not",
            );
        }
    }

    fn validate_bundle(config: &Config, report: &mut ValidationReport) {
        let bundle = &config.bundle;
        if bundle.transaction_limit == 0 {
            report.add_error("bundle.transaction_limit", "Transaction limit cannot be zero");
        } else if bundle.transaction_limit + 1 > MAX_BUNDLE_TRANSACTIONS {
            report.add_error(
                "bundle.transaction_limit",
                &format!(
                    "Transaction limit {} plus the tip exceeds the block engine maximum of {}",
                    bundle.transaction_limit, MAX_BUNDLE_TRANSACTIONS
                ),
            );
        }

        if bundle.tip_lamports == 0 {
            report.add_error("bundle.tip_lamports", "Tip cannot be zero");
        } else if bundle.tip_lamports < MIN_TIP_LAMPORTS {
            report.add_warning(
                "bundle.tip_lamports",
                &format!("Tip is below the block engine minimum of {} lamports", MIN_TIP_LAMPORTS),
            );
        }

        if bundle.result_timeout_seconds == 0 {
            report.add_error("bundle.result_timeout_seconds", "Result timeout cannot be zero");
        } else if bundle.result_timeout_seconds > 120 {
            report.add_warning("bundle.result_timeout_seconds", "Result timeout is longer than a blockhash stays valid");
        }
    }

    fn validate_retry(config: &Config, report: &mut ValidationReport) {
        match config.retry.max_attempts {
            Some(0) => report.add_error("retry.max_attempts", "Max attempts cannot be zero"),
            Some(_) => report.add_warning("retry.max_attempts", "Attempt ceiling set, bundles may be abandoned before landing"),
            None => {}
        }

        if config.retry.backoff_ms > 60_000 {
            report.add_warning("retry.backoff_ms", "Backoff is longer than a minute");
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error("logging.level", &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error("logging.format", &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats));
        }

        if config.logging.level == "trace" || config.logging.level == "debug" {
            report.add_warning("logging.level", "Debug/trace logging may impact performance in production");
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let report = ConfigValidator::validate(&Config::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_transaction_limit_leaves_room_for_tip() {
        let mut config = Config::default();
        config.bundle.transaction_limit = MAX_BUNDLE_TRANSACTIONS;
        let report = ConfigValidator::validate(&config);
        assert!(report.errors.iter().any(|e| e.field == "bundle.transaction_limit"));

        config.bundle.transaction_limit = MAX_BUNDLE_TRANSACTIONS - 1;
        assert!(ConfigValidator::validate(&config).is_valid());
    }

    #[test]
    fn test_low_tip_is_a_warning() {
        let mut config = Config::default();
        config.bundle.tip_lamports = 500;
        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "bundle.tip_lamports"));

        config.bundle.tip_lamports = 0;
        assert!(!ConfigValidator::validate(&config).is_valid());
    }

    #[test]
    fn test_retry_ceiling() {
        let mut config = Config::default();
        config.retry.max_attempts = Some(0);
        assert!(!ConfigValidator::validate(&config).is_valid());

        config.retry.max_attempts = Some(5);
        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_block_engine_auth_settings() {
        let mut config = Config::default();
        config.block_engine.auth_uuid = Some(" ".to_string());
        assert!(!ConfigValidator::validate(&config).is_valid());

        config.block_engine.auth_uuid = Some("3f2504e0-4f89-11d3-9a0c-0305e82c3301".to_string());
        config.block_engine.challenge_auth = true;
        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "block_engine.challenge_auth"));
    }

    #[test]
    fn test_plain_http_block_engine_warns() {
        let mut config = Config::default();
        config.block_engine.url = "http://localhost:1234".to_string();
        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "block_engine.url"));
        assert_eq!(report.summary(), "Validation: 0 errors, 1 warnings");
    }
}
