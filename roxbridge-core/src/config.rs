//! Startup configuration for the bridge.
//!
//! Stored as TOML. Option names match the recognized startup options
//! (`serviceHost`, `servicePort`, ...); anything missing takes its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Callers in the host process log these and fall back
/// to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the bridge needs to know at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub service_host: String,
    pub service_port: u16,
    pub service_path: String,
    /// Hard bound on connect + send + receive.
    pub request_timeout_ms: u64,
    /// How long a successful signal is reused.
    pub cache_ttl_ms: u64,
    /// How long a failure suppresses new requests for the same key.
    pub failure_cooldown_ms: u64,
    /// Price quantization for cache keys; 0 keys on the exact value.
    pub price_step: f64,
    /// Volume quantization for cache keys; 0 keys on the exact value.
    pub volume_step: f64,
    /// Code sent when the host does not say which instrument is evaluated.
    pub unknown_code: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            service_host: "127.0.0.1".into(),
            service_port: 8000,
            service_path: "/api/tdx/calculate".into(),
            request_timeout_ms: 300,
            cache_ttl_ms: 1_000,
            failure_cooldown_ms: 500,
            price_step: 0.01,
            volume_step: 0.01,
            unknown_code: "UNKNOWN".into(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML (used by the CLI's `config` command).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(format!("serialize: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_host.trim().is_empty() {
            return Err(ConfigError::Invalid("serviceHost is empty".into()));
        }
        if !self.service_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "servicePath must start with '/': {:?}",
                self.service_path
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("requestTimeoutMs must be > 0".into()));
        }
        if self.failure_cooldown_ms > self.cache_ttl_ms {
            return Err(ConfigError::Invalid(format!(
                "failureCooldownMs ({}) must not exceed cacheTtlMs ({})",
                self.failure_cooldown_ms, self.cache_ttl_ms
            )));
        }
        for (name, step) in [("priceStep", self.price_step), ("volumeStep", self.volume_step)] {
            if !step.is_finite() || step < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite non-negative number, got {step}"
                )));
            }
        }
        Ok(())
    }

    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.service_host, self.service_port, self.service_path
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let config = BridgeConfig::default();
        assert_eq!(config.service_url(), "http://127.0.0.1:8000/api/tdx/calculate");
        assert_eq!(config.request_timeout(), Duration::from_millis(300));
        assert!(config.failure_cooldown() < config.cache_ttl());
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BridgeConfig::from_toml(
            r#"
servicePort = 9100
requestTimeoutMs = 150
"#,
        )
        .unwrap();
        assert_eq!(config.service_port, 9100);
        assert_eq!(config.request_timeout_ms, 150);
        assert_eq!(config.service_host, "127.0.0.1");
        assert_eq!(config.cache_ttl_ms, 1_000);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = BridgeConfig::from_toml("service_port = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn cooldown_longer_than_ttl_is_invalid() {
        let err = BridgeConfig::from_toml("cacheTtlMs = 100\nfailureCooldownMs = 200").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        assert!(BridgeConfig::from_toml("requestTimeoutMs = 0").is_err());
    }

    #[test]
    fn zero_lifetimes_are_valid() {
        let config = BridgeConfig::from_toml("cacheTtlMs = 0\nfailureCooldownMs = 0").unwrap();
        assert_eq!(config.cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn relative_path_is_invalid() {
        assert!(BridgeConfig::from_toml(r#"servicePath = "api/x""#).is_err());
    }

    #[test]
    fn negative_step_is_invalid() {
        assert!(BridgeConfig::from_toml("priceStep = -0.5").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let config = BridgeConfig {
            service_port: 8123,
            price_step: 0.0,
            ..BridgeConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("servicePort = 8123"));
        assert_eq!(BridgeConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = BridgeConfig::from_file(Path::new("/nonexistent/rox_bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
