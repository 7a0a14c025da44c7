//! The process-wide bridge instance and how it is configured.
//!
//! Built once, on the first callback, from (in order) the file named by
//! `ROX_BRIDGE_CONFIG`, `rox_bridge.toml` in the working directory, or the
//! defaults. A bad config file is logged and replaced by the defaults; the
//! host is never made to fail over configuration.

use roxbridge_core::{BridgeConfig, CalcAdapter, SignalClient};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Env var naming the TOML config file.
pub const CONFIG_ENV: &str = "ROX_BRIDGE_CONFIG";
/// Env var holding a `tracing` filter directive; logging is off when unset.
pub const LOG_ENV: &str = "ROX_BRIDGE_LOG";
/// Config file looked up in the working directory when `CONFIG_ENV` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "rox_bridge.toml";

pub type Bridge = CalcAdapter<SignalClient>;

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

/// The bridge, building it on first use.
pub fn bridge() -> &'static Bridge {
    BRIDGE.get_or_init(|| {
        init_logging();
        let config = resolve_config(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            Path::new(DEFAULT_CONFIG_FILE),
        );
        info!(
            url = %config.service_url(),
            timeout_ms = config.request_timeout_ms,
            ttl_ms = config.cache_ttl_ms,
            cooldown_ms = config.failure_cooldown_ms,
            "remote-signal bridge ready"
        );
        CalcAdapter::new(SignalClient::new(&config), &config)
    })
}

/// Pick the effective config. Never fails.
pub fn resolve_config(explicit: Option<PathBuf>, fallback: &Path) -> BridgeConfig {
    let path = match explicit {
        Some(path) => path,
        None if fallback.is_file() => fallback.to_path_buf(),
        None => return BridgeConfig::default(),
    };
    match BridgeConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "falling back to default bridge config");
            BridgeConfig::default()
        }
    }
}

fn init_logging() {
    let Ok(directive) = std::env::var(LOG_ENV) else {
        return;
    };
    // A host may load several plugins that each try to install a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("roxbridge_{}_{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn nothing_configured_means_defaults() {
        let config = resolve_config(None, Path::new("/nonexistent/rox_bridge.toml"));
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn explicit_file_wins() {
        let path = temp_file("explicit.toml", "servicePort = 8765\n");
        let config = resolve_config(Some(path.clone()), Path::new("/nonexistent"));
        assert_eq!(config.service_port, 8765);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn fallback_file_used_when_present() {
        let path = temp_file("fallback.toml", "requestTimeoutMs = 120\n");
        let config = resolve_config(None, &path);
        assert_eq!(config.request_timeout_ms, 120);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let path = temp_file("broken.toml", "servicePort = \"not a port\"\n");
        let config = resolve_config(Some(path.clone()), Path::new("/nonexistent"));
        assert_eq!(config, BridgeConfig::default());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_explicit_file_falls_back_to_defaults() {
        let config = resolve_config(
            Some(PathBuf::from("/nonexistent/explicit.toml")),
            Path::new("/nonexistent"),
        );
        assert_eq!(config, BridgeConfig::default());
    }
}
