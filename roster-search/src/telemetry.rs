//! Tracing initialisation.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either
//! the human readable or the JSON formatter.

use roster_core::{RosterError, RosterResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "roster_search=info,roster_storage=info,warn";

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives (e.g. "roster_storage=debug,info")
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Read `ROSTER_LOG` and `ROSTER_LOG_FORMAT` ("json" or anything else).
    pub fn from_env() -> Self {
        let filter = std::env::var("ROSTER_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = match std::env::var("ROSTER_LOG_FORMAT") {
            Ok(s) if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        Self { filter, format }
    }
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> RosterResult<()> {
    let env_filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| RosterError::Telemetry(format!("Invalid log filter {:?}: {}", config.filter, e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };
    result.map_err(|e| RosterError::Telemetry(format!("Failed to init subscriber: {}", e)))?;

    tracing::debug!(filter = %config.filter, format = ?config.format, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_telemetry_config_from_env() {
        let _log = EnvVarGuard::set("ROSTER_LOG", Some("roster_storage=debug"));
        let _format = EnvVarGuard::set("ROSTER_LOG_FORMAT", Some("JSON"));
        let config = TelemetryConfig::from_env();
        assert_eq!(config.filter, "roster_storage=debug");
        assert_eq!(config.format, LogFormat::Json);

        let _log = EnvVarGuard::set("ROSTER_LOG", Some("  "));
        let _format = EnvVarGuard::set("ROSTER_LOG_FORMAT", None);
        let config = TelemetryConfig::from_env();
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            filter: "roster_search=loudest".to_string(),
            format: LogFormat::Pretty,
        };
        assert!(matches!(init_tracing(&config), Err(RosterError::Telemetry(_))));
    }
}
