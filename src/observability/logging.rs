//! # Logging
//!
//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise the filter is built from `LOG_LEVEL`
//! for this crate, keeping dependencies at `warn`.

use crate::config::{ControllerConfig, LogFormat};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(log_level: &str) -> String {
    let level = match log_level.to_ascii_lowercase().as_str() {
        level @ ("error" | "warn" | "info" | "debug" | "trace") => level.to_string(),
        _ => "info".to_string(),
    };
    format!("warn,app_secrets_controller={level}")
}

/// Install the global tracing subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &ControllerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let result = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_uses_log_level() {
        assert_eq!(default_directive("DEBUG"), "warn,app_secrets_controller=debug");
        assert_eq!(default_directive("info"), "warn,app_secrets_controller=info");
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        assert_eq!(default_directive("loud"), "warn,app_secrets_controller=info");
    }
}
