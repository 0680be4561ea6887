//! Diagnostic logging setup
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber once at startup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;
use crate::error::AuditError;

/// Install a stderr subscriber
///
/// Uses `RUST_LOG` if set, otherwise the configured `level`. Fails if a
/// global subscriber is already installed.
pub fn init_logging(level: LogLevel) -> Result<(), AuditError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| AuditError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels_are_valid_filters() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert!(
                EnvFilter::try_new(level.as_str()).is_ok(),
                "{} should be a valid filter",
                level.as_str()
            );
        }
    }
}
