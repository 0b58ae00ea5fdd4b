//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; binaries call [`init`] once.
//! `RUST_LOG` takes precedence over the requested level.

use crate::result::{ProbeError, ProbeResult};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines on stderr
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Filter for `level`, unless `RUST_LOG` is set
#[must_use]
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level))
}

/// Filter that shows ngx-probe events at `level` and everything else at warn
#[must_use]
pub fn default_filter(level: Level) -> EnvFilter {
    let level = level.to_string().to_lowercase();
    EnvFilter::new(format!("warn,ngx_probe={level},ngx_probe_cli={level}"))
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns a config error if a global subscriber is already installed.
pub fn init(level: Level, format: LogFormat) -> ProbeResult<()> {
    let filter = env_filter(level);
    let registry = Registry::default().with(filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| ProbeError::config(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_crate() {
        let filter = default_filter(Level::DEBUG).to_string();
        assert!(filter.contains("ngx_probe=debug"));
        assert!(filter.contains("warn"));
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init(Level::INFO, LogFormat::Pretty);
        let err = init(Level::INFO, LogFormat::Json).unwrap_err();
        assert!(matches!(err, ProbeError::Config { .. }));
    }
}
