//! Log output for onboarding runs.
//!
//! `RUST_LOG` wins when it parses; otherwise `APP_LOG_LEVEL` is used and must
//! be a valid filter directive.

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

type InstallError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter { directive: String, source: ParseError },
    AlreadyInstalled(InstallError),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter { directive, source } => {
                write!(f, "APP_LOG_LEVEL '{directive}' is not a valid log filter: {source}")
            }
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "a global log subscriber is already installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(err.as_ref()),
        }
    }
}

pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::InvalidFilter {
        directive: config.log_level.clone(),
        source,
    })
}

/// Install the process-wide subscriber: compact lines, no colour, no targets.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(log_level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: log_level.to_string(),
        }
    }

    #[test]
    fn bad_log_level_names_the_directive() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        match env_filter(&config("onboard_buddy=loud")) {
            Err(err @ TelemetryError::InvalidFilter { .. }) => {
                assert!(err.to_string().starts_with("APP_LOG_LEVEL 'onboard_buddy=loud'"));
                assert!(std::error::Error::source(&err).is_some());
            }
            Err(other) => panic!("expected filter error, got {other:?}"),
            Ok(_) => panic!("malformed filter accepted"),
        }
    }

    #[test]
    fn module_scoped_levels_are_accepted() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(env_filter(&config("warn,onboard_buddy=debug")).is_ok());
    }
}
