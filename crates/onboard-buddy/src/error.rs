use crate::config::ConfigError;
use crate::google::GoogleApiError;
use crate::telemetry::TelemetryError;
use crate::workflows::onboarding::{OnboardingError, RosterError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Auth(GoogleApiError),
    Workflow(OnboardingError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Auth(err) => write!(f, "google authorization error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Workflow(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<GoogleApiError> for AppError {
    fn from(value: GoogleApiError) -> Self {
        Self::Auth(value)
    }
}

impl From<OnboardingError> for AppError {
    fn from(value: OnboardingError) -> Self {
        match value {
            OnboardingError::Config(err) => Self::Config(err),
            other => Self::Workflow(other),
        }
    }
}

impl From<RosterError> for AppError {
    fn from(value: RosterError) -> Self {
        Self::Workflow(OnboardingError::Roster(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sheet_id_reads_as_configuration_error() {
        let err = AppError::from(OnboardingError::Config(ConfigError::MissingSheetId));
        assert!(matches!(err, AppError::Config(ConfigError::MissingSheetId)));
        assert_eq!(
            err.to_string(),
            "configuration error: SHEET_ID is not set; add it to your environment or .env"
        );
    }
}
