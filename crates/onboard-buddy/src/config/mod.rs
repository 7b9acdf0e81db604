use chrono_tz::Tz;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the onboarding run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub sheet: SheetConfig,
    pub calendar: CalendarConfig,
    pub mail: MailConfig,
    pub chat: ChatConfig,
    pub google: GoogleAuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let window_raw = var_or("WINDOW_DAYS", "7");
        let window_days = window_raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidWindowDays { value: window_raw })?;

        let sheet = SheetConfig {
            id: optional_var("SHEET_ID"),
            tab: var_or("SHEET_TAB", "SHEET1"),
            window_days,
        };

        let timezone_raw = var_or("TIMEZONE", "Asia/Kolkata");
        let timezone = timezone_raw
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone {
                value: timezone_raw.clone(),
            })?;
        let failure_policy = CalendarFailurePolicy::parse(&var_or(
            "CALENDAR_FAILURE_POLICY",
            "continue",
        ))?;

        let calendar = CalendarConfig {
            calendar_id: var_or("CALENDAR_ID", "primary"),
            timezone,
            failure_policy,
        };

        let sender = match (optional_var("GMAIL_USER"), optional_var("GMAIL_APP_PASSWORD")) {
            (Some(address), Some(app_password)) => Some(MailCredentials {
                address,
                app_password,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteMailCredentials),
        };
        let relay_port = var_or("SMTP_PORT", "465")
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidSmtpPort)?;

        let mail = MailConfig {
            sender,
            relay_host: var_or("SMTP_HOST", "smtp.gmail.com"),
            relay_port,
        };

        let timeout_secs = var_or("SLACK_TIMEOUT_SECS", "10")
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidChatTimeout)?;

        let chat = ChatConfig {
            webhook_url: optional_var("SLACK_WEBHOOK"),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig::from_env(),
            sheet,
            calendar,
            mail,
            chat,
            google: GoogleAuthConfig::from_env(),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    optional_var(name).unwrap_or_else(|| default.to_string())
}

/// Blank values count as unset, matching how `.env` templates leave optional keys.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl TelemetryConfig {
    /// Just the logging settings; nothing here can fail to parse.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    fn from_env() -> Self {
        Self {
            log_level: env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

/// Where the hire roster lives and how far ahead to look.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub id: Option<String>,
    pub tab: String,
    pub window_days: i64,
}

impl SheetConfig {
    pub fn require_id(&self) -> Result<&str, ConfigError> {
        self.id.as_deref().ok_or(ConfigError::MissingSheetId)
    }

    /// The fixed five-column range read from the configured tab.
    pub fn range(&self) -> String {
        format!("{}!A:E", self.tab)
    }
}

/// What happens to the rest of a run when creating an event fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarFailurePolicy {
    /// Log the failure, record it on the hire's outcome and move on.
    Continue,
    /// Stop processing and surface the error.
    Abort,
}

impl CalendarFailurePolicy {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "continue" | "skip" => Ok(Self::Continue),
            "abort" | "fatal" => Ok(Self::Abort),
            _ => Err(ConfigError::InvalidFailurePolicy {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub calendar_id: String,
    pub timezone: Tz,
    pub failure_policy: CalendarFailurePolicy,
}

#[derive(Clone)]
pub struct MailCredentials {
    pub address: String,
    pub app_password: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Outbound mail settings. `sender` is `None` when email is switched off.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: Option<MailCredentials>,
    pub relay_host: String,
    pub relay_port: u16,
}

/// Chat webhook settings. `webhook_url` is `None` when chat is switched off.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub webhook_url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GoogleAuthConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
}

impl GoogleAuthConfig {
    /// Only the OAuth file locations, so token maintenance works even when
    /// the rest of the environment is incomplete.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    fn from_env() -> Self {
        Self {
            credentials_path: PathBuf::from(var_or("GOOGLE_CREDENTIALS_PATH", "credentials.json")),
            token_path: PathBuf::from(var_or("GOOGLE_TOKEN_PATH", "token.json")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSheetId,
    InvalidWindowDays { value: String },
    InvalidTimezone { value: String },
    InvalidFailurePolicy { value: String },
    IncompleteMailCredentials,
    InvalidSmtpPort,
    InvalidChatTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSheetId => {
                write!(f, "SHEET_ID is not set; add it to your environment or .env")
            }
            ConfigError::InvalidWindowDays { value } => {
                write!(f, "WINDOW_DAYS must be a whole number of days, got '{value}'")
            }
            ConfigError::InvalidTimezone { value } => {
                write!(f, "TIMEZONE must be an IANA timezone name, got '{value}'")
            }
            ConfigError::InvalidFailurePolicy { value } => write!(
                f,
                "CALENDAR_FAILURE_POLICY must be 'continue' or 'abort', got '{value}'"
            ),
            ConfigError::IncompleteMailCredentials => write!(
                f,
                "GMAIL_USER and GMAIL_APP_PASSWORD must be set together or not at all"
            ),
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
            ConfigError::InvalidChatTimeout => {
                write!(f, "SLACK_TIMEOUT_SECS must be a whole number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
