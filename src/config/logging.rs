use crate::config::parameter;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Deployment environment, drives how much detail reaches the logs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" | "testing" => Environment::Test,
            _ => Environment::Development,
        })
    }
}

#[derive(Debug)]
pub struct LoggingConfig {
    environment: Environment,
    log_level: Level,
}

impl LoggingConfig {
    pub fn from_parameters() -> Self {
        let environment = parameter::get_optional("ENV")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Environment::Development);

        let log_level = parameter::get_optional("LOG_LEVEL")
            .and_then(|level| parse_level(&level))
            .unwrap_or(Level::INFO);

        Self {
            environment,
            log_level,
        }
    }

    /// Detailed error messages are allowed outside production or at debug level
    pub fn allow_detailed_errors(&self) -> bool {
        matches!(self.environment, Environment::Development) || self.log_level >= Level::DEBUG
    }

    /// Identifying data (emails, usernames) only in development at debug level
    pub fn allow_sensitive_data(&self) -> bool {
        matches!(self.environment, Environment::Development) && self.log_level >= Level::DEBUG
    }

    /// Filter for the global subscriber. `RUST_LOG` wins when set.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.as_str().to_lowercase()))
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

static LOGGING_CONFIG: std::sync::OnceLock<LoggingConfig> = std::sync::OnceLock::new();

/// Install the tracing subscriber and the global logging configuration.
pub fn init() {
    let config = get_config();
    if tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::warn!("Tracing subscriber already installed");
    }
    tracing::info!(
        "Logging configured: environment={:?}, level={:?}",
        config.environment,
        config.log_level
    );
}

pub fn get_config() -> &'static LoggingConfig {
    LOGGING_CONFIG.get_or_init(LoggingConfig::from_parameters)
}

/// Logging that respects `LoggingConfig`: error causes are withheld in
/// production and identifying data is dropped unless explicitly allowed.
pub mod secure_log {
    macro_rules! secure_error {
        ($context:expr) => {
            tracing::error!("{}", $context)
        };
        ($context:expr, $cause:expr) => {
            match $crate::config::logging::get_config().allow_detailed_errors() {
                true => tracing::error!(cause = %$cause, "{}", $context),
                false => tracing::error!("{} (cause withheld)", $context),
            }
        };
    }

    macro_rules! sensitive_debug {
        ($($arg:tt)*) => {
            if $crate::config::logging::get_config().allow_sensitive_data() {
                tracing::debug!($($arg)*);
            }
        };
    }

    pub(crate) use secure_error;
    pub(crate) use sensitive_debug;
}
