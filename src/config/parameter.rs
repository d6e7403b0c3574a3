use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{error, info, warn};

static CONFIG: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Default configuration values
const DEFAULTS: &[(&str, &str)] = &[
    ("SERVER_ADDRESS", "127.0.0.1"),
    ("SERVER_PORT", "8000"),
    ("ACCESS_TOKEN_TTL_MINUTES", "15"),
    ("REFRESH_TOKEN_TTL_DAYS", "10"),
    ("BCRYPT_COST", "10"),
    ("COOKIE_SECURE", "true"),
    ("MAX_REQUEST_SIZE_MB", "10"),
    ("UPLOAD_TEMP_DIR", "./public/temp"),
    ("MEDIA_DIR", "./public/media"),
    ("MEDIA_BASE_URL", "/media"),
    ("STORAGE_BACKEND", "postgres"),
    ("LOG_LEVEL", "info"),
];

/// Keys without a default, read from the environment when present
const OPTIONAL_KEYS: &[&str] = &[
    "ENV",
    "APP_NAME",
    "ACCESS_TOKEN_SECRET",
    "REFRESH_TOKEN_SECRET",
    "DATABASE_URL",
    "DB_MAX_CONNECTIONS",
    "DB_MIN_CONNECTIONS",
    "DB_ACQUIRE_TIMEOUT_SECONDS",
    "DB_IDLE_TIMEOUT_SECONDS",
    "DB_MAX_LIFETIME_SECONDS",
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_API_KEY",
    "CLOUDINARY_API_SECRET",
    "CLOUDINARY_FOLDER",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required configuration parameter '{0}' is missing")]
    Missing(String),
    #[error("Configuration parameter '{0}' is invalid: {1}")]
    Invalid(String, String),
}

pub fn init() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment file: {:?}", path),
        Err(_) => warn!("No .env file found, using system environment variables"),
    }

    if CONFIG.set(load()).is_err() {
        error!("Configuration already initialized");
    } else {
        info!("Configuration initialized successfully");
    }
}

fn load() -> HashMap<String, String> {
    let mut config = HashMap::new();

    // Load defaults first
    for (key, value) in DEFAULTS {
        config.insert(key.to_string(), value.to_string());
    }

    // Override with environment variables
    let known = DEFAULTS.iter().map(|(key, _)| *key).chain(OPTIONAL_KEYS.iter().copied());
    for key in known {
        if let Ok(value) = std::env::var(key) {
            config.insert(key.to_string(), value);
        }
    }

    config
}

fn lookup(parameter: &str) -> Option<String> {
    CONFIG
        .get_or_init(load)
        .get(parameter)
        .cloned()
}

pub fn get(parameter: &str) -> String {
    lookup(parameter).unwrap_or_else(|| {
        error!("Configuration parameter '{}' not found", parameter);
        panic!("Required configuration parameter '{}' is missing", parameter);
    })
}

pub fn get_optional(parameter: &str) -> Option<String> {
    lookup(parameter).filter(|value| !value.is_empty())
}

/// Like `get`, but reports a missing secret as an error instead of panicking.
pub fn require(parameter: &str) -> Result<String, ConfigError> {
    get_optional(parameter).ok_or_else(|| ConfigError::Missing(parameter.to_string()))
}

pub fn get_i64(parameter: &str) -> i64 {
    let value = get(parameter);
    value.parse::<i64>().unwrap_or_else(|_| {
        error!("Configuration parameter '{}' is not a valid i64: {}", parameter, value);
        panic!("Configuration parameter '{}' is not a valid i64", parameter);
    })
}

pub fn get_bool(parameter: &str) -> bool {
    let value = get(parameter).to_lowercase();
    matches!(value.as_str(), "true" | "1" | "yes" | "on")
}

pub fn get_u64(parameter: &str) -> u64 {
    let value = get(parameter);
    value.parse::<u64>().unwrap_or_else(|_| {
        error!("Configuration parameter '{}' is not a valid u64: {}", parameter, value);
        panic!("Configuration parameter '{}' is not a valid u64", parameter);
    })
}
