use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
pub(crate) fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("DUKAAN_ENV", "development"));

    let bind_addr = parse_addr("DUKAAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("DUKAAN_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("DUKAAN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("DUKAAN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("DUKAAN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let checkout_request_timeout_secs = parse_u64("DUKAAN_CHECKOUT_REQUEST_TIMEOUT_SECS", "30")?;
    let checkout_max_retries = parse_u32("DUKAAN_CHECKOUT_MAX_RETRIES", "3")?;
    let checkout_retry_backoff_base_ms = parse_u64("DUKAAN_CHECKOUT_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        checkout_request_timeout_secs,
        checkout_max_retries,
        checkout_retry_backoff_base_ms,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw.to_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
