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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_interval_ms = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(invalid(var, "interval must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("VIEWPULSE_ENV", "development"))?;

    let bind_addr = parse_addr("VIEWPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VIEWPULSE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("VIEWPULSE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("VIEWPULSE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("VIEWPULSE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let poll_interval_ms = parse_interval_ms("VIEWPULSE_POLL_INTERVAL_MS", "5000")?;
    let tick_interval_ms = parse_interval_ms("VIEWPULSE_TICK_INTERVAL_MS", "1000")?;

    let snapshot_limit_raw = parse_u32("VIEWPULSE_SNAPSHOT_LIMIT", "6000")?;
    if snapshot_limit_raw == 0 {
        return Err(invalid(
            "VIEWPULSE_SNAPSHOT_LIMIT",
            "limit must be greater than zero".to_string(),
        ));
    }
    let snapshot_limit = i64::from(snapshot_limit_raw);

    let dismissal_path = PathBuf::from(or_default(
        "VIEWPULSE_DISMISSAL_PATH",
        "./.viewpulse/state.json",
    ));
    let watch_url = optional("VIEWPULSE_WATCH_URL");
    let video_id = optional("VIEWPULSE_VIDEO_ID");
    let milestone_watch_cron = or_default("VIEWPULSE_MILESTONE_WATCH_CRON", "0 * * * * *");
    let api_keys = parse_api_keys(&or_default("VIEWPULSE_API_KEYS", ""));

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        poll_interval_ms,
        tick_interval_ms,
        snapshot_limit,
        dismissal_path,
        watch_url,
        video_id,
        milestone_watch_cron,
        api_keys,
    })
}

/// Splits a comma-separated token list, dropping blanks and duplicates.
fn parse_api_keys(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VIEWPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
