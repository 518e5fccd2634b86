use std::env::VarError;
use std::str::FromStr;

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
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn parse_var<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
///
/// # Errors
///
/// Returns [`ConfigError`] if any variable is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("PANTRY_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_var(&lookup, "PANTRY_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PANTRY_LOG_LEVEL", "info");
    let catalog_path = optional("PANTRY_CATALOG_PATH").map(PathBuf::from);

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("PANTRY_GEMINI_MODEL", "gemini-2.5-flash");
    let gemini_base_url = or_default(
        "PANTRY_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com/",
    );
    let routing_base_url = or_default(
        "PANTRY_ROUTING_BASE_URL",
        "https://router.project-osrm.org/",
    );
    let manager_key = optional("PANTRY_MANAGER_KEY");

    let request_timeout_secs: u64 = parse_var(&lookup, "PANTRY_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries: u32 = parse_var(&lookup, "PANTRY_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms: u64 = parse_var(&lookup, "PANTRY_RETRY_BACKOFF_BASE_MS", "500")?;

    let pool_size: usize = parse_var(&lookup, "PANTRY_POOL_SIZE", "30")?;
    if pool_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PANTRY_POOL_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let pool_radius_km = parse_distance(&lookup, "PANTRY_POOL_RADIUS_KM", "15.0")?;
    let pool_reuse_radius_km = parse_distance(&lookup, "PANTRY_POOL_REUSE_RADIUS_KM", "2.0")?;

    let delivery_ms_per_minute: u64 =
        parse_var(&lookup, "PANTRY_DELIVERY_MS_PER_MINUTE", "60000")?;
    let rng_seed = match optional("PANTRY_RNG_SEED") {
        Some(raw) => Some(raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: "PANTRY_RNG_SEED".to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        routing_base_url,
        manager_key,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        pool_size,
        pool_radius_km,
        pool_reuse_radius_km,
        delivery_ms_per_minute,
        rng_seed,
    })
}

/// Parse a non-negative, finite distance in km.
fn parse_distance<F>(lookup: &F, var: &str, default: &str) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let value: f64 = parse_var(lookup, var, default)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a non-negative distance in km, got {value}"),
        });
    }
    Ok(value)
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PANTRY_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
