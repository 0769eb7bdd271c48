use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// config. Decoupled from the process environment so tests can drive it
/// with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let log_level = or_default("HOTLEADS_LOG_LEVEL", "info");
    let niches_path = PathBuf::from(or_default("HOTLEADS_NICHES_PATH", "./config/niches.yaml"));
    let overpass_url = or_default(
        "HOTLEADS_OVERPASS_URL",
        "https://overpass-api.de/api/interpreter",
    );
    let nominatim_url = or_default(
        "HOTLEADS_NOMINATIM_URL",
        "https://nominatim.openstreetmap.org",
    );
    let directory_url = optional("HOTLEADS_DIRECTORY_URL");
    let user_agent = or_default("HOTLEADS_USER_AGENT", "hotleads/0.1 (lead-discovery)");

    let geocode_timeout_secs = parse("HOTLEADS_GEOCODE_TIMEOUT_SECS", "10")?;
    let overpass_timeout_secs = parse("HOTLEADS_OVERPASS_TIMEOUT_SECS", "30")?;
    let enrich_timeout_secs = parse("HOTLEADS_ENRICH_TIMEOUT_SECS", "8")?;
    let probe_timeout_secs = parse("HOTLEADS_PROBE_TIMEOUT_SECS", "5")?;

    let max_results = parse_value::<u32>(
        "HOTLEADS_MAX_RESULTS",
        &or_default("HOTLEADS_MAX_RESULTS", "500"),
    )?;
    let max_clauses_per_query = parse_value::<usize>(
        "HOTLEADS_MAX_CLAUSES_PER_QUERY",
        &or_default("HOTLEADS_MAX_CLAUSES_PER_QUERY", "8"),
    )?;
    if max_clauses_per_query == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HOTLEADS_MAX_CLAUSES_PER_QUERY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let enrich_concurrency = parse_value::<usize>(
        "HOTLEADS_ENRICH_CONCURRENCY",
        &or_default("HOTLEADS_ENRICH_CONCURRENCY", "5"),
    )?;
    if !(1..=10).contains(&enrich_concurrency) {
        return Err(ConfigError::InvalidEnvVar {
            var: "HOTLEADS_ENRICH_CONCURRENCY".to_string(),
            reason: format!("{enrich_concurrency} is outside 1..=10"),
        });
    }

    let default_radius_m = parse_value::<u32>(
        "HOTLEADS_DEFAULT_RADIUS_M",
        &or_default("HOTLEADS_DEFAULT_RADIUS_M", "50000"),
    )?;
    let max_radius_m = parse_value::<u32>(
        "HOTLEADS_MAX_RADIUS_M",
        &or_default("HOTLEADS_MAX_RADIUS_M", "200000"),
    )?;
    if max_radius_m < default_radius_m {
        return Err(ConfigError::InvalidEnvVar {
            var: "HOTLEADS_MAX_RADIUS_M".to_string(),
            reason: format!("{max_radius_m} is smaller than the default radius {default_radius_m}"),
        });
    }

    let cache_ttl_secs = parse("HOTLEADS_CACHE_TTL_SECS", "300")?;
    let geocode_cache_ttl_secs = parse("HOTLEADS_GEOCODE_CACHE_TTL_SECS", "600")?;
    let cache_capacity = parse("HOTLEADS_CACHE_CAPACITY", "256")?;

    Ok(AppConfig {
        log_level,
        niches_path,
        overpass_url,
        nominatim_url,
        directory_url,
        user_agent,
        geocode_timeout_secs,
        overpass_timeout_secs,
        enrich_timeout_secs,
        probe_timeout_secs,
        max_results,
        max_clauses_per_query,
        enrich_concurrency,
        default_radius_m,
        max_radius_m,
        cache_ttl_secs,
        geocode_cache_ttl_secs,
        cache_capacity,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
