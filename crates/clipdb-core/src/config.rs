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
/// Decoupled from the process environment so tests can drive it with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, "false")).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false/1/0/yes/no/on/off".to_string(),
            )
        })
    };

    let database_url = require("DATABASE_URL")?;
    let apify_api_token = require("APIFY_API_TOKEN")?;

    let env = parse_environment(&or_default("CLIPDB_ENV", "development"))?;
    let bind_addr = parse_addr("CLIPDB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CLIPDB_LOG_LEVEL", "info");

    let apify_base_url = or_default("CLIPDB_APIFY_BASE_URL", "https://api.apify.com/v2")
        .trim_end_matches('/')
        .to_string();
    let tiktok_actor = or_default("CLIPDB_TIKTOK_ACTOR", "clockworks~tiktok-scraper");
    let instagram_actor = or_default("CLIPDB_INSTAGRAM_ACTOR", "apify~instagram-scraper");
    let youtube_actor = or_default("CLIPDB_YOUTUBE_ACTOR", "streamers~youtube-scraper");

    let db_max_connections = parse_u32("CLIPDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CLIPDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CLIPDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("CLIPDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("CLIPDB_SCRAPER_USER_AGENT", "clipdb/0.1 (creator-analytics)");

    let dataset_max_retries = parse_u32("CLIPDB_DATASET_MAX_RETRIES", "3")?;
    if dataset_max_retries == 0 {
        return Err(invalid(
            "CLIPDB_DATASET_MAX_RETRIES",
            "must be at least 1".to_string(),
        ));
    }
    let dataset_retry_delay_ms = parse_u64("CLIPDB_DATASET_RETRY_DELAY_MS", "2000")?;
    let cache_freshness_hours = parse_u32("CLIPDB_CACHE_FRESHNESS_HOURS", "48")?;

    let default_result_limit = parse_u32("CLIPDB_DEFAULT_RESULT_LIMIT", "30")?;
    if !(1..=100).contains(&default_result_limit) {
        return Err(invalid(
            "CLIPDB_DEFAULT_RESULT_LIMIT",
            format!("{default_result_limit} is outside 1..=100"),
        ));
    }

    let poll_interval_secs = parse_u64("CLIPDB_POLL_INTERVAL_SECS", "5")?;
    let poll_max_attempts = parse_u32("CLIPDB_POLL_MAX_ATTEMPTS", "60")?;

    let disable_rate_limit = parse_flag("CLIPDB_DISABLE_RATE_LIMIT")?;
    let rate_limit_max_requests = parse_usize("CLIPDB_RATE_LIMIT_MAX_REQUESTS", "120")?;
    let rate_limit_window_secs = parse_u64("CLIPDB_RATE_LIMIT_WINDOW_SECS", "60")?;

    let api_keys = or_default("CLIPDB_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        apify_api_token,
        apify_base_url,
        tiktok_actor,
        instagram_actor,
        youtube_actor,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        dataset_max_retries,
        dataset_retry_delay_ms,
        cache_freshness_hours,
        default_result_limit,
        poll_interval_secs,
        poll_max_attempts,
        disable_rate_limit,
        rate_limit_max_requests,
        rate_limit_window_secs,
        api_keys,
    })
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
            var: "CLIPDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
