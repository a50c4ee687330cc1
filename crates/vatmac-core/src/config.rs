use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Browser-like agent; the primary rate page serves a reduced document to
/// non-browser clients.
pub const DEFAULT_RATE_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
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

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("VATMAC_ENV", "development"))?;

    let bind_addr = parse("VATMAC_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VATMAC_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default(
        "VATMAC_CATALOG_PATH",
        "./macbook_scraper/output/latest_products.json",
    ));

    let scraper_dir = PathBuf::from(or_default("VATMAC_SCRAPER_DIR", "./macbook_scraper"));
    let scraper_script = or_default("VATMAC_SCRAPER_SCRIPT", "update_prices.py");
    let scraper_python = optional("VATMAC_SCRAPER_PYTHON");
    let scraper_timeout_secs = parse_u64("VATMAC_SCRAPER_TIMEOUT_SECS", "280")?;
    let scraper_max_output_bytes = parse_usize("VATMAC_SCRAPER_MAX_OUTPUT_BYTES", "10485760")?;

    let cron_secret = optional("CRON_SECRET");

    let rate_timeout_secs = parse_u64("VATMAC_RATE_TIMEOUT_SECS", "10")?;
    let rate_user_agent = or_default("VATMAC_RATE_USER_AGENT", DEFAULT_RATE_USER_AGENT);

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        scraper_dir,
        scraper_script,
        scraper_python,
        scraper_timeout_secs,
        scraper_max_output_bytes,
        cron_secret,
        rate_timeout_secs,
        rate_user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VATMAC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
