//! Load `ServerConfig` from environment variables (after an optional `.env`).

use crate::config::types::ServerConfig;
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Read `.env` if present, then the process environment.
pub fn load_from_env() -> Result<ServerConfig, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
    load_with(|key| std::env::var(key).ok())
}

/// Build the config from any key lookup. Unset or blank keys keep their defaults.
pub fn load_with<F>(lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut cfg = ServerConfig::default();

    if let Some(url) = get("DATABASE_URL") {
        cfg.database_url = url;
    }
    if let Some(host) = get("HOST") {
        cfg.host = host;
    }
    if let Some(v) = get("PORT") {
        cfg.port = parse("PORT", &v)?;
    }
    if let Some(v) = get("DB_MAX_CONNECTIONS") {
        cfg.max_connections = positive("DB_MAX_CONNECTIONS", &v)?;
    }
    if let Some(v) = get("DB_CONNECT_RETRIES") {
        cfg.connect_retries = positive("DB_CONNECT_RETRIES", &v)?;
    }
    if let Some(v) = get("DB_RETRY_DELAY_SECS") {
        cfg.retry_delay = Duration::from_secs(parse("DB_RETRY_DELAY_SECS", &v)?);
    }
    if let Some(v) = get("USE_PROCEDURES") {
        cfg.use_procedures = flag("USE_PROCEDURES", &v)?;
    }
    if let Some(v) = get("BOOTSTRAP_SCHEMA") {
        cfg.bootstrap_schema = flag("BOOTSTRAP_SCHEMA", &v)?;
    }
    if let Some(v) = get("AUDIT_DELETES") {
        cfg.audit_deletes = flag("AUDIT_DELETES", &v)?;
    }
    if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
        let secs: u64 = positive("REQUEST_TIMEOUT_SECS", &v)?;
        cfg.request_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(v) = get("BODY_LIMIT_BYTES") {
        cfg.body_limit = positive("BODY_LIMIT_BYTES", &v)?;
    }
    Ok(cfg)
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn positive<T: FromStr + PartialOrd + Default>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    let n: T = parse(key, value)?;
    if n <= T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    Ok(n)
}

fn flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
