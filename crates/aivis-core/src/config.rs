use crate::app_config::{AppConfig, Environment};
use crate::{Backend, ConfigError};

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

/// Load application configuration from the variables already in the process,
/// without reading `.env`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    // Empty strings count as unset so a blank `.env` entry does not enable a backend.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_positive = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_num(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let narrow = |var: &str, value: u64| -> Result<u32, ConfigError> {
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let to_usize = |var: &str, value: u64| -> Result<usize, ConfigError> {
        usize::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("AIVIS_ENV", "development"))?;

    let bind_raw = or_default("AIVIS_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "AIVIS_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("AIVIS_LOG_LEVEL", "info");

    let db_max_connections = narrow(
        "AIVIS_DB_MAX_CONNECTIONS",
        parse_positive("AIVIS_DB_MAX_CONNECTIONS", "10")?,
    )?;
    let db_min_connections = narrow(
        "AIVIS_DB_MIN_CONNECTIONS",
        parse_num("AIVIS_DB_MIN_CONNECTIONS", "1")?,
    )?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "AIVIS_DB_MIN_CONNECTIONS".to_string(),
            reason: format!("must not exceed AIVIS_DB_MAX_CONNECTIONS ({db_max_connections})"),
        });
    }
    let db_acquire_timeout_secs = parse_num("AIVIS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let openai_api_key = optional("OPENAI_API_KEY");
    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let gemini_api_key = optional("GEMINI_API_KEY");

    let openai_model = or_default("AIVIS_OPENAI_MODEL", "gpt-4o");
    let claude_model = or_default("AIVIS_CLAUDE_MODEL", "claude-3-5-sonnet-20241022");
    let gemini_model = or_default("AIVIS_GEMINI_MODEL", "gemini-2.0-flash-exp");

    let reasoning_backend = or_default("AIVIS_REASONING_BACKEND", "gemini")
        .parse::<Backend>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "AIVIS_REASONING_BACKEND".to_string(),
            reason: e.to_string(),
        })?;

    let llm_request_timeout_secs = parse_positive("AIVIS_LLM_REQUEST_TIMEOUT_SECS", "60")?;
    let llm_max_attempts = narrow(
        "AIVIS_LLM_MAX_ATTEMPTS",
        parse_positive("AIVIS_LLM_MAX_ATTEMPTS", "3")?,
    )?;
    let llm_retry_backoff_base_secs = parse_num("AIVIS_LLM_RETRY_BACKOFF_BASE_SECS", "2")?;
    let query_max_concurrency = to_usize(
        "AIVIS_QUERY_MAX_CONCURRENCY",
        parse_positive("AIVIS_QUERY_MAX_CONCURRENCY", "2")?,
    )?;
    let max_concurrent_runs = to_usize(
        "AIVIS_MAX_CONCURRENT_RUNS",
        parse_positive("AIVIS_MAX_CONCURRENT_RUNS", "2")?,
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        openai_api_key,
        anthropic_api_key,
        gemini_api_key,
        openai_model,
        claude_model,
        gemini_model,
        reasoning_backend,
        llm_request_timeout_secs,
        llm_max_attempts,
        llm_retry_backoff_base_secs,
        query_max_concurrency,
        max_concurrent_runs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AIVIS_ENV".to_string(),
            reason: format!("expected development, test or production, got {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
