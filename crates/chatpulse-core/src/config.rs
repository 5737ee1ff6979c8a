use crate::app_config::{AppConfig, ClassifierKind, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or mutually inconsistent.
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
/// Returns `ConfigError` if values are invalid or mutually inconsistent.
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
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            n => Ok(n),
        }
    };

    let env = parse_environment(&or_default("CHATPULSE_ENV", "development"))?;
    let log_level = or_default("CHATPULSE_LOG_LEVEL", env.default_log_level());

    let source_url = optional("CHATPULSE_SOURCE_URL");
    let source_file = optional("CHATPULSE_SOURCE_FILE").map(PathBuf::from);
    if source_url.is_some() && source_file.is_some() {
        return Err(invalid(
            "CHATPULSE_SOURCE_FILE",
            "cannot be combined with CHATPULSE_SOURCE_URL".to_string(),
        ));
    }

    let window_secs = parse_positive_u64("CHATPULSE_WINDOW_SECS", "30")?;
    let poll_interval_secs = parse_positive_u64("CHATPULSE_POLL_INTERVAL_SECS", "5")?;

    let classifier = parse_classifier_kind(&or_default("CHATPULSE_CLASSIFIER", "lexicon"))?;
    let classifier_url = optional("CHATPULSE_CLASSIFIER_URL");
    // The endpoint may still come from `--classifier-url`; whoever builds
    // the classifier checks that one was supplied.
    let classifier_token = optional("CHATPULSE_CLASSIFIER_TOKEN");

    let raw_concurrency = or_default("CHATPULSE_CLASSIFY_CONCURRENCY", "1");
    let classify_concurrency = match raw_concurrency.parse::<usize>() {
        Ok(0) => {
            return Err(invalid(
                "CHATPULSE_CLASSIFY_CONCURRENCY",
                "must be at least 1".to_string(),
            ))
        }
        Ok(n) => n,
        Err(e) => return Err(invalid("CHATPULSE_CLASSIFY_CONCURRENCY", e.to_string())),
    };

    let request_timeout_secs = parse_positive_u64("CHATPULSE_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("CHATPULSE_USER_AGENT", "chatpulse/0.1 (live-chat-sentiment)");
    let connect_max_retries = parse_u32("CHATPULSE_CONNECT_MAX_RETRIES", "3")?;
    let connect_backoff_base_ms = parse_u64("CHATPULSE_CONNECT_BACKOFF_BASE_MS", "500")?;
    let output_dir = PathBuf::from(or_default("CHATPULSE_OUTPUT_DIR", "./reports"));

    Ok(AppConfig {
        env,
        log_level,
        source_url,
        source_file,
        window_secs,
        poll_interval_secs,
        classifier,
        classifier_url,
        classifier_token,
        classify_concurrency,
        request_timeout_secs,
        user_agent,
        connect_max_retries,
        connect_backoff_base_ms,
        output_dir,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CHATPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_classifier_kind(s: &str) -> Result<ClassifierKind, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "lexicon" => Ok(ClassifierKind::Lexicon),
        "http" => Ok(ClassifierKind::Http),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CHATPULSE_CLASSIFIER".to_string(),
            reason: format!("expected 'lexicon' or 'http', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
