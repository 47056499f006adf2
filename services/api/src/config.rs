//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_MODEL_ID: &str = "redule26/huihui_ai_qwen2.5-vl-7b-abliterated";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Unset means every model call fails and the fallback answers are used.
    pub model_url: Option<String>,
    pub model_id: String,
    pub model_timeout: Duration,
    pub session_ttl_secs: i64,
    pub tesseract_cmd: String,
    pub ocr_timeout: Duration,
    pub docx_chunk_chars: usize,
    pub cors_allow_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            log_level: Level::INFO,
            model_url: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_timeout: Duration::from_secs(60),
            session_ttl_secs: 60 * 60,
            tesseract_cmd: "tesseract".to_string(),
            ocr_timeout: Duration::from_secs(30),
            docx_chunk_chars: 2500,
            cors_allow_origins: vec!["*".to_string()],
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Reads `name` and parses it, keeping `default` when the variable is unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated origin list; an empty list means any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Config::default();

        // --- Server Settings ---
        let bind_address = parse_var("BIND_ADDRESS", defaults.bind_address)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Model Endpoint ---
        let model_url = std::env::var("OLLAMA_UNIFIED_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let model_id = std::env::var("OLLAMA_MODEL_ID")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.model_id);
        let model_timeout = Duration::from_secs(parse_var(
            "MODEL_TIMEOUT_SECS",
            defaults.model_timeout.as_secs(),
        )?);

        // --- Sessions, OCR and Extraction ---
        let session_ttl_secs = parse_var("SESSION_TTL_SECS", defaults.session_ttl_secs)?;
        if session_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let tesseract_cmd =
            std::env::var("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd);
        let ocr_timeout = Duration::from_secs(parse_var(
            "OCR_TIMEOUT_SECS",
            defaults.ocr_timeout.as_secs(),
        )?);
        let docx_chunk_chars = parse_var("DOCX_CHUNK_CHARS", defaults.docx_chunk_chars)?;

        // --- HTTP Surface ---
        let cors_allow_origins = std::env::var("CORS_ALLOW_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or(defaults.cors_allow_origins);
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;

        Ok(Self {
            bind_address,
            log_level,
            model_url,
            model_id,
            model_timeout,
            session_ttl_secs,
            tesseract_cmd,
            ocr_timeout,
            docx_chunk_chars,
            cors_allow_origins,
            max_upload_bytes,
        })
    }

    /// True when CORS should accept any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins(" http://a.test , http://b.test,"),
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(parse_origins(""), vec!["*"]);
    }

    #[test]
    fn parse_var_reports_the_variable_name() {
        std::env::set_var("INSIGHTHUB_TEST_NUMBER", "not-a-number");
        let err = parse_var::<u64>("INSIGHTHUB_TEST_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("INSIGHTHUB_TEST_NUMBER"));
        assert_eq!(parse_var::<u64>("INSIGHTHUB_TEST_UNSET_VAR", 7).unwrap(), 7);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.model_timeout, Duration::from_secs(60));
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.ocr_timeout, Duration::from_secs(30));
        assert_eq!(config.docx_chunk_chars, 2500);
        assert!(config.allows_any_origin());
    }
}
