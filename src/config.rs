//! Environment-driven configuration
//!
//! Binaries call `dotenv::dotenv()` first, so values may come from `.env`.

use crate::error::AnalyzerError;
use crate::models::DEFAULT_DOCUMENT_PATH;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOAD_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub api_port: u16,
    pub default_document_path: PathBuf,
    pub document_load_timeout: Duration,
    pub document_load_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            api_port: DEFAULT_API_PORT,
            default_document_path: PathBuf::from(DEFAULT_DOCUMENT_PATH),
            document_load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
            document_load_attempts: DEFAULT_LOAD_ATTEMPTS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let api_port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value::<u16>("PORT", &raw)?,
            None => defaults.api_port,
        };

        let document_load_timeout = match get("DOCUMENT_LOAD_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = parse_value::<u64>("DOCUMENT_LOAD_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(AnalyzerError::ConfigError(
                        "DOCUMENT_LOAD_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.document_load_timeout,
        };

        let document_load_attempts = match get("DOCUMENT_LOAD_ATTEMPTS") {
            Some(raw) => {
                let attempts = parse_value::<u32>("DOCUMENT_LOAD_ATTEMPTS", &raw)?;
                if attempts == 0 {
                    return Err(AnalyzerError::ConfigError(
                        "DOCUMENT_LOAD_ATTEMPTS must be at least 1".to_string(),
                    ));
                }
                attempts
            }
            None => defaults.document_load_attempts,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            api_port,
            default_document_path: get("DOCUMENT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.default_document_path),
            document_load_timeout,
            document_load_attempts,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| AnalyzerError::ConfigError(format!("{}={:?}: {}", key, raw, e)))
}
