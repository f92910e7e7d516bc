use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: Url,
    /// Where the JWT is persisted between runs.
    pub credentials_path: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::load`] but resolves variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("MEME_API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("MEME_API_BASE_URL".into()))?;
        let api_base_url = parse_base_url(&base)?;

        let credentials_path = lookup("MEME_CREDENTIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_credentials_path(lookup("HOME")));

        let http_timeout = match lookup("MEME_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidVar("MEME_HTTP_TIMEOUT_SECS".into(), e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidVar(
                        "MEME_HTTP_TIMEOUT_SECS".into(),
                        "timeout must be at least one second".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(30),
        };

        Ok(Config {
            api_base_url,
            credentials_path,
            http_timeout,
        })
    }

    /// Replaces the API base URL, e.g. from a `--api-url` flag.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_base_url(raw)?;
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidVar("MEME_API_BASE_URL".into(), e.to_string()))
}

fn default_credentials_path(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(".meme-feed").join("jwt"),
        None => PathBuf::from(".meme-feed-jwt"),
    }
}
