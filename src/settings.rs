use config::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

pub const LISTINGS_PATH: &str = "/v2/investor/requisition_listings";

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub app_url: String,
    pub cookie: String,
    pub user_agent: Option<String>,
    pub request_timeout_secs: u64,
}

impl ApiSettings {
    pub fn listings_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), LISTINGS_PATH)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    pub retry_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub retry: RetrySettings,
    pub filters_path: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup, so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Settings {
            api: ApiSettings {
                base_url: non_empty("API_BASE_URL")
                    .unwrap_or_else(|| "https://api.example.com".to_string()),
                app_url: non_empty("APP_URL")
                    .unwrap_or_else(|| "https://app.example.com/".to_string()),
                // An empty cookie is still sent, the request just won't be authenticated
                cookie: lookup("API_COOKIE").unwrap_or_default(),
                user_agent: non_empty("USER_AGENT"),
                request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            },
            retry: RetrySettings {
                retry_attempts: parse_or(&lookup, "RETRY_ATTEMPTS", 3)?,
                base_delay_ms: parse_or(&lookup, "BASE_DELAY_MS", 500)?,
                max_delay_secs: parse_or(&lookup, "MAX_DELAY_SECS", 30)?,
            },
            filters_path: non_empty("FILTERS_PATH").map(PathBuf::from),
            poll_interval_secs: match non_empty("POLL_INTERVAL_SECS") {
                Some(raw) => Some(parse_value("POLL_INTERVAL_SECS", &raw)?),
                None => None,
            },
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::Message(format!("invalid value {:?} for {}: {}", raw, key, e)))
}
