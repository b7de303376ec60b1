use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::feed::{DEFAULT_FEED_URL, DEFAULT_MIN_RENT};
use crate::telegram::DEFAULT_API_BASE;
use crate::watch::WatchConfig;

pub const TOKEN_ENV: &str = "OFFERWATCH_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "OFFERWATCH_CHAT_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub feed: FeedConfig,
    pub watch: WatchSettings,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Chat receiving every notification.
    pub chat_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
    pub min_rent: u32,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub poll_interval_seconds: u64,
    pub retry_backoff_seconds: u64,
    pub failure_alert_threshold: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub filters_path: Option<PathBuf>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: DEFAULT_API_BASE.to_owned(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FEED_URL.to_owned(),
            min_rent: DEFAULT_MIN_RENT,
            request_timeout_seconds: 3,
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
            retry_backoff_seconds: 5,
            failure_alert_threshold: 12,
        }
    }
}

impl AppConfig {
    /// ~/.config/offerwatch on Linux, current directory when unavailable.
    pub fn config_dir() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("offerwatch"),
            None => PathBuf::from("."),
        }
    }

    pub fn config_file_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Loads `path` (or the default location), falling back to defaults when
    /// the file is absent, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_file_path);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            warn!(path = %path.display(), "configuration file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Secrets supplied through the environment win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup(CHAT_ID_ENV).filter(|v| !v.is_empty()) {
            self.telegram.chat_id = chat_id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "telegram.bot_token is empty (set it or {TOKEN_ENV})"
            )));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "telegram.chat_id is empty (set it or {CHAT_ID_ENV})"
            )));
        }
        if self.feed.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("feed.endpoint is empty".into()));
        }
        if self.watch.poll_interval_seconds == 0 || self.watch.retry_backoff_seconds == 0 {
            return Err(ConfigError::Invalid(
                "watch intervals must be at least one second".into(),
            ));
        }
        if self.feed.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "feed.request_timeout_seconds must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_secs(self.watch.poll_interval_seconds),
            retry_backoff: Duration::from_secs(self.watch.retry_backoff_seconds),
            failure_alert_threshold: self.watch.failure_alert_threshold,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.request_timeout_seconds)
    }

    pub fn filters_path(&self) -> PathBuf {
        self.storage
            .filters_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("latest_postal_code.txt"))
    }
}
