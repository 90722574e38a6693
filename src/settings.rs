//! User settings for the FarminAi shell.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`,
//! then overridden by environment variables. The API token is never written to disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::DEFAULT_MODEL;
use crate::model::{
    ModelConfig, QueryOptions, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_P,
};

/// Environment variables checked for the bearer token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["HF_API_TOKEN", "MY_SECRET_TOKEN"];

/// Settings persistence errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot determine config directory")]
    NoConfigDir,
    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Inference API base URL
    pub base_url: String,
    /// Selected model ID
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Maximum new tokens per reply
    pub max_tokens: u32,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Total attempts per question
    pub max_retries: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "farminai", "farmin-ai")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .map(|content| Self::from_json(&content))
            .unwrap_or_default()
    }

    /// Parse settings JSON, backfilling fields that would make queries impossible.
    pub fn from_json(content: &str) -> Self {
        let defaults = Self::default();

        let mut loaded: Self = match serde_json::from_str(content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring unreadable settings file: {}", e);
                return defaults;
            }
        };

        if loaded.base_url.trim().is_empty() {
            loaded.base_url = defaults.base_url;
        }
        if loaded.model.trim().is_empty() {
            loaded.model = defaults.model;
        }
        if loaded.timeout_secs == 0 {
            loaded.timeout_secs = defaults.timeout_secs;
        }

        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings as pretty JSON at `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Copy of these settings with `FARMINAI_*` overrides applied.
    ///
    /// The receiver is left untouched so it can still be saved without
    /// baking per-run overrides into the settings file.
    pub fn with_env_overrides<F>(&self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut effective = self.clone();
        effective.apply_env_overrides(lookup);
        effective
    }

    /// Apply `FARMINAI_*` overrides.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`. Values that do not
    /// parse are logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = non_blank(lookup("FARMINAI_BASE_URL")) {
            self.base_url = base_url;
        }
        if let Some(model) = non_blank(lookup("FARMINAI_MODEL")) {
            self.model = crate::config::resolve_model(&model);
        }
        if let Some(v) = parse_override(&lookup, "FARMINAI_TEMPERATURE") {
            self.temperature = v;
        }
        if let Some(v) = parse_override(&lookup, "FARMINAI_TOP_P") {
            self.top_p = v;
        }
        if let Some(v) = parse_override(&lookup, "FARMINAI_MAX_TOKENS") {
            self.max_tokens = v;
        }
        match parse_override::<u64, _>(&lookup, "FARMINAI_TIMEOUT") {
            Some(0) => warn!("ignoring FARMINAI_TIMEOUT=0; attempts need a non-zero deadline"),
            Some(v) => self.timeout_secs = v,
            None => {}
        }
        if let Some(v) = parse_override(&lookup, "FARMINAI_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = parse_override(&lookup, "FARMINAI_RETRY_DELAY_MS") {
            self.retry_delay_ms = v;
        }
    }

    /// Sampling and retry options for the query client.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
            .with_max_tokens(self.max_tokens)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
    }

    /// Connection settings for the query client.
    pub fn model_config(&self, api_token: impl Into<String>) -> ModelConfig {
        ModelConfig::default()
            .with_base_url(&self.base_url)
            .with_api_token(api_token)
    }
}

/// First non-blank bearer token among [`TOKEN_ENV_VARS`].
pub fn api_token_from<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_ENV_VARS
        .iter()
        .find_map(|key| non_blank(lookup(key)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = non_blank(lookup(key))?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable override");
            None
        }
    }
}
