use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::i18n::Locale;
use crate::modal::DEFAULT_RECOMMENDATION_COUNT;

const APP_NAME: &str = "feature-policies";
const CONFIG_FILE: &str = "config.json";

/// Default URLs point at a locally running `fpol serve`.
const DEFAULT_REST_URL: &str = "http://localhost:17020/rest/v1";
const DEFAULT_FUNCTIONS_URL: &str = "http://localhost:17020/functions/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the REST data API
    pub rest_url: String,
    /// Base URL of the hosted functions (recommendation service)
    pub functions_url: String,
    /// Key sent as `apikey` and bearer token to both endpoints
    pub api_key: Option<String>,
    /// Language for messages and for generated recommendations
    pub locale: Locale,
    /// How many recommendations to request per fetch
    pub recommendation_count: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            functions_url: DEFAULT_FUNCTIONS_URL.to_string(),
            api_key: None,
            locale: Locale::default(),
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Apply `FEATURE_POLICIES_*` overrides looked up through `var`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("FEATURE_POLICIES_REST_URL") {
            self.rest_url = url;
        }
        if let Some(url) = var("FEATURE_POLICIES_FUNCTIONS_URL") {
            self.functions_url = url;
        }
        if let Some(key) = var("FEATURE_POLICIES_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(locale) = var("FEATURE_POLICIES_LOCALE") {
            match locale.parse() {
                Ok(locale) => self.locale = locale,
                Err(e) => tracing::warn!("Ignoring FEATURE_POLICIES_LOCALE: {}", e),
            }
        }
        if let Some(count) = var("FEATURE_POLICIES_RECOMMENDATION_COUNT") {
            match count.parse::<u32>() {
                Ok(count) if count > 0 => self.recommendation_count = count,
                _ => tracing::warn!("Ignoring FEATURE_POLICIES_RECOMMENDATION_COUNT={}", count),
            }
        }
        self
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
