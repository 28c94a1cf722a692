//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB client settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// TMDB client configuration. Unset fields use the client defaults.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// API key (`TMDB_API_KEY` takes precedence).
    #[serde(default)]
    pub api_key: Option<String>,
    /// User-Agent header.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// API v3 base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Website base URL used for authorization links.
    #[serde(default)]
    pub web_base_url: Option<String>,
    /// Image CDN base URL.
    #[serde(default)]
    pub image_base_url: Option<String>,
    /// Poster width segment (e.g. `w500`).
    #[serde(default)]
    pub poster_width: Option<String>,
    /// Redirect URI after website authorization.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

impl TmdbConfig {
    /// Keys accepted by [`TmdbConfig::set`].
    pub const KEYS: [&str; 7] = [
        "api_key",
        "user_agent",
        "base_url",
        "web_base_url",
        "image_base_url",
        "poster_width",
        "redirect_to",
    ];

    /// Sets one field by its TOML key.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not one of [`TmdbConfig::KEYS`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let slot = match key {
            "api_key" => &mut self.api_key,
            "user_agent" => &mut self.user_agent,
            "base_url" => &mut self.base_url,
            "web_base_url" => &mut self.web_base_url,
            "image_base_url" => &mut self.image_base_url,
            "poster_width" => &mut self.poster_width,
            "redirect_to" => &mut self.redirect_to,
            _ => bail!(
                "unknown key `{key}` (expected one of: {})",
                Self::KEYS.join(", ")
            ),
        };
        *slot = Some(String::from(value));
        Ok(())
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
