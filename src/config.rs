//! Configuration file parser for ~/.config/changefeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged as warnings since they are usually typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::feed::ExecutionContext;
use crate::widget::{DEFAULT_MAX_POSTS, DEFAULT_REFRESH_MINUTES};

/// Upstream changelog feed.
pub const DEFAULT_FEED_URL: &str = "https://expo.dev/changelog/rss.xml";
/// Public CORS relay used from browser contexts.
pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid URL for `{key}`: {reason}")]
    InvalidUrl { key: &'static str, reason: String },

    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RSS document to ingest.
    pub feed_url: String,

    /// Relay base; the feed URL is passed as its `url` query parameter.
    pub relay_url: String,

    /// `native` fetches directly, `browser` goes through the relay.
    pub context: ExecutionContext,

    /// Posts kept in a widget snapshot.
    pub widget_max_posts: usize,

    /// Suggested minutes between widget timeline reloads.
    pub widget_refresh_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            context: ExecutionContext::detect(),
            widget_max_posts: DEFAULT_MAX_POSTS,
            widget_refresh_minutes: DEFAULT_REFRESH_MINUTES,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "feed_url",
        "relay_url",
        "context",
        "widget_max_posts",
        "widget_refresh_minutes",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.feed_url()?;
        config.relay_url()?;
        if config.widget_refresh_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "widget_refresh_minutes",
                reason: format!("must be positive, got {}", config.widget_refresh_minutes),
            });
        }
        tracing::info!(
            path = %path.display(),
            feed = %config.feed_url,
            context = ?config.context,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        parse_http_url("feed_url", &self.feed_url)
    }

    pub fn relay_url(&self) -> Result<Url, ConfigError> {
        parse_http_url("relay_url", &self.relay_url)
    }
}

/// Only http(s) URLs are fetchable.
fn parse_http_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        key,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            key,
            reason: format!("unsupported scheme {scheme} (only http/https allowed)"),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
