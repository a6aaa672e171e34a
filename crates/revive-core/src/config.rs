//! Configuration for sitemap discovery, content extraction and model access.
//!
//! Configuration is stored in TOML format. Every table and field is optional;
//! anything left out falls back to the defaults documented on each field.
//!
//! ## File Location
//!
//! 1. `$REVIVE_CONFIG` when set (path to a TOML file)
//! 2. The platform config directory, e.g. `~/.config/revive/config.toml` on Linux
//!
//! A missing file is not an error. A file that exists but cannot be parsed is.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [http]
//! page_timeout_secs = 30
//!
//! [extract]
//! min_post_words = 80
//!
//! [model]
//! model = "claude-sonnet-4-5"
//!
//! [pricing]
//! input_usd_per_mtok = 3.0
//! output_usd_per_mtok = 15.0
//!
//! [paths]
//! output_dir = "rewrites"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "REVIVE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeouts and request identities for outbound HTTP.
    pub http: HttpConfig,
    /// Thresholds used when extracting post content.
    pub extract: ExtractConfig,
    /// Language model API settings.
    pub model: ModelConfig,
    /// Token pricing used for cost tracking.
    pub pricing: Pricing,
    /// Output locations.
    pub paths: PathsConfig,
}

/// Timeouts and request identities for outbound HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout for fetching `robots.txt`.
    pub robots_timeout_secs: u64,
    /// Timeout for each sitemap document.
    pub sitemap_timeout_secs: u64,
    /// Timeout for each direct post fetch attempt.
    pub page_timeout_secs: u64,
    /// Timeout for the WordPress REST fallback.
    pub api_fallback_timeout_secs: u64,
    /// User agent that openly identifies the crawler.
    pub bot_user_agent: String,
    /// User agent used by the browser-like header profile.
    pub browser_user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            robots_timeout_secs: 10,
            sitemap_timeout_secs: 15,
            page_timeout_secs: 20,
            api_fallback_timeout_secs: 15,
            bot_user_agent: concat!(
                "Mozilla/5.0 (compatible; BlogReviveBot/",
                env!("CARGO_PKG_VERSION"),
                ")"
            )
            .to_string(),
            browser_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl HttpConfig {
    /// `robots.txt` timeout as a [`Duration`].
    pub const fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs)
    }

    /// Sitemap fetch timeout as a [`Duration`].
    pub const fn sitemap_timeout(&self) -> Duration {
        Duration::from_secs(self.sitemap_timeout_secs)
    }

    /// Direct page fetch timeout as a [`Duration`].
    pub const fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// REST fallback timeout as a [`Duration`].
    pub const fn api_fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.api_fallback_timeout_secs)
    }
}

/// Thresholds used when extracting post content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Minimum words a selector match must contain to be taken as the content region.
    pub min_region_words: usize,
    /// Minimum words an extraction must contain to count as a usable post.
    pub min_post_words: usize,
    /// How many leading characters of a response are scanned for challenge markers.
    pub challenge_scan_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_region_words: 100,
            min_post_words: 50,
            challenge_scan_chars: 5000,
        }
    }
}

/// Language model API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the Messages API.
    pub api_base: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Token ceiling for the audit pass.
    pub audit_max_tokens: u32,
    /// Token ceiling for the rewrite pass.
    pub rewrite_max_tokens: u32,
    /// Post body characters included in prompts.
    pub max_body_chars: usize,
    /// Site pages listed in prompts.
    pub max_site_pages: usize,
    /// Timeout for a single model request.
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            audit_max_tokens: 1024,
            rewrite_max_tokens: 4096,
            max_body_chars: 8000,
            max_site_pages: 100,
            request_timeout_secs: 300,
        }
    }
}

impl ModelConfig {
    /// Model request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Token pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    /// Price per million input tokens.
    pub input_usd_per_mtok: f64,
    /// Price per million output tokens.
    pub output_usd_per_mtok: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_usd_per_mtok: 3.0,
            output_usd_per_mtok: 15.0,
        }
    }
}

impl Pricing {
    /// USD cost of a request with the given token counts.
    #[allow(clippy::cast_precision_loss)]
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64).mul_add(
            self.input_usd_per_mtok / 1_000_000.0,
            output_tokens as f64 * self.output_usd_per_mtok / 1_000_000.0,
        )
    }
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory rewritten posts are written to.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    /// Load configuration from `$REVIVE_CONFIG` or the platform config directory.
    ///
    /// Returns defaults when no file exists.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`Config::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.extract.min_post_words == 0 {
            return Err(Error::Config("extract.min_post_words must be at least 1".into()));
        }
        if self.extract.challenge_scan_chars == 0 {
            return Err(Error::Config(
                "extract.challenge_scan_chars must be at least 1".into(),
            ));
        }
        if self.pricing.input_usd_per_mtok < 0.0 || self.pricing.output_usd_per_mtok < 0.0 {
            return Err(Error::Config("pricing must not be negative".into()));
        }
        url::Url::parse(&self.model.api_base)
            .map_err(|e| Error::Config(format!("model.api_base is not a valid URL: {e}")))?;
        Ok(())
    }

    /// Platform-specific location of the default config file.
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "revive", "revive")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
