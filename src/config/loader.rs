//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.
//! Every field has a default, so an empty file (or a missing section) is valid.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::{RankKey, ScoringStrategy, DEFAULT_DENYLIST, DEFAULT_TOP_N};

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub filters: FiltersSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Ranking pipeline section
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Number of tokens kept in the ranked view
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Share of the scored population flagged as highlighted (0.10 = top decile)
    #[serde(default = "default_highlight_fraction")]
    pub highlight_fraction: f64,
    /// Sort key: "momentum_score", "completion_pct" or "volume"
    #[serde(default)]
    pub rank_key: RankKey,
    /// Primary scoring strategy: "earliness", "turnover" or "amplitude"
    #[serde(default)]
    pub scoring_strategy: ScoringStrategy,
    /// Upper bound on how long the join waits for any single adapter
    #[serde(default = "default_adapter_wait_secs")]
    pub adapter_wait_secs: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            highlight_fraction: default_highlight_fraction(),
            rank_key: RankKey::default(),
            scoring_strategy: ScoringStrategy::default(),
            adapter_wait_secs: default_adapter_wait_secs(),
        }
    }
}

/// Upstream provider section
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSection {
    /// CoinGecko v3 API base URL
    #[serde(default = "default_coingecko_api_url")]
    pub coingecko_api_url: String,
    /// OKX API base URL
    #[serde(default = "default_okx_api_url")]
    pub okx_api_url: String,
    /// Quote currency for CoinGecko listings
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    /// Listing page size for the fallback source (CoinGecko max 250)
    #[serde(default = "default_listing_per_page")]
    pub listing_per_page: u32,
    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            coingecko_api_url: default_coingecko_api_url(),
            okx_api_url: default_okx_api_url(),
            vs_currency: default_vs_currency(),
            listing_per_page: default_listing_per_page(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SourcesSection {
    /// Get CoinGecko URL with environment variable override
    /// Checks COINGECKO_API_URL env var first, falls back to config value
    pub fn get_coingecko_api_url(&self) -> String {
        env_override("COINGECKO_API_URL").unwrap_or_else(|| self.coingecko_api_url.clone())
    }

    /// Get OKX URL with environment variable override
    /// Checks OKX_API_URL env var first, falls back to config value
    pub fn get_okx_api_url(&self) -> String {
        env_override("OKX_API_URL").unwrap_or_else(|| self.okx_api_url.clone())
    }
}

/// Blank values count as unset
fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Exclusion filters section
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersSection {
    /// Stable / fiat-pegged symbols excluded before scoring
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl Default for FiltersSection {
    fn default() -> Self {
        Self { denylist: default_denylist() }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_highlight_fraction() -> f64 {
    crate::domain::scorer::DEFAULT_HIGHLIGHT_FRACTION
}

fn default_adapter_wait_secs() -> u64 {
    15
}

fn default_coingecko_api_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_okx_api_url() -> String {
    "https://www.okx.com".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_listing_per_page() -> u32 {
    100
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "top_n must be > 0".to_string(),
            ));
        }

        if !(self.pipeline.highlight_fraction > 0.0 && self.pipeline.highlight_fraction <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "highlight_fraction must be in (0, 1], got {}",
                self.pipeline.highlight_fraction
            )));
        }

        if self.pipeline.adapter_wait_secs == 0 {
            return Err(ConfigError::ValidationError(
                "adapter_wait_secs must be > 0".to_string(),
            ));
        }

        if self.sources.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.sources.coingecko_api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "coingecko_api_url cannot be empty".to_string(),
            ));
        }

        if self.sources.okx_api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "okx_api_url cannot be empty".to_string(),
            ));
        }

        if self.sources.vs_currency.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vs_currency cannot be empty".to_string(),
            ));
        }

        if self.sources.listing_per_page == 0 || self.sources.listing_per_page > 250 {
            return Err(ConfigError::ValidationError(format!(
                "listing_per_page must be 1-250, got {}",
                self.sources.listing_per_page
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[pipeline]
top_n = 50
highlight_fraction = 0.2
rank_key = "completion_pct"
scoring_strategy = "turnover"
adapter_wait_secs = 5

[sources]
coingecko_api_url = "https://api.coingecko.com/api/v3"
okx_api_url = "https://www.okx.com"
vs_currency = "usd"
listing_per_page = 250
request_timeout_secs = 8

[filters]
denylist = ["USDT", "USDC"]

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.pipeline.top_n, 50);
        assert_eq!(config.pipeline.highlight_fraction, 0.2);
        assert_eq!(config.pipeline.rank_key, RankKey::CompletionPct);
        assert_eq!(config.pipeline.scoring_strategy, ScoringStrategy::Turnover);
        assert_eq!(config.sources.listing_per_page, 250);
        assert_eq!(config.filters.denylist, vec!["USDT", "USDC"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.pipeline.top_n, 100);
        assert_eq!(config.pipeline.highlight_fraction, 0.10);
        assert_eq!(config.pipeline.rank_key, RankKey::MomentumScore);
        assert_eq!(config.pipeline.scoring_strategy, ScoringStrategy::Earliness);
        assert_eq!(config.sources.request_timeout_secs, 10);
        assert!(config.filters.denylist.iter().any(|s| s == "USDT"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_shipped_default_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = load_config(path).unwrap();

        assert_eq!(config.pipeline.top_n, DEFAULT_TOP_N);
        assert_eq!(config.pipeline.adapter_wait_secs, 15);
        assert_eq!(config.sources.okx_api_url, "https://www.okx.com");
        assert_eq!(config.filters.denylist.len(), DEFAULT_DENYLIST.len());
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/momentum-radar.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_bad_toml() {
        let file = write_config("[pipeline\ntop_n = ");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_rank_key_rejected() {
        let file = write_config("[pipeline]\nrank_key = \"hype\"\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_top_n() {
        let file = write_config("[pipeline]\ntop_n = 0\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_highlight_fraction() {
        for fraction in ["0.0", "1.5", "-0.1"] {
            let file = write_config(&format!("[pipeline]\nhighlight_fraction = {}\n", fraction));
            assert!(matches!(
                load_config(file.path()).unwrap_err(),
                ConfigError::ValidationError(_)
            ));
        }
    }

    #[test]
    fn test_invalid_page_size() {
        let file = write_config("[sources]\nlisting_per_page = 500\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_blank_env_override_ignored() {
        let key = "MOMENTUM_RADAR_TEST_BLANK_URL";
        std::env::set_var(key, "   ");
        assert_eq!(env_override(key), None);

        std::env::set_var(key, "http://127.0.0.1:9000");
        assert_eq!(env_override(key).as_deref(), Some("http://127.0.0.1:9000"));

        std::env::remove_var(key);
        assert_eq!(env_override(key), None);
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut config = Config::default();
        config.sources.okx_api_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
