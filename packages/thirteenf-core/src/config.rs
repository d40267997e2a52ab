//! Tracker configuration.
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! fund_name = "Atreides Management"
//! significance_threshold = 0.5
//! filings_dir = "/var/lib/thirteenf/filings"
//! top_holdings = 10
//! top_moves = 5
//! ```

use crate::analyzer::{PortfolioAnalyzer, DEFAULT_SIGNIFICANCE_THRESHOLD};
use crate::resolver::JsonTickerCache;
use crate::state::StateManager;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Display name of the tracked fund
    pub fund_name: String,
    /// Minimum weight change in percentage points
    pub significance_threshold: f64,
    /// Directory of JSON filings
    pub filings_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker_cache_file: Option<PathBuf>,
    /// Rows in the top-holdings view
    pub top_holdings: usize,
    /// Rows in the top buys / sells views
    pub top_moves: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fund_name: "Fund".to_string(),
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
            filings_dir: PathBuf::from("filings"),
            state_file: None,
            ticker_cache_file: None,
            top_holdings: 10,
            top_moves: 5,
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.thirteenf/config.toml`
    /// Can be overridden with `THIRTEENF_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("THIRTEENF_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".thirteenf/config.toml"))
            .unwrap_or_else(|| PathBuf::from("thirteenf.toml"))
    }

    /// Load from the default path, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&Self::default_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `THIRTEENF_THRESHOLD` and `THIRTEENF_FILINGS_DIR`.
    ///
    /// Unparseable threshold values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(threshold) = env::var("THIRTEENF_THRESHOLD") {
            if let Ok(value) = threshold.trim().parse::<f64>() {
                self.significance_threshold = value;
            }
        }

        if let Ok(dir) = env::var("THIRTEENF_FILINGS_DIR") {
            if !dir.is_empty() {
                self.filings_dir = PathBuf::from(dir);
            }
        }
    }

    /// Build the analyzer for the configured threshold.
    pub fn analyzer(&self) -> Result<PortfolioAnalyzer> {
        PortfolioAnalyzer::try_new(self.significance_threshold)
    }

    pub fn state_manager(&self) -> StateManager {
        match &self.state_file {
            Some(path) => StateManager::with_path(path.clone()),
            None => StateManager::new(),
        }
    }

    pub fn ticker_cache(&self) -> JsonTickerCache {
        match &self.ticker_cache_file {
            Some(path) => JsonTickerCache::open(path.clone()),
            None => JsonTickerCache::open_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.significance_threshold, DEFAULT_SIGNIFICANCE_THRESHOLD);
        assert_eq!(config.top_holdings, 10);
        assert_eq!(config.top_moves, 5);
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            fund_name = "Atreides Management"
            significance_threshold = 1.5
            state_file = "/tmp/state.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.fund_name, "Atreides Management");
        assert_eq!(config.significance_threshold, 1.5);
        assert_eq!(config.state_file, Some(PathBuf::from("/tmp/state.json")));
        assert_eq!(config.top_moves, 5);
        assert_eq!(config.analyzer().unwrap().significance_threshold(), 1.5);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("significance_threshold = \"high\"");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_negative_threshold_rejected_by_analyzer() {
        let config = Config {
            significance_threshold: -1.0,
            ..Config::default()
        };
        assert!(matches!(config.analyzer(), Err(Error::InvalidThreshold(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "top_holdings = 3\nfilings_dir = \"data\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.top_holdings, 3);
        assert_eq!(config.filings_dir, PathBuf::from("data"));
    }
}
