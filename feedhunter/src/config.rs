use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::FeedCache;
use crate::error::{ConfigError, RuleError};
use crate::rules::{RuleSet, find_by_id};

pub const DEFAULT_URL: &str = "https://www.satelliweb.com/index.php?section=livef";
pub const DEFAULT_RULES: &str = "satelliweb";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/**
    What a fetch reports when the page loads but no feed entries match.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPagePolicy {
    /// Treat it as a failed fetch and fall back to the cache.
    #[default]
    Cache,
    /// Report a live, empty list.
    Empty,
    /// Report a single diagnostic placeholder feed.
    Placeholder,
}

/**
    Everything the fetcher, cache and feed board need, passed in explicitly.
*/
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Listing page to scrape.
    pub url: String,
    /// ID of an embedded rule set.
    pub rules: String,
    /// Rule set file on disk, overrides `rules`.
    pub rules_file: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Cache file; defaults to the platform's local data directory.
    pub cache_path: Option<PathBuf>,
    /// Outbound HTTP/SOCKS proxy.
    pub proxy: Option<String>,
    /// Gateway that returns the target page wrapped as `{"contents": "..."}`.
    pub gateway: Option<String>,
    pub user_agent: String,
    pub refresh_interval_secs: u64,
    pub empty_page: EmptyPagePolicy,
    pub bouquet_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            rules: DEFAULT_RULES.to_string(),
            rules_file: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_path: None,
            proxy: None,
            gateway: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            empty_page: EmptyPagePolicy::default(),
            bouquet_path: None,
        }
    }
}

impl FeedConfig {
    /// Load a YAML config file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// The rule set this config selects: the file when given, else the embedded ID.
    pub fn rule_set(&self) -> Result<RuleSet, RuleError> {
        match &self.rules_file {
            Some(path) => RuleSet::from_file(path),
            None => find_by_id(&self.rules),
        }
    }

    /// The configured cache path, or the platform default, or `feeds.json` in the working directory.
    pub fn cache(&self) -> FeedCache {
        let path = self
            .cache_path
            .clone()
            .or_else(FeedCache::default_path)
            .unwrap_or_else(|| PathBuf::from("feeds.json"));
        FeedCache::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.empty_page, EmptyPagePolicy::Cache);
        assert_eq!(config.rule_set().unwrap().source.id, "satelliweb");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedhunter.yaml");
        std::fs::write(
            &path,
            "url: http://127.0.0.1:8080/feeds\ntimeout_secs: 20\nempty_page: placeholder\ncache_path: /tmp/feeds.json\n",
        )
        .unwrap();

        let config = FeedConfig::from_file(&path).unwrap();
        assert_eq!(config.url, "http://127.0.0.1:8080/feeds");
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.empty_page, EmptyPagePolicy::Placeholder);
        assert_eq!(config.rules, DEFAULT_RULES);
        assert_eq!(config.cache().path(), Path::new("/tmp/feeds.json"));
    }

    #[test]
    fn test_rules_file_overrides_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(
            &path,
            "source: { id: custom, name: Custom }\nentries: { kind: css, path: li }\nfields:\n  satellite: { kind: line, path: first }\n",
        )
        .unwrap();

        let config = FeedConfig {
            rules_file: Some(path),
            ..FeedConfig::default()
        };
        assert_eq!(config.rule_set().unwrap().source.id, "custom");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = FeedConfig::from_file(Path::new("/nonexistent/feedhunter.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
