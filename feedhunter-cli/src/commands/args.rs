use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use feedhunter::FeedConfig;

/**
    Options shared by every command. Flags override the config file, which
    overrides built-in defaults.
*/
#[derive(Args, Debug, Clone, Default)]
pub struct FeedArgs {
    /// YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Listing page URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Embedded rule set ID (see `sources`)
    #[arg(long, global = true)]
    pub rules: Option<String>,

    /// Rule set YAML file, overrides --rules
    #[arg(long, global = true)]
    pub rules_file: Option<PathBuf>,

    /// Feed cache file
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Outbound HTTP or SOCKS proxy URL
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Gateway URL that wraps pages as {"contents": "..."}
    #[arg(long, global = true)]
    pub gateway: Option<String>,
}

impl FeedArgs {
    pub fn load(&self) -> Result<FeedConfig> {
        let mut config = match &self.config {
            Some(path) => FeedConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => FeedConfig::default(),
        };

        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(rules) = &self.rules {
            config.rules = rules.clone();
        }
        if let Some(path) = &self.rules_file {
            config.rules_file = Some(path.clone());
        }
        if let Some(path) = &self.cache {
            config.cache_path = Some(path.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }
        if let Some(gateway) = &self.gateway {
            config.gateway = Some(gateway.clone());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_is_default_config() {
        let config = FeedArgs::default().load().unwrap();
        assert_eq!(config.url, feedhunter::FeedConfig::default().url);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_flags_override() {
        let args = FeedArgs {
            rules: Some("satelliweb_text".to_string()),
            proxy: Some("socks5://127.0.0.1:1080".to_string()),
            cache: Some(PathBuf::from("/tmp/feeds.json")),
            ..FeedArgs::default()
        };
        let config = args.load().unwrap();
        assert_eq!(config.rules, "satelliweb_text");
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/feeds.json")));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = FeedArgs {
            config: Some(PathBuf::from("/nonexistent/feedhunter.yaml")),
            ..FeedArgs::default()
        };
        assert!(args.load().is_err());
    }
}
