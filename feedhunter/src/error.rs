use std::path::PathBuf;

use thiserror::Error;

/**
    Errors from fetching a feed page.

    None of these are fatal to a caller: the fetcher converts every one
    of them into a cached result and keeps the error for the status line.
*/
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("invalid gateway URL '{url}': {reason}")]
    Gateway { url: String, reason: String },

    #[error("gateway envelope: {0}")]
    Envelope(String),

    #[error("page parsed to zero feeds")]
    NoFeeds,
}

/**
    Errors from loading or compiling an extraction rule set.
*/
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rule set {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rule set '{name}': {source}")]
    Yaml {
        name: String,
        source: serde_yaml::Error,
    },

    #[error("rule set '{0}' not found")]
    NotFound(String),

    #[error("invalid regex '{pattern}' for {rule}: {source}")]
    Regex {
        rule: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid CSS selector '{selector}' for {rule}: {reason}")]
    Selector {
        rule: String,
        selector: String,
        reason: String,
    },

    #[error("{rule} requires '{what}'")]
    Missing { rule: String, what: &'static str },
}

/**
    Errors from loading a configuration file.
*/
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/**
    Errors from writing a bouquet file.
*/
#[derive(Debug, Error)]
pub enum BouquetError {
    #[error("bouquet {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/**
    Errors reported by a receiver backend.
*/
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("invalid receiver URL '{url}': {reason}")]
    Url { url: String, reason: String },

    #[error("receiver request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("receiver answered with status {0}")]
    Status(u16),

    #[error("receiver rejected the request: {0}")]
    Rejected(String),

    #[error("{0} is not supported by this receiver")]
    Unsupported(&'static str),
}

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}
