use std::future::Future;

use reqwest::{Client, Proxy, StatusCode, Url};
use serde::Deserialize;

use crate::cache::FeedCache;
use crate::config::{EmptyPagePolicy, FeedConfig};
use crate::error::{ConfigError, FetchError};
use crate::parser::FeedParser;
use crate::types::FeedRecord;

/// Where a fetch result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Live,
    Cached,
}

/**
    Result of one fetch. Never an error: failures fall back to the cache and
    the reason is kept in `failure` for the status line.
*/
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<FeedRecord>,
    pub source: FeedSource,
    pub failure: Option<FetchError>,
}

/**
    Anything that can produce a listing page body for a URL.
*/
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/**
    Single-attempt HTTP GET with a bounded timeout, optionally through a proxy
    and/or a JSON-envelope gateway.
*/
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    gateway: Option<String>,
}

impl HttpPageSource {
    pub fn new(config: &FeedConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone());

        if let Some(proxy_url) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            gateway: config.gateway.clone(),
        })
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let request = match &self.gateway {
            Some(gateway) => self.client.get(gateway_url(gateway, url)?),
            None => self.client.get(url),
        };

        tracing::debug!(url, gateway = ?self.gateway, "[fetcher] GET");
        let response = request.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;

        if self.gateway.is_some() {
            unwrap_envelope(&body)
        } else {
            Ok(body)
        }
    }
}

/// `<gateway>?url=<target>`, keeping any query the gateway URL already has.
fn gateway_url(gateway: &str, target: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(gateway).map_err(|e| FetchError::Gateway {
        url: gateway.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("url", target);
    Ok(url)
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    contents: Option<String>,
}

fn unwrap_envelope(body: &str) -> Result<String, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| FetchError::Envelope(format!("not a JSON envelope: {}", e)))?;
    envelope
        .contents
        .ok_or_else(|| FetchError::Envelope("missing 'contents'".to_string()))
}

/**
    Fetch, parse, cache; on any failure, the cache.

    Stateless per call: one attempt, no retry loop. Callers re-invoke (manual
    refresh or a timer) to retry.
*/
#[derive(Debug)]
pub struct FeedFetcher<S = HttpPageSource> {
    source: S,
    parser: FeedParser,
    cache: FeedCache,
    empty_page: EmptyPagePolicy,
}

impl FeedFetcher<HttpPageSource> {
    /// HTTP fetcher with the rule set, cache and policy the config selects.
    pub fn from_config(config: &FeedConfig) -> Result<Self, ConfigError> {
        let parser = FeedParser::new(&config.rule_set()?)?;
        Ok(Self::new(HttpPageSource::new(config)?, parser, config.cache())
            .with_empty_page_policy(config.empty_page))
    }
}

impl<S: PageSource> FeedFetcher<S> {
    pub fn new(source: S, parser: FeedParser, cache: FeedCache) -> Self {
        Self {
            source,
            parser,
            cache,
            empty_page: EmptyPagePolicy::default(),
        }
    }

    pub fn with_empty_page_policy(mut self, policy: EmptyPagePolicy) -> Self {
        self.empty_page = policy;
        self
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn page_source(&self) -> &S {
        &self.source
    }

    pub fn parser(&self) -> &FeedParser {
        &self.parser
    }

    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        match self.fetch_live(url).await {
            Ok((records, persist)) => {
                if persist {
                    self.cache.save(&records);
                }
                tracing::info!(
                    url,
                    rules = self.parser.rule_set_id(),
                    records = records.len(),
                    "[fetcher] Fetched live feeds"
                );
                FetchOutcome {
                    records,
                    source: FeedSource::Live,
                    failure: None,
                }
            }
            Err(e) => {
                let records = self.cache.load();
                tracing::warn!(
                    url,
                    error = %e,
                    cached = records.len(),
                    "[fetcher] Live fetch failed, using cache"
                );
                FetchOutcome {
                    records,
                    source: FeedSource::Cached,
                    failure: Some(e),
                }
            }
        }
    }

    /// Live records, and whether they are worth persisting.
    async fn fetch_live(&self, url: &str) -> Result<(Vec<FeedRecord>, bool), FetchError> {
        let body = self.source.fetch_page(url).await?;
        let records = self.parser.parse(&body);

        if !records.is_empty() {
            return Ok((records, true));
        }

        match self.empty_page {
            EmptyPagePolicy::Cache => Err(FetchError::NoFeeds),
            EmptyPagePolicy::Empty => Ok((records, false)),
            EmptyPagePolicy::Placeholder => Ok((vec![placeholder_record()], false)),
        }
    }
}

/// Diagnostic stand-in shown when a page parses to nothing.
pub fn placeholder_record() -> FeedRecord {
    FeedRecord {
        category: "Diagnostic".to_string(),
        event_title: "No live feeds parsed".to_string(),
        ..FeedRecord::new("0.0°E")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;

    use super::*;
    use crate::rules::find_by_id;
    use crate::testing::{StaticPage, serve};
    use crate::types::Polarization;

    const ONE_FEED: &str = r#"<html><body>
        <div class="feed">
            <b>Hispasat (12.5°W)</b><br>
            Frequency: 11585 - Pol: V - SR: 27500<br>
            News uplink
        </div>
    </body></html>"#;

    fn parser() -> FeedParser {
        FeedParser::new(&find_by_id("satelliweb").unwrap()).unwrap()
    }

    fn cached_records() -> Vec<FeedRecord> {
        vec![FeedRecord {
            frequency_mhz: 10990,
            symbol_rate_ksym: 7200,
            ..FeedRecord::new("7.0°E")
        }]
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path().join("feeds.json"));
        cache.save(&cached_records());

        let fetcher = FeedFetcher::new(StaticPage::failing(), parser(), cache);
        let outcome = fetcher.fetch("http://feeds.invalid/").await;

        assert_eq!(outcome.source, FeedSource::Cached);
        assert_eq!(outcome.records, cached_records());
        assert!(matches!(outcome.failure, Some(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path().join("feeds.json"));

        let fetcher = FeedFetcher::new(StaticPage::failing(), parser(), cache);
        let outcome = fetcher.fetch("http://feeds.invalid/").await;

        assert_eq!(outcome.source, FeedSource::Cached);
        assert!(outcome.records.is_empty());
    }

    #[tokio::test]
    async fn test_live_fetch_updates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path().join("feeds.json"));

        let fetcher = FeedFetcher::new(StaticPage::ok(ONE_FEED), parser(), cache.clone());
        let outcome = fetcher.fetch("http://feeds.invalid/").await;

        assert_eq!(outcome.source, FeedSource::Live);
        assert!(outcome.failure.is_none());
        assert_eq!(cache.load(), outcome.records);
    }

    #[tokio::test]
    async fn test_empty_page_policies() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path().join("feeds.json"));
        cache.save(&cached_records());
        let empty_page = "<html><body><p>Maintenance</p></body></html>";

        let fetcher = FeedFetcher::new(StaticPage::ok(empty_page), parser(), cache.clone());
        let outcome = fetcher.fetch("http://feeds.invalid/").await;
        assert_eq!(outcome.source, FeedSource::Cached);
        assert_eq!(outcome.records, cached_records());
        assert!(matches!(outcome.failure, Some(FetchError::NoFeeds)));

        let fetcher = FeedFetcher::new(StaticPage::ok(empty_page), parser(), cache.clone())
            .with_empty_page_policy(EmptyPagePolicy::Empty);
        let outcome = fetcher.fetch("http://feeds.invalid/").await;
        assert_eq!(outcome.source, FeedSource::Live);
        assert!(outcome.records.is_empty());

        let fetcher = FeedFetcher::new(StaticPage::ok(empty_page), parser(), cache.clone())
            .with_empty_page_policy(EmptyPagePolicy::Placeholder);
        let outcome = fetcher.fetch("http://feeds.invalid/").await;
        assert_eq!(outcome.source, FeedSource::Live);
        assert_eq!(outcome.records, vec![placeholder_record()]);

        // Neither policy overwrites the last good snapshot.
        assert_eq!(cache.load(), cached_records());
    }

    #[tokio::test]
    async fn test_http_end_to_end() {
        let addr = serve(Router::new().route("/livef", get(|| async { ONE_FEED }))).await;
        let dir = tempfile::tempdir().unwrap();
        let config = FeedConfig {
            url: format!("http://{}/livef", addr),
            cache_path: Some(dir.path().join("feeds.json")),
            ..FeedConfig::default()
        };

        let fetcher = FeedFetcher::from_config(&config).unwrap();
        let outcome = fetcher.fetch(&config.url).await;

        assert_eq!(outcome.source, FeedSource::Live);
        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.orbital_position, 3475);
        assert_eq!(record.frequency_mhz, 11585);
        assert_eq!(record.polarization, Polarization::Vertical);
        assert_eq!(record.symbol_rate_ksym, 27500);
    }

    #[tokio::test]
    async fn test_http_error_status_uses_cache() {
        let addr = serve(Router::new().route(
            "/livef",
            get(|| async { (AxumStatus::BAD_GATEWAY, "upstream down") }),
        ))
        .await;
        let dir = tempfile::tempdir().unwrap();
        let config = FeedConfig {
            cache_path: Some(dir.path().join("feeds.json")),
            ..FeedConfig::default()
        };
        config.cache().save(&cached_records());

        let fetcher = FeedFetcher::from_config(&config).unwrap();
        let outcome = fetcher.fetch(&format!("http://{}/livef", addr)).await;

        assert_eq!(outcome.source, FeedSource::Cached);
        assert_eq!(outcome.records, cached_records());
        assert!(matches!(outcome.failure, Some(FetchError::Status(502))));
    }

    #[tokio::test]
    async fn test_http_timeout_uses_cache() {
        let addr = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                ONE_FEED
            }),
        ))
        .await;
        let dir = tempfile::tempdir().unwrap();
        let config = FeedConfig {
            timeout_secs: 1,
            cache_path: Some(dir.path().join("feeds.json")),
            ..FeedConfig::default()
        };

        let fetcher = FeedFetcher::from_config(&config).unwrap();
        let outcome = fetcher.fetch(&format!("http://{}/slow", addr)).await;

        assert_eq!(outcome.source, FeedSource::Cached);
        assert!(matches!(outcome.failure, Some(FetchError::Http(_))));
    }

    #[tokio::test]
    async fn test_gateway_envelope() {
        let addr = serve(Router::new().route(
            "/raw",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.get("url").map(String::as_str) == Some("https://feeds.example/livef") {
                    serde_json::json!({ "contents": ONE_FEED }).to_string()
                } else {
                    serde_json::json!({ "status": "bad url" }).to_string()
                }
            }),
        ))
        .await;
        let dir = tempfile::tempdir().unwrap();
        let config = FeedConfig {
            gateway: Some(format!("http://{}/raw", addr)),
            cache_path: Some(dir.path().join("feeds.json")),
            ..FeedConfig::default()
        };

        let fetcher = FeedFetcher::from_config(&config).unwrap();

        let outcome = fetcher.fetch("https://feeds.example/livef").await;
        assert_eq!(outcome.source, FeedSource::Live);
        assert_eq!(outcome.records.len(), 1);

        let outcome = fetcher.fetch("https://feeds.example/other").await;
        assert_eq!(outcome.source, FeedSource::Cached);
        assert!(matches!(outcome.failure, Some(FetchError::Envelope(_))));
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(
            unwrap_envelope(r#"{"contents": "<div>x</div>", "status": {}}"#).unwrap(),
            "<div>x</div>"
        );
        assert!(unwrap_envelope("<html></html>").is_err());
        assert!(unwrap_envelope(r#"{"contents": null}"#).is_err());
    }

    #[test]
    fn test_gateway_url() {
        let url = gateway_url("https://gw.example/get?raw=1", "https://a.example/x?y=1&z=2").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gw.example/get?raw=1&url=https%3A%2F%2Fa.example%2Fx%3Fy%3D1%26z%3D2"
        );
        assert!(matches!(
            gateway_url("not a url", "https://a.example"),
            Err(FetchError::Gateway { .. })
        ));
    }
}
