use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::display::status_line;
use crate::fetcher::{FeedFetcher, FeedSource, HttpPageSource, PageSource};
use crate::filter::FeedFilter;
use crate::types::FeedRecord;

/**
    The record list as of the last completed refresh.
*/
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<FeedRecord>>,
    pub source: FeedSource,
    /// `None` until the first refresh completes.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Why the last refresh fell back to the cache.
    pub failure: Option<String>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            source: FeedSource::Cached,
            fetched_at: None,
            failure: None,
        }
    }

    pub fn status(&self) -> String {
        status_line(self.records.len(), self.source)
    }

    /// Status line for the records left after `filter`.
    pub fn filtered_status(&self, filter: &FeedFilter) -> String {
        let count = self.records.iter().filter(|r| filter.matches(r)).count();
        status_line(count, self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fetch ran and its result replaced the snapshot.
    Completed { source: FeedSource, records: usize },
    /// Another refresh was already in flight; this request was dropped.
    Skipped,
}

/**
    Owns the "fetching / idle" state around a [`FeedFetcher`].

    At most one fetch runs at a time. A refresh requested while one is in
    flight is dropped, not queued, so the snapshot has a single writer.
*/
#[derive(Debug)]
pub struct FeedBoard<S = HttpPageSource> {
    fetcher: FeedFetcher<S>,
    url: String,
    snapshot: RwLock<Snapshot>,
    fetching: AtomicBool,
}

/// Clears the fetching flag when a refresh ends, including when its future is dropped.
struct FetchingGuard<'a>(&'a AtomicBool);

impl Drop for FetchingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: PageSource> FeedBoard<S> {
    pub fn new(fetcher: FeedFetcher<S>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            snapshot: RwLock::new(Snapshot::empty()),
            fetching: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Record at `index` in the current snapshot.
    pub fn get(&self, index: usize) -> Option<FeedRecord> {
        self.snapshot.read().records.get(index).cloned()
    }

    /// Seed the board from the cache without touching the network.
    pub fn load_cached(&self) -> usize {
        let records = self.fetcher.cache().load();
        let count = records.len();
        let mut snapshot = self.snapshot.write();
        snapshot.records = Arc::new(records);
        snapshot.source = FeedSource::Cached;
        count
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(url = %self.url, "[board] Refresh already running, dropping request");
            return RefreshOutcome::Skipped;
        }
        let _guard = FetchingGuard(&self.fetching);

        let outcome = self.fetcher.fetch(&self.url).await;
        let count = outcome.records.len();

        *self.snapshot.write() = Snapshot {
            records: Arc::new(outcome.records),
            source: outcome.source,
            fetched_at: Some(Utc::now()),
            failure: outcome.failure.map(|e| e.to_string()),
        };

        RefreshOutcome::Completed {
            source: outcome.source,
            records: count,
        }
    }
}

impl<S: PageSource + 'static> FeedBoard<S> {
    /**
        Refresh every `period` until `shutdown` flips to `true` or its sender
        is dropped. The first tick fires immediately.
    */
    pub fn spawn_auto_refresh(
        self: &Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let board = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                url = %board.url,
                period_secs = period.as_secs(),
                "[board] Auto-refresh started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let RefreshOutcome::Completed { source, records } = board.refresh().await {
                            tracing::info!(?source, records, "[board] Auto-refresh");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!(url = %board.url, "[board] Auto-refresh stopped");
        })
    }
}
