use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinHandle;
use tokio::{signal, sync::watch};

use feedhunter::{FeedBoard, FeedConfig, FeedFetcher, FeedFilter};

use super::print_snapshot;

#[derive(Parser, Debug)]
pub struct WatchCommand {
    /// Refresh interval in seconds, overrides the config file
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Only free-to-air feeds
    #[arg(long)]
    pub fta: bool,
}

impl WatchCommand {
    pub async fn run(self, config: &FeedConfig) -> Result<()> {
        let period = self
            .interval
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| config.refresh_interval());
        let filter = if self.fta {
            FeedFilter::FreeToAir
        } else {
            FeedFilter::All
        };

        let fetcher = FeedFetcher::from_config(config).context("failed to set up feed fetcher")?;
        let board = Arc::new(FeedBoard::new(fetcher, config.url.clone()));

        let cached = board.load_cached();
        if cached > 0 {
            println!("Loaded {} cached feeds", cached);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresher = board.spawn_auto_refresh(period, shutdown_rx);

        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut poll = tokio::time::interval(Duration::from_millis(500));
        let mut last_shown = None;

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    let snapshot = board.snapshot();
                    if snapshot.fetched_at.is_some() && snapshot.fetched_at != last_shown {
                        last_shown = snapshot.fetched_at;
                        if let Some(at) = snapshot.fetched_at {
                            println!("── {} ──", at.format("%Y-%m-%d %H:%M:%S UTC"));
                        }
                        print_snapshot(&snapshot, &filter);
                        println!();
                    }
                }
                result = &mut ctrl_c => {
                    result?;
                    break;
                }
            }
        }

        println!("Stopping...");
        stop_refresher(&shutdown_tx, refresher).await
    }
}

/// Signal the auto-refresh task to stop and wait for it, surfacing a panic.
async fn stop_refresher(shutdown: &watch::Sender<bool>, refresher: JoinHandle<()>) -> Result<()> {
    // A closed channel means the task is already gone; the join below reports why.
    let _ = shutdown.send(true);
    refresher.await.context("auto-refresh task failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_refresher_waits_for_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            rx.wait_for(|stop| *stop).await.map(|_| ()).unwrap();
        });

        assert!(stop_refresher(&tx, handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_refresher_reports_panic() {
        let (tx, _rx) = watch::channel(false);
        let handle = tokio::spawn(async { panic!("refresh blew up") });

        let err = stop_refresher(&tx, handle).await.unwrap_err();
        assert_eq!(err.to_string(), "auto-refresh task failed");
    }
}
