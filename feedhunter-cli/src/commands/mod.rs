mod args;
mod bouquet;
mod list;
mod show;
mod sources;
mod tune;
mod watch;

use anyhow::{Context, Result};

use feedhunter::{FeedBoard, FeedConfig, FeedFetcher, FeedFilter, FeedRecord, FeedRow, Snapshot};

pub use self::args::FeedArgs;
pub use self::bouquet::BouquetCommand;
pub use self::list::ListCommand;
pub use self::show::ShowCommand;
pub use self::sources::SourcesCommand;
pub use self::tune::TuneCommand;
pub use self::watch::WatchCommand;

/// A board with one completed refresh behind it.
async fn fetch_board(config: &FeedConfig) -> Result<FeedBoard> {
    let fetcher = FeedFetcher::from_config(config).context("failed to set up feed fetcher")?;
    let board = FeedBoard::new(fetcher, config.url.clone());
    board.refresh().await;
    Ok(board)
}

/// Look up a feed by the 1-based index `list` prints.
fn feed_at(snapshot: &Snapshot, index: usize) -> Result<FeedRecord> {
    index
        .checked_sub(1)
        .and_then(|i| snapshot.records.get(i))
        .cloned()
        .with_context(|| {
            format!(
                "no feed #{} ({} feeds available)",
                index,
                snapshot.records.len()
            )
        })
}

fn print_snapshot(snapshot: &Snapshot, filter: &FeedFilter) {
    if let Some(failure) = &snapshot.failure {
        eprintln!("Live fetch failed: {}", failure);
    }

    for (i, record) in snapshot.records.iter().enumerate() {
        if !filter.matches(record) {
            continue;
        }
        let row = FeedRow::new(record);
        println!("{:>3}. {}", i + 1, row.headline);
        println!("     {}", row.detail);
    }

    println!();
    println!("{}", snapshot.filtered_status(filter));
}
