use anyhow::Result;
use clap::Parser;

use feedhunter::{FeedConfig, FeedFilter, distinct_categories, distinct_satellites};

use super::{fetch_board, print_snapshot};

#[derive(Parser, Debug, Default)]
pub struct ListCommand {
    /// Only free-to-air feeds
    #[arg(long, conflicts_with_all = ["satellite", "category"])]
    pub fta: bool,

    /// Only feeds on this satellite label, e.g. "7.0°E"
    #[arg(long, conflicts_with = "category")]
    pub satellite: Option<String>,

    /// Only feeds in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Print the distinct satellite labels instead of feeds
    #[arg(long, conflicts_with = "list_categories")]
    pub list_satellites: bool,

    /// Print the distinct categories instead of feeds
    #[arg(long)]
    pub list_categories: bool,
}

impl ListCommand {
    pub async fn run(self, config: &FeedConfig) -> Result<()> {
        let board = fetch_board(config).await?;
        let snapshot = board.snapshot();

        if self.list_satellites {
            for label in distinct_satellites(&snapshot.records) {
                println!("{}", label);
            }
            return Ok(());
        }
        if self.list_categories {
            for category in distinct_categories(&snapshot.records) {
                println!("{}", category);
            }
            return Ok(());
        }

        print_snapshot(&snapshot, &self.filter());
        Ok(())
    }

    fn filter(&self) -> FeedFilter {
        if self.fta {
            FeedFilter::FreeToAir
        } else if let Some(label) = &self.satellite {
            FeedFilter::Satellite(label.clone())
        } else if let Some(category) = &self.category {
            FeedFilter::Category(category.clone())
        } else {
            FeedFilter::All
        }
    }
}
