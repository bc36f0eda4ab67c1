use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use feedhunter::{AppendOutcome, Bouquet, DEFAULT_BOUQUET_NAME, FeedConfig, FeedRow};

use super::{feed_at, fetch_board};

#[derive(Parser, Debug)]
pub struct BouquetCommand {
    /// Feed numbers as printed by `list`
    #[arg(required = true)]
    pub indices: Vec<usize>,

    /// Bouquet file, overrides the config file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Bouquet name written into a new file
    #[arg(long, default_value = DEFAULT_BOUQUET_NAME)]
    pub name: String,
}

impl BouquetCommand {
    pub async fn run(self, config: &FeedConfig) -> Result<()> {
        let board = fetch_board(config).await?;
        let snapshot = board.snapshot();

        let records = self
            .indices
            .iter()
            .map(|&index| feed_at(&snapshot, index))
            .collect::<Result<Vec<_>>>()?;

        let path = self
            .file
            .or_else(|| config.bouquet_path.clone())
            .or_else(Bouquet::default_path)
            .unwrap_or_else(|| PathBuf::from("userbouquet.feedhunter.tv"));
        let bouquet = Bouquet::new(path).with_name(self.name);

        let outcomes = bouquet
            .append_all(&records)
            .with_context(|| format!("failed to write {}", bouquet.path().display()))?;

        for (record, outcome) in records.iter().zip(outcomes) {
            let label = match outcome {
                AppendOutcome::Added => "added",
                AppendOutcome::Duplicate => "already saved",
            };
            println!("{:<14} {}", label, FeedRow::new(record).headline);
        }
        println!();
        println!("Bouquet: {}", bouquet.path().display());

        Ok(())
    }
}
