use anyhow::{Result, bail};
use clap::Parser;

use feedhunter::{FeedConfig, TuneMode, WebifReceiver, tune_feed};

use super::{feed_at, fetch_board};

#[derive(Parser, Debug)]
pub struct TuneCommand {
    /// Feed number as printed by `list`
    pub index: usize,

    /// Receiver web interface base URL, e.g. http://192.168.1.20/
    #[arg(long)]
    pub webif: String,

    /// Start a transponder scan instead of zapping
    #[arg(long)]
    pub scan: bool,
}

impl TuneCommand {
    pub async fn run(self, config: &FeedConfig) -> Result<()> {
        let board = fetch_board(config).await?;
        let record = feed_at(&board.snapshot(), self.index)?;

        let receiver = WebifReceiver::new(&self.webif, config.timeout())?;
        let mode = if self.scan {
            TuneMode::Scan
        } else {
            TuneMode::Play
        };

        let status = tune_feed(&receiver, &record, mode).await;
        if !status.is_success() {
            bail!("{}", status.message());
        }

        println!("{}", status.message());
        Ok(())
    }
}
