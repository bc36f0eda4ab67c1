use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    BouquetCommand, FeedArgs, ListCommand, ShowCommand, SourcesCommand, TuneCommand,
    WatchCommand,
};

/**
    Live satellite feed hunter.
*/
#[derive(Parser, Debug)]
#[command(name = "feedhunter")]
#[command(about = "Scrape live satellite feeds and tune a receiver to them")]
pub struct Cli {
    #[command(flatten)]
    feed: FeedArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List live feeds (default)
    List(ListCommand),
    /// List embedded extraction rule sets
    Sources(SourcesCommand),
    /// Show tuning parameters of one feed
    Show(ShowCommand),
    /// Tune a receiver to a feed
    Tune(TuneCommand),
    /// Save feeds to a bouquet file
    Bouquet(BouquetCommand),
    /// Refresh the feed list periodically until Ctrl+C
    Watch(WatchCommand),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = self.feed.load()?;
        let command = self
            .command
            .unwrap_or(Command::List(ListCommand::default()));

        match command {
            Command::List(cmd) => cmd.run(&config).await,
            Command::Sources(cmd) => cmd.run(),
            Command::Show(cmd) => cmd.run(&config).await,
            Command::Tune(cmd) => cmd.run(&config).await,
            Command::Bouquet(cmd) => cmd.run(&config).await,
            Command::Watch(cmd) => cmd.run(&config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_list() {
        let cli = Cli::try_parse_from(["feedhunter"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "feedhunter",
            "list",
            "--fta",
            "--url",
            "http://127.0.0.1:9/feeds",
            "--timeout",
            "3",
        ])
        .unwrap();
        let config = cli.feed.load().unwrap();
        assert_eq!(config.url, "http://127.0.0.1:9/feeds");
        assert_eq!(config.timeout_secs, 3);
        assert!(matches!(cli.command, Some(Command::List(ListCommand { fta: true, .. }))));
    }

    #[test]
    fn test_filters_conflict() {
        assert!(Cli::try_parse_from(["feedhunter", "list", "--fta", "--category", "News"]).is_err());
    }

    #[test]
    fn test_bouquet_needs_an_index() {
        assert!(Cli::try_parse_from(["feedhunter", "bouquet"]).is_err());
        assert!(Cli::try_parse_from(["feedhunter", "bouquet", "1", "3"]).is_ok());
    }
}
