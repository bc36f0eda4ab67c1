use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct SourcesCommand;

impl SourcesCommand {
    pub fn run(self) -> Result<()> {
        println!("Available rule sets:");
        for rules in feedhunter::rules::load_all()? {
            println!("  - {} ({})", rules.source.id, rules.source.name);
            if let Some(url) = &rules.source.url {
                println!("      {}", url);
            }
        }
        Ok(())
    }
}
