use anyhow::Result;
use clap::Parser;

use feedhunter::{FeedConfig, ServiceReference, TransponderParams, format_orbital_position};

use super::{feed_at, fetch_board};

#[derive(Parser, Debug)]
pub struct ShowCommand {
    /// Feed number as printed by `list`
    pub index: usize,
}

impl ShowCommand {
    pub async fn run(self, config: &FeedConfig) -> Result<()> {
        let board = fetch_board(config).await?;
        let record = feed_at(&board.snapshot(), self.index)?;
        let params = TransponderParams::from_record(&record);

        println!("Satellite:    {}", record.satellite_label);
        println!(
            "Position:     {} ({})",
            format_orbital_position(record.orbital_position),
            record.orbital_position
        );
        println!("Frequency:    {} MHz", record.frequency_mhz);
        println!("Polarization: {}", record.polarization);
        println!("Symbol rate:  {} ksym/s", record.symbol_rate_ksym);
        println!("FEC:          {}", record.forward_error_correction);
        if let Some(system) = record.system {
            println!("System:       {}", system);
        }
        if let Some(modulation) = record.modulation {
            println!("Modulation:   {}", modulation);
        }
        println!("Category:     {}", record.category);
        println!("Event:        {}", record.event_title);
        println!("Encryption:   {}", record.encryption_label());

        println!();
        println!("Transponder:");
        println!("  frequency        {}", params.frequency);
        println!("  symbol_rate      {}", params.symbol_rate);
        println!("  polarization     {}", params.polarization);
        println!("  fec_inner        {}", params.fec);
        println!("  inversion        {}", params.inversion);
        println!("  orbital_position {}", params.orbital_position);
        println!("  system           {}", params.system);
        println!("  modulation       {}", params.modulation);
        println!("  rolloff          {}", params.rolloff);
        println!("  pilot            {}", params.pilot);

        println!();
        println!("Service ref:  {}", ServiceReference::from_record(&record));

        Ok(())
    }
}
