mod board;
mod bouquet;
mod cache;
mod config;
mod display;
mod error;
mod fetcher;
mod filter;
mod orbital;
mod parser;
mod receiver;
mod tuner;
mod types;

pub mod rules;

#[cfg(test)]
mod testing;

pub use self::board::{FeedBoard, RefreshOutcome, Snapshot};
pub use self::bouquet::{AppendOutcome, Bouquet, DEFAULT_BOUQUET_NAME};
pub use self::cache::FeedCache;
pub use self::config::{EmptyPagePolicy, FeedConfig};
pub use self::display::{FeedRow, rows, status_line};
pub use self::error::{
    BouquetError, ConfigError, FetchError, ParseError, ReceiverError, RuleError,
};
pub use self::fetcher::{
    FeedFetcher, FeedSource, FetchOutcome, HttpPageSource, PageSource, placeholder_record,
};
pub use self::filter::{FeedFilter, distinct_categories, distinct_satellites};
pub use self::orbital::{format_orbital_position, parse_orbital_position};
pub use self::parser::FeedParser;
pub use self::receiver::{Receiver, TuneMode, TuneStatus, TunerInfo, WebifReceiver, tune_feed};
pub use self::rules::RuleSet;
pub use self::tuner::{ServiceReference, TransponderParams};
pub use self::types::{DeliverySystem, Fec, FeedKey, FeedRecord, Modulation, Polarization};
