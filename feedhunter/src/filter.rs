use std::collections::BTreeSet;

use crate::types::FeedRecord;

/**
    A view over the full feed list. Applying a filter never touches the source
    list; it returns a new vector in the original order.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedFilter {
    #[default]
    All,
    FreeToAir,
    /// Exact satellite label, e.g. `"7.0°E"`.
    Satellite(String),
    /// Exact category.
    Category(String),
}

impl FeedFilter {
    pub fn matches(&self, record: &FeedRecord) -> bool {
        match self {
            Self::All => true,
            Self::FreeToAir => !record.is_encrypted,
            Self::Satellite(label) => record.satellite_label == *label,
            Self::Category(category) => record.category == *category,
        }
    }

    pub fn apply(&self, records: &[FeedRecord]) -> Vec<FeedRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

/// Distinct satellite labels, sorted.
pub fn distinct_satellites(records: &[FeedRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.satellite_label.as_str()))
}

/// Distinct categories, sorted.
pub fn distinct_categories(records: &[FeedRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.category.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
