use crate::fetcher::FeedSource;
use crate::types::FeedRecord;

/**
    One rendered list entry: a headline with the tuning triple and a detail line
    with category and event. `encrypted` drives the entry colour.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub headline: String,
    pub detail: String,
    pub encrypted: bool,
}

impl FeedRow {
    pub fn new(record: &FeedRecord) -> Self {
        Self {
            headline: format!(
                "{} | {} {} {} | {}",
                record.satellite_label,
                record.frequency_mhz,
                record.polarization,
                record.symbol_rate_ksym,
                record.encryption_label()
            ),
            detail: format!("{} - {}", record.category, record.event_title),
            encrypted: record.is_encrypted,
        }
    }
}

impl From<&FeedRecord> for FeedRow {
    fn from(record: &FeedRecord) -> Self {
        Self::new(record)
    }
}

pub fn rows(records: &[FeedRecord]) -> Vec<FeedRow> {
    records.iter().map(FeedRow::new).collect()
}

/// `"Feeds: N"`, with `(cached)` when the list did not come from the live page.
pub fn status_line(count: usize, source: FeedSource) -> String {
    match (count, source) {
        (0, _) => "No feeds found".to_string(),
        (n, FeedSource::Live) => format!("Feeds: {}", n),
        (n, FeedSource::Cached) => format!("Feeds: {} (cached)", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polarization;

    #[test]
    fn test_row_text() {
        let record = FeedRecord {
            frequency_mhz: 11585,
            polarization: Polarization::Vertical,
            symbol_rate_ksym: 27500,
            category: "News".to_string(),
            event_title: "Press conference".to_string(),
            ..FeedRecord::new("12.5°W")
        };
        let row = FeedRow::new(&record);
        assert_eq!(row.headline, "12.5°W | 11585 V 27500 | FTA");
        assert_eq!(row.detail, "News - Press conference");
        assert!(!row.encrypted);

        let encrypted = FeedRecord {
            is_encrypted: true,
            ..record
        };
        assert!(FeedRow::from(&encrypted).headline.ends_with("| BISS/Crypt"));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(3, FeedSource::Live), "Feeds: 3");
        assert_eq!(status_line(3, FeedSource::Cached), "Feeds: 3 (cached)");
        assert_eq!(status_line(0, FeedSource::Live), "No feeds found");
        assert_eq!(status_line(0, FeedSource::Cached), "No feeds found");
    }
}
