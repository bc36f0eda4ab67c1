use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::BouquetError;
use crate::tuner::ServiceReference;
use crate::types::{FeedKey, FeedRecord, Polarization};

pub const DEFAULT_BOUQUET_NAME: &str = "Feed-Hunter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Added,
    /// A service with the same tuning triple is already in the bouquet.
    Duplicate,
}

/**
    Append-only bouquet file of saved feeds.

    ```text
    #NAME Feed-Hunter
    #SERVICE 1:0:1:11585:1:27500:4:0:0:0:
    #DESCRIPTION 12.5°W 11585 V 27500 News uplink
    ```

    A feed is written at most once per tuning triple; existing `#SERVICE`
    lines are read back to find duplicates.
*/
#[derive(Debug, Clone)]
pub struct Bouquet {
    path: PathBuf,
    name: String,
}

impl Bouquet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: DEFAULT_BOUQUET_NAME.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `<local data dir>/feedhunter/userbouquet.feedhunter.tv`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("feedhunter").join("userbouquet.feedhunter.tv"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tuning keys of every service already in the file.
    pub fn keys(&self) -> Result<BTreeSet<FeedKey>, BouquetError> {
        Ok(service_keys(&self.read()?))
    }

    /// File content, empty when the file does not exist yet.
    fn read(&self) -> Result<String, BouquetError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    pub fn append(&self, record: &FeedRecord) -> Result<AppendOutcome, BouquetError> {
        let outcomes = self.append_all(std::slice::from_ref(record))?;
        Ok(outcomes[0])
    }

    /// Append each record not already present, in order. One outcome per input record.
    pub fn append_all(&self, records: &[FeedRecord]) -> Result<Vec<AppendOutcome>, BouquetError> {
        let existing = self.read()?;
        let mut known = service_keys(&existing);

        let mut out = String::new();
        if existing.trim().is_empty() {
            out.push_str(&format!("#NAME {}\n", self.name));
        }

        let outcomes: Vec<AppendOutcome> = records
            .iter()
            .map(|record| {
                if !known.insert(record.key()) {
                    return AppendOutcome::Duplicate;
                }
                out.push_str(&service_lines(record));
                AppendOutcome::Added
            })
            .collect();

        if outcomes.contains(&AppendOutcome::Added) {
            self.write(&out).map_err(|e| self.io_error(e))?;
            tracing::info!(
                path = %self.path.display(),
                added = outcomes.iter().filter(|o| **o == AppendOutcome::Added).count(),
                "[bouquet] Saved feeds"
            );
        }

        Ok(outcomes)
    }

    fn write(&self, content: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(content.as_bytes())
    }

    fn io_error(&self, source: std::io::Error) -> BouquetError {
        BouquetError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn service_keys(content: &str) -> BTreeSet<FeedKey> {
    content
        .lines()
        .filter_map(|line| line.strip_prefix("#SERVICE "))
        .filter_map(ServiceReference::parse)
        .filter_map(|r| {
            Some(FeedKey {
                frequency_mhz: r.frequency_mhz,
                polarization: Polarization::from_code(r.polarization)?,
                symbol_rate_ksym: r.symbol_rate_ksym,
            })
        })
        .collect()
}

fn service_lines(record: &FeedRecord) -> String {
    let description = format!(
        "{} {} {} {} {}",
        record.satellite_label,
        record.frequency_mhz,
        record.polarization,
        record.symbol_rate_ksym,
        record.event_title
    );
    format!(
        "#SERVICE {}\n#DESCRIPTION {}\n",
        ServiceReference::from_record(record),
        description.trim_end()
    )
}
