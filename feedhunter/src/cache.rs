use std::fs;
use std::path::{Path, PathBuf};

use crate::types::FeedRecord;

/**
    Last-known-good snapshot of the feed list, stored as a JSON array.

    Best effort in both directions: a failed write is logged and dropped, and an
    absent or unreadable file loads as an empty list. Single writer, last write wins.
*/
#[derive(Debug, Clone)]
pub struct FeedCache {
    path: PathBuf,
}

impl FeedCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<local data dir>/feedhunter/feeds.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("feedhunter").join("feeds.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot with `records`.
    pub fn save(&self, records: &[FeedRecord]) {
        if let Err(e) = self.try_save(records) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "[cache] Failed to write feed cache"
            );
        }
    }

    fn try_save(&self, records: &[FeedRecord]) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, contents)?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "[cache] Saved feed cache"
        );
        Ok(())
    }

    /// The last saved snapshot, or an empty list.
    pub fn load(&self) -> Vec<FeedRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "[cache] Failed to read feed cache"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "[cache] Ignoring unreadable feed cache"
                );
                Vec::new()
            }
        }
    }
}
