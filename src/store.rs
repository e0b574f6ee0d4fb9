//! Persistent storage for hourly step samples.
//!
//! Components talk to the store through the [`StepStore`] trait so the app
//! can hand them either the on-disk [`JsonStepStore`] or an in-memory one.

use chrono::NaiveDateTime;
use dirs_next as dirs;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A single step-count sample. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: Uuid,
    pub timestamp: NaiveDateTime,
    pub steps: u32,
}

/// Predicate applied by [`StepStore::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFilter {
    /// Records at or after the given instant.
    Since(NaiveDateTime),
    /// Records whose timestamp equals the given instant.
    At(NaiveDateTime),
}

impl StepFilter {
    pub fn matches(&self, record: &StepRecord) -> bool {
        match *self {
            StepFilter::Since(bound) => record.timestamp >= bound,
            StepFilter::At(ts) => record.timestamp == ts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Ascending
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O error: {e}"),
            StoreError::Serde(e) => write!(f, "store data is malformed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serde(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e)
    }
}

/// Create / query / commit access to step records.
pub trait StepStore {
    /// Add a record. It becomes visible to queries immediately but is only
    /// durable after [`commit`](StepStore::commit).
    fn create(&mut self, timestamp: NaiveDateTime, steps: u32) -> StepRecord;

    /// Return all records matching `filter`, sorted by timestamp.
    fn query(&self, filter: StepFilter, order: SortOrder) -> Vec<StepRecord>;

    /// Flush pending writes to durable storage.
    fn commit(&mut self) -> Result<(), StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Records held in memory and written to a JSON file on commit.
///
/// A store without a path never touches the disk.
#[derive(Debug, Default)]
pub struct JsonStepStore {
    path: Option<PathBuf>,
    records: Vec<StepRecord>,
    dirty: bool,
}

impl JsonStepStore {
    const DIR: &'static str = "step_charts";
    const FILE: &'static str = "steps.json";

    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(Self::DIR).join(Self::FILE))
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store backed by `path`. A missing file yields an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str::<Vec<StepRecord>>(&data)?
        } else {
            Vec::new()
        };
        info!("Opened step store {} ({} records)", path.display(), records.len());
        Ok(Self {
            path: Some(path),
            records,
            dirty: false,
        })
    }
}

impl StepStore for JsonStepStore {
    fn create(&mut self, timestamp: NaiveDateTime, steps: u32) -> StepRecord {
        let record = StepRecord {
            id: Uuid::new_v4(),
            timestamp,
            steps,
        };
        self.records.push(record.clone());
        self.dirty = true;
        record
    }

    fn query(&self, filter: StepFilter, order: SortOrder) -> Vec<StepRecord> {
        let mut out: Vec<StepRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        match order {
            SortOrder::Ascending => out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::Descending => out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        }
        out
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = self.path.as_ref() else {
            self.dirty = false;
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string(&self.records)?;
        std::fs::write(path, data)?;
        self.dirty = false;
        info!("Saved {} step records to {}", self.records.len(), path.display());
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Commit `store`, logging instead of propagating a failure.
pub fn commit_logged(store: &mut dyn StepStore) {
    if let Err(err) = store.commit() {
        error!("Could not save step data: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    const ALL: StepFilter = StepFilter::Since(NaiveDateTime::MIN);

    #[test]
    fn query_filters_and_orders() {
        let mut store = JsonStepStore::in_memory();
        store.create(hour(2, 9), 200);
        store.create(hour(1, 8), 100);
        store.create(hour(3, 10), 300);

        let all = store.query(ALL, SortOrder::Ascending);
        let steps: Vec<u32> = all.iter().map(|r| r.steps).collect();
        assert_eq!(steps, vec![100, 200, 300]);

        let since = store.query(StepFilter::Since(hour(2, 9)), SortOrder::Descending);
        let steps: Vec<u32> = since.iter().map(|r| r.steps).collect();
        assert_eq!(steps, vec![300, 200]);

        let at = store.query(StepFilter::At(hour(1, 8)), SortOrder::Descending);
        assert_eq!(at.len(), 1);
        assert_eq!(at[0].steps, 100);
    }

    #[test]
    fn empty_store_queries_are_empty() {
        let store = JsonStepStore::in_memory();
        assert!(store.is_empty());
        assert!(store.query(ALL, SortOrder::Ascending).is_empty());
    }

    #[test]
    fn commit_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("steps.json");

        let mut store = JsonStepStore::open(&path).unwrap();
        assert!(store.is_empty());
        let rec = store.create(hour(4, 12), 321);
        store.commit().unwrap();

        let reopened = JsonStepStore::open(&path).unwrap();
        assert_eq!(reopened.query(ALL, SortOrder::Ascending), vec![rec]);
    }

    #[test]
    fn failed_commit_is_logged_and_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();

        let mut store = JsonStepStore::open(blocker.join("steps.json")).unwrap();
        let rec = store.create(hour(5, 9), 77);

        commit_logged(&mut store);
        assert_eq!(store.query(ALL, SortOrder::Ascending), vec![rec]);
        assert!(matches!(store.commit(), Err(StoreError::Io(_))));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonStepStore::open(&path), Err(StoreError::Serde(_))));
    }
}
