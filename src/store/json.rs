//! JSON file snapshot of the filter store.
//!
//! The whole snapshot is held in memory and rewritten on every change using a
//! write-to-temp + rename sequence, so a crash never leaves a half-written
//! file behind.

use crate::domain::error::{ListingError, Result};
use crate::store::backend::Storage;
use crate::store::models::PageFilterRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Top-level structure serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotData {
    version: u32,

    /// Page selections indexed by page id.
    #[serde(default)]
    pages: BTreeMap<String, PageFilterRecord>,
}

impl Default for SnapshotData {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            pages: BTreeMap::new(),
        }
    }
}

/// JSON file storage backend.
///
/// `Send` but not `Sync`; the filter store serializes access behind a mutex.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "pages": {
///     "procurement.purchase-orders": {
///       "page_id": "procurement.purchase-orders",
///       "state": {
///         "search": "ACME",
///         "values": { "status": { "kind": "text", "value": "pending_approval" } }
///       },
///       "updated_at": 1760000000
///     }
///   }
/// }
/// ```
pub struct JsonStorage {
    file_path: PathBuf,
    data: SnapshotData,
}

impl JsonStorage {
    /// Opens the snapshot at `file_path`, creating parent directories.
    ///
    /// A missing file starts an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file holds invalid JSON.
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening filter snapshot");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("no snapshot yet, starting empty");
            SnapshotData::default()
        };

        tracing::debug!(page_count = data.pages.len(), "filter snapshot ready");

        Ok(Self { file_path, data })
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<SnapshotData> {
        let contents = std::fs::read_to_string(path)?;
        let data: SnapshotData = serde_json::from_str(&contents)
            .map_err(|e| ListingError::Storage(format!("failed to parse snapshot: {e}")))?;

        if data.version != SNAPSHOT_VERSION {
            return Err(ListingError::Storage(format!(
                "unsupported snapshot version {}",
                data.version
            )));
        }

        Ok(data)
    }

    fn save_to_file(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| ListingError::Storage(format!("failed to serialize snapshot: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        tracing::trace!(path = ?self.file_path, "filter snapshot written");
        Ok(())
    }
}

impl Storage for JsonStorage {
    fn load_all(&self) -> Result<Vec<PageFilterRecord>> {
        Ok(self.data.pages.values().cloned().collect())
    }

    fn save_page(&mut self, record: &PageFilterRecord) -> Result<()> {
        let _span = tracing::debug_span!("json_save_page", page_id = %record.page_id).entered();

        self.data.pages.insert(record.page_id.clone(), record.clone());
        self.save_to_file()
    }

    fn clear(&mut self) -> Result<()> {
        self.data.pages.clear();
        self.save_to_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterValue, PageFilterState};

    #[test]
    fn saved_pages_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state").join("filters.json");

        let mut storage = JsonStorage::new(path.clone()).expect("open");
        let state = PageFilterState::default()
            .with_search("ACME")
            .with_filter("status", FilterValue::parse("approved"));
        storage
            .save_page(&PageFilterRecord::new("procurement.purchase-orders", state.clone()))
            .expect("save");
        drop(storage);

        let reopened = JsonStorage::new(path).expect("reopen");
        let records = reopened.load_all().expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, state);
    }

    #[test]
    fn invalid_json_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filters.json");
        std::fs::write(&path, "{not json").expect("write");

        let result = JsonStorage::new(path);
        assert!(matches!(result, Err(ListingError::Storage(_))));
    }

    #[test]
    fn clear_empties_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filters.json");

        let mut storage = JsonStorage::new(path.clone()).expect("open");
        storage
            .save_page(&PageFilterRecord::new("crm.contacts", PageFilterState::default()))
            .expect("save");
        storage.clear().expect("clear");

        let reopened = JsonStorage::new(path).expect("reopen");
        assert!(reopened.load_all().expect("load").is_empty());
    }
}
