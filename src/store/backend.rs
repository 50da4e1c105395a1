//! Storage backend abstraction for filter snapshots.
//!
//! The filter store lives in memory; a [`Storage`] implementation only keeps a
//! copy so selections survive a restart. Each method maps to one thing the
//! store does: seed itself at startup, write one page, forget everything.

use crate::domain::error::Result;
use crate::store::models::PageFilterRecord;

/// Persistent copy of the filter store.
///
/// # Implementations
///
/// - [`crate::store::JsonStorage`]: JSON file with atomic writes
///
/// # Examples
///
/// ```no_run
/// use erp_listing::store::{JsonStorage, Storage};
/// use std::path::PathBuf;
///
/// let storage = JsonStorage::new(PathBuf::from("/tmp/filters.json"))?;
/// let records = storage.load_all()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Storage: Send {
    /// Returns every stored page selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_all(&self) -> Result<Vec<PageFilterRecord>>;

    /// Inserts or replaces the selection of one page.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn save_page(&mut self, record: &PageFilterRecord) -> Result<()>;

    /// Removes every stored selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn clear(&mut self) -> Result<()>;
}
