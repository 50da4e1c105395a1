//! Storage record models for the filter snapshot.
//!
//! Kept apart from [`PageFilterState`] so the on-disk format can carry
//! bookkeeping (timestamps) the in-memory store does not need.

use crate::domain::PageFilterState;
use serde::{Deserialize, Serialize};

/// One page's persisted filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFilterRecord {
    /// Page identifier the filters belong to.
    pub page_id: String,

    /// Search text and filter values.
    pub state: PageFilterState,

    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

impl PageFilterRecord {
    /// Creates a record stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use erp_listing::store::PageFilterRecord;
    /// use erp_listing::domain::PageFilterState;
    ///
    /// let record = PageFilterRecord::new("hr.positions", PageFilterState::default());
    /// assert_eq!(record.page_id, "hr.positions");
    /// assert!(record.updated_at > 0);
    /// ```
    pub fn new(page_id: impl Into<String>, state: PageFilterState) -> Self {
        Self {
            page_id: page_id.into(),
            state,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}
