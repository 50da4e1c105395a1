//! View model types for the data table.
//!
//! View models are computed by [`ListingState::compute_viewmodel`] and
//! consumed by the renderer. They hold display-ready strings and highlight
//! ranges only; the table never decides what to fetch.
//!
//! [`ListingState::compute_viewmodel`]: crate::app::ListingState::compute_viewmodel
//!
//! # Example
//!
//! ```
//! use erp_listing::ui::viewmodel::{
//!     EmptyState, FooterInfo, HeaderInfo, TableBody, TableViewModel,
//! };
//!
//! let vm = TableViewModel {
//!     header: HeaderInfo { title: " Positions (0) ".to_string() },
//!     search_bar: None,
//!     filter_chips: vec![],
//!     columns: vec![],
//!     body: TableBody::Empty(EmptyState {
//!         message: "No positions found".to_string(),
//!         subtitle: "Try a different search".to_string(),
//!     }),
//!     footer: FooterInfo {
//!         page_label: "Page 1 of 1".to_string(),
//!         keybindings: "q: quit".to_string(),
//!     },
//!     notification: None,
//! };
//! assert!(matches!(vm.body, TableBody::Empty(_)));
//! ```

use crate::app::Notification;
use crate::domain::SortDirection;

/// Complete view model of one listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableViewModel {
    /// Title bar.
    pub header: HeaderInfo,

    /// Search box, shown while a search is typed or applied.
    pub search_bar: Option<SearchBarInfo>,

    /// Active filters, rendered as `key=value` chips above the table.
    pub filter_chips: Vec<FilterChip>,

    /// Column headers with their sort indicators.
    pub columns: Vec<ColumnHeader>,

    /// Table region.
    pub body: TableBody,

    /// Pagination and keybinding line.
    pub footer: FooterInfo,

    /// Result of the last mutation.
    pub notification: Option<Notification>,
}

/// What the table region shows. Exactly one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    /// A request for the current parameters is in flight.
    Loading,

    /// The last request failed.
    Error { message: String },

    /// The request succeeded with no rows.
    Empty(EmptyState),

    /// Rows of the current page inside the visible window.
    Rows {
        rows: Vec<DisplayRow>,
        /// Selected row relative to the window.
        selected_index: usize,
    },
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub cells: Vec<DisplayCell>,
    pub is_selected: bool,
}

/// One cell, already truncated to its column width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCell {
    pub text: String,

    /// Width the cell is padded to.
    pub width: usize,

    /// Character ranges matching the settled search, `(start, end)` exclusive.
    pub highlight_ranges: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub label: String,
    pub width: usize,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
}

impl ColumnHeader {
    /// Label with the sort indicator appended.
    #[must_use]
    pub fn display_label(&self) -> String {
        match self.sort {
            Some(SortDirection::Ascending) => format!("{} ▲", self.label),
            Some(SortDirection::Descending) => format!("{} ▼", self.label),
            None => self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
}

/// Pagination state and keybinding hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    /// For example `Page 2 of 5 · 42 rows`.
    pub page_label: String,
    pub keybindings: String,
}

/// Shown when a successful request returned no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    /// Raw input as typed.
    pub query: String,

    /// Input differs from the search the current page was requested with.
    pub pending: bool,
}
