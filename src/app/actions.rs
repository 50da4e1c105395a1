//! Side effects requested by the listing event handler.
//!
//! [`handle_event`](crate::app::handle_event) only mutates view state; every
//! effect that touches the outside world (worker, debounce timer, filter
//! store, cache) is returned as an [`Action`] and executed by the
//! [`ListingController`](crate::app::ListingController) in order.
//!
//! # Example
//!
//! ```
//! use erp_listing::app::Action;
//! use erp_listing::domain::{PageFilterState, PageId};
//!
//! let actions = vec![
//!     Action::CancelDebounce,
//!     Action::PersistFilters {
//!         page_id: PageId::new("hr.positions"),
//!         state: PageFilterState::default(),
//!     },
//! ];
//! assert_eq!(actions.len(), 2);
//! ```

use crate::domain::{PageFilterState, PageId, ResourceKey};
use crate::worker::WorkerMessage;

/// Commands executed by the listing controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Posts a message to the fetch worker.
    ///
    /// The response comes back as [`Event::WorkerResponse`](crate::app::Event::WorkerResponse).
    PostToWorker(WorkerMessage),

    /// Restarts the search debounce timer with the raw input.
    ///
    /// When the quiet period elapses the controller receives
    /// [`Event::SearchSettled`](crate::app::Event::SearchSettled) with this value.
    Debounce(String),

    /// Drops any pending debounced search.
    CancelDebounce,

    /// Writes the page's filter state to the filter store.
    PersistFilters {
        page_id: PageId,
        state: PageFilterState,
    },

    /// Marks every cached page of a resource stale.
    InvalidateCache(ResourceKey),
}
