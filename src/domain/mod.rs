//! Domain layer for the listing engine.
//!
//! Pure types with no I/O: filter state, query construction, resource and
//! payload shapes, and the built-in listing pages.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`filters`]: Per-page filter state and the typed filter trait
//! - [`query`]: Pagination, sorting and the query builder
//! - [`resource`]: Resource keys, page ids, list payloads and mutations
//! - [`pages`]: Built-in listing pages with their columns and typed filters
//!
//! # Examples
//!
//! ```
//! use erp_listing::domain::{pages, PageFilters, PageFilterState, PurchaseOrderFilters, PurchaseOrderStatus};
//!
//! let spec = pages::purchase_orders();
//! let filters = PurchaseOrderFilters { status: Some(PurchaseOrderStatus::Draft), priority: None };
//! let state = filters.apply_to(&PageFilterState::default());
//! assert_eq!(spec.page_id.as_str(), PurchaseOrderFilters::PAGE_ID);
//! assert_eq!(state.active().count(), 1);
//! ```

pub mod error;
pub mod filters;
pub mod pages;
pub mod query;
pub mod resource;

pub use error::{FetchFailure, ListingError, Result};
pub use filters::{FilterValue, PageFilterState, PageFilters};
pub use pages::{
    Column, ContactFilters, EmployeeFilters, ListingSpec, PositionFilters, Priority,
    PurchaseOrderFilters, PurchaseOrderStatus, SalarySlipFilters, ShortUrlFilters,
};
pub use query::{
    build_query, PaginationState, QueryInput, QueryParams, SortDirection, SortEntry, SortState,
};
pub use resource::{ListResponse, Mutation, PageId, RemoteListResult, ResourceKey};
