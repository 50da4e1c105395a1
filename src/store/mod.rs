//! Per-page filter store.
//!
//! [`FilterStore`] is the one piece of state shared between listing views. It
//! is an explicit context handed to each view at construction; cloning it is
//! cheap and every clone sees the same pages. Each page owns a
//! [`tokio::sync::watch`] channel, so subscribers observe every replacement
//! and late subscribers start from the current value.
//!
//! Writes are last-write-wins per page. When a [`Storage`] backend is
//! attached, every write is also persisted; persistence failures are logged
//! and never surface to the view.
//!
//! # Modules
//!
//! - `backend`: Storage trait for snapshot backends
//! - `json`: JSON file snapshot with atomic writes
//! - `models`: On-disk record types

pub mod backend;
pub mod json;
pub mod models;

pub use backend::Storage;
pub use json::JsonStorage;
pub use models::PageFilterRecord;

use crate::domain::{PageFilterState, PageFilters, PageId, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;

#[derive(Default)]
struct StoreInner {
    pages: RwLock<HashMap<PageId, watch::Sender<PageFilterState>>>,
    storage: Mutex<Option<Box<dyn Storage>>>,
}

/// Shared, per-page filter state.
///
/// # Examples
///
/// ```
/// use erp_listing::domain::{FilterValue, PageFilterState, PageId};
/// use erp_listing::store::FilterStore;
///
/// let store = FilterStore::new();
/// let page = PageId::new("procurement.purchase-orders");
///
/// assert_eq!(store.get_page_filter(&page), PageFilterState::default());
///
/// store.set_page_filter(&page, PageFilterState::default().with_search("ACME"));
/// assert_eq!(store.get_page_filter(&page).search, "ACME");
/// ```
#[derive(Clone, Default)]
pub struct FilterStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pages = self
            .inner
            .pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("FilterStore").field("pages", &pages).finish_non_exhaustive()
    }
}

impl FilterStore {
    /// Creates an in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store persisted through `storage`, seeded from its snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read.
    pub fn with_storage(storage: Box<dyn Storage>) -> Result<Self> {
        let store = Self::new();
        *store.inner.storage.lock().unwrap_or_else(PoisonError::into_inner) = Some(storage);
        store.load_snapshot()?;
        Ok(store)
    }

    /// Seeds every page from the attached storage backend.
    ///
    /// Returns the number of pages loaded; 0 when no backend is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn load_snapshot(&self) -> Result<usize> {
        let records = {
            let storage = self.inner.storage.lock().unwrap_or_else(PoisonError::into_inner);
            match storage.as_ref() {
                Some(storage) => storage.load_all()?,
                None => return Ok(0),
            }
        };

        let loaded = records.len();
        for record in records {
            self.publish(&PageId::new(record.page_id), record.state);
        }

        tracing::debug!(pages = loaded, "filter store seeded from snapshot");
        Ok(loaded)
    }

    /// Returns the current state of `page_id`; unknown pages read as empty.
    #[must_use]
    pub fn get_page_filter(&self, page_id: &PageId) -> PageFilterState {
        self.inner
            .pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(page_id)
            .map(|sender| sender.borrow().clone())
            .unwrap_or_default()
    }

    /// Replaces the whole state of `page_id` and notifies its subscribers.
    pub fn set_page_filter(&self, page_id: &PageId, state: PageFilterState) {
        let _span = tracing::debug_span!("set_page_filter", page_id = %page_id).entered();

        self.publish(page_id, state.clone());
        self.persist(page_id, state);
    }

    /// Read-modify-write of one page; returns the stored state.
    pub fn update_page_filter(
        &self,
        page_id: &PageId,
        update: impl FnOnce(&PageFilterState) -> PageFilterState,
    ) -> PageFilterState {
        let next = update(&self.get_page_filter(page_id));
        self.set_page_filter(page_id, next.clone());
        next
    }

    /// Watches `page_id`; the receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self, page_id: &PageId) -> watch::Receiver<PageFilterState> {
        if let Some(sender) = self
            .inner
            .pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(page_id)
        {
            return sender.subscribe();
        }

        self.inner
            .pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(page_id.clone())
            .or_insert_with(|| watch::channel(PageFilterState::default()).0)
            .subscribe()
    }

    /// Reads the typed filters of page `F::PAGE_ID`.
    #[must_use]
    pub fn get_typed<F: PageFilters>(&self) -> F {
        F::from_state(&self.get_page_filter(&PageId::new(F::PAGE_ID)))
    }

    /// Writes the typed filters of page `F::PAGE_ID`, keeping its search text.
    pub fn set_typed<F: PageFilters>(&self, filters: &F) {
        self.update_page_filter(&PageId::new(F::PAGE_ID), |current| filters.apply_to(current));
    }

    /// Page ids that have a state in the store.
    #[must_use]
    pub fn page_ids(&self) -> Vec<PageId> {
        let mut ids: Vec<PageId> = self
            .inner
            .pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn publish(&self, page_id: &PageId, state: PageFilterState) {
        let mut pages = self.inner.pages.write().unwrap_or_else(PoisonError::into_inner);
        match pages.get(page_id) {
            Some(sender) => {
                sender.send_replace(state);
            }
            None => {
                pages.insert(page_id.clone(), watch::channel(state).0);
            }
        }
    }

    fn persist(&self, page_id: &PageId, state: PageFilterState) {
        let mut storage = self.inner.storage.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(storage) = storage.as_mut() else {
            return;
        };

        let record = PageFilterRecord::new(page_id.as_str(), state);
        if let Err(e) = storage.save_page(&record) {
            tracing::warn!(page_id = %page_id, error = %e, "failed to persist page filters");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterValue, PurchaseOrderFilters, PurchaseOrderStatus};

    #[test]
    fn pages_are_isolated() {
        let store = FilterStore::new();
        let orders = PageId::new("procurement.purchase-orders");
        let slips = PageId::new("finance.salary-slips");

        store.set_page_filter(&orders, PageFilterState::default().with_search("ACME"));

        assert_eq!(store.get_page_filter(&orders).search, "ACME");
        assert_eq!(store.get_page_filter(&slips), PageFilterState::default());
    }

    #[test]
    fn clones_share_state() {
        let store = FilterStore::new();
        let other = store.clone();
        let page = PageId::new("crm.contacts");

        other.set_page_filter(
            &page,
            PageFilterState::default().with_filter("contact_type", FilterValue::parse("vendor")),
        );

        assert_eq!(
            store.get_page_filter(&page).get("contact_type"),
            FilterValue::Text("vendor".into())
        );
    }

    #[test]
    fn subscribers_see_last_write() {
        let store = FilterStore::new();
        let page = PageId::new("hr.positions");
        let mut rx = store.subscribe(&page);

        store.set_page_filter(&page, PageFilterState::default().with_search("clerk"));
        store.set_page_filter(&page, PageFilterState::default().with_search("manager"));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().search, "manager");
    }

    #[test]
    fn typed_filters_keep_search() {
        let store = FilterStore::new();
        let page = PageId::new(PurchaseOrderFilters::PAGE_ID);
        store.set_page_filter(&page, PageFilterState::default().with_search("ACME"));

        store.set_typed(&PurchaseOrderFilters {
            status: Some(PurchaseOrderStatus::PendingApproval),
            priority: None,
        });

        let state = store.get_page_filter(&page);
        assert_eq!(state.search, "ACME");
        let typed: PurchaseOrderFilters = store.get_typed();
        assert_eq!(typed.status, Some(PurchaseOrderStatus::PendingApproval));
        assert_eq!(typed.priority, None);
    }

    #[test]
    fn snapshot_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        let page = PageId::new("finance.salary-slips");

        let store = FilterStore::with_storage(Box::new(JsonStorage::new(path.clone()).unwrap()))
            .unwrap();
        store.set_page_filter(
            &page,
            PageFilterState::default().with_filter("paid", FilterValue::Bool(true)),
        );

        let restored =
            FilterStore::with_storage(Box::new(JsonStorage::new(path).unwrap())).unwrap();
        assert_eq!(restored.get_page_filter(&page).get("paid"), FilterValue::Bool(true));
        assert_eq!(restored.page_ids(), vec![page]);
    }
}
