//! Request-keyed cache of list pages.
//!
//! Entries are keyed by `(ResourceKey, QueryParams)`. A lookup either serves a
//! fresh result, joins a request already in flight for the same key, or starts
//! one transport call whose future is shared by every caller that asks for the
//! same key before it resolves.
//!
//! Invalidation works per resource family: every resource carries a
//! generation counter, each entry remembers the generation it was requested
//! under, and an entry is fresh only while the two match. Bumping the
//! generation therefore marks every cached page of the family stale at once,
//! and a response to a request issued before the bump is never stored as
//! fresh.
//!
//! Every transport call runs on its own Tokio task. Callers only wait for its
//! outcome, so a request outlives the views that asked for it and still
//! settles its entry.
//!
//! Mutations go through the cache so the invalidation is done before the
//! caller learns that the mutation succeeded.

use crate::domain::{
    FetchFailure, ListingError, Mutation, QueryParams, RemoteListResult, ResourceKey, Result,
};
use crate::transport::ListTransport;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::Instrument;

/// Rows of one page as the cache hands them out.
pub type ListPage = Arc<RemoteListResult<Value>>;

type FetchOutcome = std::result::Result<ListPage, FetchFailure>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;
type EntryKey = (ResourceKey, QueryParams);

/// Lifecycle of one cached request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Never requested.
    Idle,
    /// Transport call in flight.
    Loading,
    /// Last request succeeded.
    Success,
    /// Last request failed.
    Error,
}

enum EntryState {
    Loading(SharedFetch),
    Ready(ListPage),
    Failed(FetchFailure),
}

struct Entry {
    state: EntryState,
    generation: u64,
    updated_at: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<EntryKey, Entry>,
    generations: HashMap<ResourceKey, u64>,
}

impl CacheInner {
    fn generation(&self, resource: &ResourceKey) -> u64 {
        self.generations.get(resource).copied().unwrap_or(0)
    }
}

enum Lookup {
    Hit(ListPage),
    Pending(SharedFetch),
}

/// Shared list cache in front of a [`ListTransport`].
///
/// Cloning is cheap; clones share entries.
#[derive(Clone)]
pub struct RemoteListCache {
    transport: Arc<dyn ListTransport>,
    inner: Arc<Mutex<CacheInner>>,
}

impl std::fmt::Debug for RemoteListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteListCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl RemoteListCache {
    /// Creates an empty cache over `transport`.
    pub fn new(transport: Arc<dyn ListTransport>) -> Self {
        Self {
            transport,
            inner: Arc::new(Mutex::new(CacheInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the page for `params`, fetching it at most once.
    ///
    /// `page_size` is used to derive `page_count` from the response.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] carrying the failure shared by every
    /// caller of the same request.
    pub async fn fetch_list(
        &self,
        resource: &ResourceKey,
        params: &QueryParams,
        page_size: usize,
    ) -> Result<ListPage> {
        let span = tracing::debug_span!("fetch_list", resource = %resource, params = %params);

        match span.in_scope(|| self.lookup_or_start(resource, params, page_size)) {
            Lookup::Hit(page) => Ok(page),
            Lookup::Pending(shared) => shared.instrument(span).await.map_err(ListingError::Fetch),
        }
    }

    fn lookup_or_start(
        &self,
        resource: &ResourceKey,
        params: &QueryParams,
        page_size: usize,
    ) -> Lookup {
        let mut inner = self.lock();
        let generation = inner.generation(resource);
        let key = (resource.clone(), params.clone());

        if let Some(entry) = inner.entries.get(&key).filter(|e| e.generation == generation) {
            match &entry.state {
                EntryState::Ready(page) => {
                    tracing::debug!("serving cached page");
                    return Lookup::Hit(Arc::clone(page));
                }
                EntryState::Loading(shared) => {
                    tracing::debug!("joining in-flight request");
                    return Lookup::Pending(shared.clone());
                }
                EntryState::Failed(_) => {}
            }
        }

        tracing::debug!(generation, "starting list request");
        let shared = self.start_request(key.clone(), generation, page_size);
        inner.entries.insert(
            key,
            Entry {
                state: EntryState::Loading(shared.clone()),
                generation,
                updated_at: Instant::now(),
            },
        );
        Lookup::Pending(shared)
    }

    /// Spawns the transport call so it runs to completion and fills the cache
    /// even when every caller waiting on it has gone away.
    fn start_request(&self, key: EntryKey, generation: u64, page_size: usize) -> SharedFetch {
        let transport = Arc::clone(&self.transport);
        let inner = Arc::clone(&self.inner);

        let request = async move {
            let (resource, params) = &key;
            let outcome: FetchOutcome = transport
                .fetch_page(resource, params)
                .await
                .map(|response| Arc::new(RemoteListResult::from_response(response, page_size)))
                .map_err(FetchFailure::from);

            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.generation(resource) != generation {
                tracing::debug!(
                    resource = %resource,
                    generation,
                    "resource invalidated while loading, result not cached as fresh"
                );
            }

            let owns_entry = inner
                .entries
                .get(&key)
                .map_or(true, |entry| entry.generation == generation);
            if owns_entry {
                let state = match &outcome {
                    Ok(page) => EntryState::Ready(Arc::clone(page)),
                    Err(failure) => EntryState::Failed(failure.clone()),
                };
                inner.entries.insert(
                    key.clone(),
                    Entry {
                        state,
                        generation,
                        updated_at: Instant::now(),
                    },
                );
            }

            outcome
        };
        let task = tokio::spawn(request.in_current_span());

        async move {
            task.await.unwrap_or_else(|e| {
                Err(FetchFailure {
                    status: None,
                    message: format!("list request aborted: {e}"),
                })
            })
        }
        .boxed()
        .shared()
    }

    /// Marks every cached page of `resource` stale; returns how many.
    pub fn invalidate(&self, resource: &ResourceKey) -> usize {
        let mut inner = self.lock();
        let generation = inner.generation(resource) + 1;
        inner.generations.insert(resource.clone(), generation);

        let marked = inner.entries.keys().filter(|(r, _)| r == resource).count();
        tracing::debug!(resource = %resource, generation, marked, "resource invalidated");
        marked
    }

    /// Whether a cached entry for `params` exists but was invalidated.
    #[must_use]
    pub fn is_stale(&self, resource: &ResourceKey, params: &QueryParams) -> bool {
        let inner = self.lock();
        let generation = inner.generation(resource);
        inner
            .entries
            .get(&(resource.clone(), params.clone()))
            .is_some_and(|entry| entry.generation != generation)
    }

    /// Lifecycle status of the request for `params`.
    #[must_use]
    pub fn status(&self, resource: &ResourceKey, params: &QueryParams) -> RequestStatus {
        self.lock()
            .entries
            .get(&(resource.clone(), params.clone()))
            .map_or(RequestStatus::Idle, |entry| match entry.state {
                EntryState::Loading(_) => RequestStatus::Loading,
                EntryState::Ready(_) => RequestStatus::Success,
                EntryState::Failed(_) => RequestStatus::Error,
            })
    }

    /// Age of the entry for `params`, measured from its last state change.
    #[must_use]
    pub fn age(&self, resource: &ResourceKey, params: &QueryParams) -> Option<std::time::Duration> {
        self.lock()
            .entries
            .get(&(resource.clone(), params.clone()))
            .map(|entry| entry.updated_at.elapsed())
    }

    /// Number of cached entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Creates a record, invalidating `resource` on success.
    ///
    /// # Errors
    ///
    /// Propagates the transport error; the cache is left untouched.
    pub async fn create(&self, resource: &ResourceKey, body: &Value) -> Result<Value> {
        let record = self.transport.create(resource, body).await?;
        self.invalidate(resource);
        Ok(record)
    }

    /// Replaces record `id`, invalidating `resource` on success.
    ///
    /// # Errors
    ///
    /// Propagates the transport error; the cache is left untouched.
    pub async fn update(&self, resource: &ResourceKey, id: &str, body: &Value) -> Result<Value> {
        let record = self.transport.update(resource, id, body).await?;
        self.invalidate(resource);
        Ok(record)
    }

    /// Deletes record `id`, invalidating `resource` on success.
    ///
    /// # Errors
    ///
    /// Propagates the transport error; the cache is left untouched.
    pub async fn delete(&self, resource: &ResourceKey, id: &str) -> Result<()> {
        self.transport.delete(resource, id).await?;
        self.invalidate(resource);
        Ok(())
    }

    /// Applies `mutation`, invalidating `resource` on success.
    ///
    /// # Errors
    ///
    /// Propagates the transport error; the cache is left untouched.
    pub async fn apply(&self, resource: &ResourceKey, mutation: &Mutation) -> Result<Option<Value>> {
        let span = tracing::debug_span!("apply_mutation", resource = %resource, op = mutation.verb());

        async {
            match mutation {
                Mutation::Create { body } => self.create(resource, body).await.map(Some),
                Mutation::Update { id, body } => self.update(resource, id, body).await.map(Some),
                Mutation::Delete { id } => self.delete(resource, id).await.map(|()| None),
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingTransport {
        fetches: AtomicUsize,
        delay: Duration,
        fail_fetch: bool,
        fail_mutations: bool,
    }

    #[async_trait]
    impl ListTransport for CountingTransport {
        async fn fetch_page(
            &self,
            _resource: &ResourceKey,
            params: &QueryParams,
        ) -> Result<ListResponse<Value>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail_fetch {
                return Err(ListingError::Status {
                    status: 503,
                    message: "Service unavailable".into(),
                });
            }
            Ok(ListResponse {
                count: 21,
                results: vec![json!({ "page": params.get("page") })],
            })
        }

        async fn create(&self, _resource: &ResourceKey, body: &Value) -> Result<Value> {
            Ok(body.clone())
        }

        async fn update(&self, _resource: &ResourceKey, _id: &str, body: &Value) -> Result<Value> {
            Ok(body.clone())
        }

        async fn delete(&self, _resource: &ResourceKey, _id: &str) -> Result<()> {
            if self.fail_mutations {
                return Err(ListingError::Status {
                    status: 409,
                    message: "Record is referenced".into(),
                });
            }
            Ok(())
        }
    }

    fn page(n: usize) -> QueryParams {
        [("page", n.to_string()), ("page_size", "10".to_string())]
            .into_iter()
            .collect()
    }

    fn cache_with(transport: CountingTransport) -> (RemoteListCache, Arc<CountingTransport>) {
        let transport = Arc::new(transport);
        (RemoteListCache::new(transport.clone()), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn identical_requests_share_one_call() {
        let (cache, transport) = cache_with(CountingTransport {
            delay: Duration::from_millis(100),
            ..Default::default()
        });
        let resource = ResourceKey::new("purchase-orders");
        let params = page(1);

        let (a, b) = tokio::join!(
            cache.fetch_list(&resource, &params, 10),
            cache.fetch_list(&resource, &params, 10)
        );

        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(cache.status(&resource, &params), RequestStatus::Success);
    }

    #[tokio::test]
    async fn different_params_fetch_independently_and_results_are_reused() {
        let (cache, transport) = cache_with(CountingTransport::default());
        let resource = ResourceKey::new("positions");

        let first = cache.fetch_list(&resource, &page(1), 10).await.unwrap();
        cache.fetch_list(&resource, &page(2), 10).await.unwrap();
        let again = cache.fetch_list(&resource, &page(1), 10).await.unwrap();

        assert_eq!(transport.fetches.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.page_count, 3);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn delete_marks_family_stale_before_returning() {
        let (cache, transport) = cache_with(CountingTransport::default());
        let orders = ResourceKey::new("purchase-orders");
        let contacts = ResourceKey::new("contacts");

        cache.fetch_list(&orders, &page(1), 10).await.unwrap();
        cache.fetch_list(&orders, &page(2), 10).await.unwrap();
        cache.fetch_list(&contacts, &page(1), 10).await.unwrap();

        cache.delete(&orders, "7").await.unwrap();

        assert!(cache.is_stale(&orders, &page(1)));
        assert!(cache.is_stale(&orders, &page(2)));
        assert!(!cache.is_stale(&contacts, &page(1)));

        cache.fetch_list(&orders, &page(1), 10).await.unwrap();
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 4);
        assert!(!cache.is_stale(&orders, &page(1)));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_untouched() {
        let (cache, _) = cache_with(CountingTransport {
            fail_mutations: true,
            ..Default::default()
        });
        let resource = ResourceKey::new("salary-slips");
        cache.fetch_list(&resource, &page(1), 10).await.unwrap();

        let err = cache.delete(&resource, "3").await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert!(!cache.is_stale(&resource, &page(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn response_from_before_invalidation_is_not_fresh() {
        let (cache, transport) = cache_with(CountingTransport {
            delay: Duration::from_millis(100),
            ..Default::default()
        });
        let resource = ResourceKey::new("employees");
        let params = page(1);

        let pending = {
            let cache = cache.clone();
            let resource = resource.clone();
            let params = params.clone();
            tokio::spawn(async move { cache.fetch_list(&resource, &params, 10).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.status(&resource, &params), RequestStatus::Loading);

        assert_eq!(cache.invalidate(&resource), 1);
        pending.await.unwrap().unwrap();

        assert!(cache.is_stale(&resource, &params));
        cache.fetch_list(&resource, &params, 10).await.unwrap();
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn request_settles_after_its_only_caller_is_aborted() {
        let (cache, transport) = cache_with(CountingTransport {
            delay: Duration::from_secs(1),
            ..Default::default()
        });
        let resource = ResourceKey::new("positions");
        let params = page(1);

        let caller = {
            let cache = cache.clone();
            let resource = resource.clone();
            let params = params.clone();
            tokio::spawn(async move { cache.fetch_list(&resource, &params, 10).await })
        };
        tokio::task::yield_now().await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert_eq!(cache.status(&resource, &params), RequestStatus::Loading);

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(cache.status(&resource, &params), RequestStatus::Success);
        cache.fetch_list(&resource, &params, 10).await.unwrap();
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_shared_and_retried_on_next_request() {
        let (cache, transport) = cache_with(CountingTransport {
            fail_fetch: true,
            ..Default::default()
        });
        let resource = ResourceKey::new("short-urls");

        let err = cache.fetch_list(&resource, &page(1), 10).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(cache.status(&resource, &page(1)), RequestStatus::Error);

        cache.fetch_list(&resource, &page(1), 10).await.unwrap_err();
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 2);
    }
}
