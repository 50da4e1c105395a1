//! In-process backend serving seeded collections.
//!
//! Implements the same contract as a paginated REST backend (search,
//! per-field filters, `ordering`, 1-based pages, 404 on out-of-range pages) so
//! the console can run offline and tests can script latency and failures.

use super::ListTransport;
use crate::domain::query::RESERVED_PARAMS;
use crate::domain::{ListResponse, ListingError, QueryParams, ResourceKey, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<ResourceKey, Vec<Value>>,
    failures: HashMap<ResourceKey, VecDeque<(u16, String)>>,
    latency: Duration,
    delays: Vec<(String, String, Duration)>,
    requests: Vec<(ResourceKey, QueryParams)>,
}

impl MemoryState {
    fn take_failure(&mut self, resource: &ResourceKey) -> Result<()> {
        match self.failures.get_mut(resource).and_then(VecDeque::pop_front) {
            Some((status, message)) => Err(ListingError::Status { status, message }),
            None => Ok(()),
        }
    }

    fn latency_for(&self, params: &QueryParams) -> Duration {
        self.delays
            .iter()
            .filter(|(key, value, _)| params.get(key) == Some(value.as_str()))
            .map(|(_, _, delay)| *delay)
            .max()
            .unwrap_or(self.latency)
    }
}

/// Seeded in-memory collections behind the [`ListTransport`] contract.
///
/// # Examples
///
/// ```
/// use erp_listing::domain::{QueryParams, ResourceKey};
/// use erp_listing::transport::{ListTransport, MemoryTransport};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> erp_listing::Result<()> {
/// let backend = MemoryTransport::new();
/// backend.seed("positions", vec![json!({ "id": 1, "code": "CLK", "name": "Clerk" })]);
///
/// let params: QueryParams = [("page", "1"), ("search", "clerk")].into_iter().collect();
/// let page = backend.fetch_page(&ResourceKey::new("positions"), &params).await?;
/// assert_eq!(page.count, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("collections", &self.lock().collections.len())
            .finish_non_exhaustive()
    }
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the rows of `resource`.
    pub fn seed(&self, resource: impl Into<ResourceKey>, rows: Vec<Value>) {
        self.lock().collections.insert(resource.into(), rows);
    }

    /// Delays every request by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Delays list requests whose `key` parameter equals `value`.
    pub fn delay_when(&self, key: &str, value: &str, delay: Duration) {
        self.lock()
            .delays
            .push((key.to_string(), value.to_string(), delay));
    }

    /// Makes the next call on `resource` fail with `status`.
    pub fn fail_next(&self, resource: impl Into<ResourceKey>, status: u16, message: &str) {
        self.lock()
            .failures
            .entry(resource.into())
            .or_default()
            .push_back((status, message.to_string()));
    }

    /// Every list request received, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<(ResourceKey, QueryParams)> {
        self.lock().requests.clone()
    }

    /// Number of list requests received for `resource`.
    #[must_use]
    pub fn request_count(&self, resource: &ResourceKey) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|(r, _)| r == resource)
            .count()
    }

    /// Current rows of `resource`.
    #[must_use]
    pub fn rows(&self, resource: &ResourceKey) -> Vec<Value> {
        self.lock()
            .collections
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    async fn wait(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn id_of(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn matches_search(row: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    row.as_object().is_some_and(|fields| {
        fields
            .values()
            .filter_map(field_text)
            .any(|text| text.to_lowercase().contains(&needle))
    })
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => field_text(x).cmp(&field_text(y)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn not_found() -> ListingError {
    ListingError::Status {
        status: 404,
        message: "Not found.".to_string(),
    }
}

#[async_trait]
impl ListTransport for MemoryTransport {
    async fn fetch_page(
        &self,
        resource: &ResourceKey,
        params: &QueryParams,
    ) -> Result<ListResponse<Value>> {
        let delay = {
            let mut state = self.lock();
            state.requests.push((resource.clone(), params.clone()));
            state.latency_for(params)
        };
        Self::wait(delay).await;

        let mut state = self.lock();
        state.take_failure(resource)?;

        let mut rows: Vec<Value> = state
            .collections
            .get(resource)
            .cloned()
            .unwrap_or_default();
        drop(state);

        if let Some(search) = params.get("search") {
            rows.retain(|row| matches_search(row, search));
        }

        for (key, expected) in params.to_pairs() {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            rows.retain(|row| row.get(&key).and_then(field_text).as_deref() == Some(expected.as_str()));
        }

        if let Some(ordering) = params.get("ordering") {
            let (field, descending) = ordering
                .strip_prefix('-')
                .map_or((ordering, false), |field| (field, true));
            rows.sort_by(|a, b| {
                let order = compare_field(a, b, field);
                if descending {
                    order.reverse()
                } else {
                    order
                }
            });
        }

        let count = rows.len();
        let page_size = params.page_size().max(1);
        let page: usize = params
            .get("page")
            .and_then(|page| page.parse().ok())
            .unwrap_or(1);

        let start = page.saturating_sub(1).saturating_mul(page_size);
        if page == 0 || (start >= count && count > 0) {
            return Err(ListingError::Status {
                status: 404,
                message: "Invalid page.".to_string(),
            });
        }

        let results = rows.into_iter().skip(start).take(page_size).collect();
        Ok(ListResponse {
            count: count as u64,
            results,
        })
    }

    async fn create(&self, resource: &ResourceKey, body: &Value) -> Result<Value> {
        let delay = self.lock().latency;
        Self::wait(delay).await;

        let mut state = self.lock();
        state.take_failure(resource)?;

        let rows = state.collections.entry(resource.clone()).or_default();
        let next_id = rows
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1;

        let mut record = body.clone();
        if let Value::Object(fields) = &mut record {
            fields.insert("id".to_string(), Value::from(next_id));
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, resource: &ResourceKey, id: &str, body: &Value) -> Result<Value> {
        let delay = self.lock().latency;
        Self::wait(delay).await;

        let mut state = self.lock();
        state.take_failure(resource)?;

        let row = state
            .collections
            .get_mut(resource)
            .and_then(|rows| rows.iter_mut().find(|row| id_of(row).as_deref() == Some(id)))
            .ok_or_else(not_found)?;

        let original_id = row.get("id").cloned();
        let mut record = body.clone();
        if let (Value::Object(fields), Some(original_id)) = (&mut record, original_id) {
            fields.insert("id".to_string(), original_id);
        }
        *row = record.clone();
        Ok(record)
    }

    async fn delete(&self, resource: &ResourceKey, id: &str) -> Result<()> {
        let delay = self.lock().latency;
        Self::wait(delay).await;

        let mut state = self.lock();
        state.take_failure(resource)?;

        let rows = state.collections.get_mut(resource).ok_or_else(not_found)?;
        let position = rows
            .iter()
            .position(|row| id_of(row).as_deref() == Some(id))
            .ok_or_else(not_found)?;
        rows.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> MemoryTransport {
        let backend = MemoryTransport::new();
        backend.seed(
            "purchase-orders",
            vec![
                json!({ "id": 1, "po_number": "PO-001", "vendor": "ACME Corp", "status": "draft", "total": 120.5 }),
                json!({ "id": 2, "po_number": "PO-002", "vendor": "Globex", "status": "pending_approval", "total": 80 }),
                json!({ "id": 3, "po_number": "PO-003", "vendor": "ACME Labs", "status": "pending_approval", "total": 300 }),
            ],
        );
        backend
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn search_filter_and_ordering_compose() {
        let backend = backend();
        let page = backend
            .fetch_page(
                &ResourceKey::new("purchase-orders"),
                &params(&[
                    ("page", "1"),
                    ("page_size", "10"),
                    ("search", "acme"),
                    ("status", "pending_approval"),
                    ("ordering", "-total"),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(page.results[0]["po_number"], "PO-003");
    }

    #[tokio::test]
    async fn pages_are_one_based_and_bounded() {
        let backend = backend();
        let resource = ResourceKey::new("purchase-orders");

        let second = backend
            .fetch_page(&resource, &params(&[("page", "2"), ("page_size", "2"), ("ordering", "id")]))
            .await
            .unwrap();
        assert_eq!(second.count, 3);
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.results[0]["id"], 3);

        let err = backend
            .fetch_page(&resource, &params(&[("page", "5"), ("page_size", "2")]))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn mutations_change_rows() {
        let backend = backend();
        let resource = ResourceKey::new("purchase-orders");

        let created = backend
            .create(&resource, &json!({ "po_number": "PO-004", "vendor": "Initech" }))
            .await
            .unwrap();
        assert_eq!(created["id"], 4);

        backend
            .update(&resource, "2", &json!({ "po_number": "PO-002", "vendor": "Globex Intl" }))
            .await
            .unwrap();
        backend.delete(&resource, "1").await.unwrap();

        let rows = backend.rows(&resource);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().any(|row| row["vendor"] == "Globex Intl" && row["id"] == 2));
        assert_eq!(
            backend.delete(&resource, "1").await.unwrap_err().status(),
            Some(404)
        );
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let backend = backend();
        let resource = ResourceKey::new("purchase-orders");
        backend.fail_next("purchase-orders", 500, "boom");

        let query = params(&[("page", "1")]);
        assert_eq!(
            backend.fetch_page(&resource, &query).await.unwrap_err().status(),
            Some(500)
        );
        assert!(backend.fetch_page(&resource, &query).await.is_ok());
        assert_eq!(backend.request_count(&resource), 2);
    }
}
