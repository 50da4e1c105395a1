//! Resource families, page identifiers and list payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend collection a listing reads from, e.g. `purchase-orders`.
///
/// Doubles as the URL path segment and as the invalidation unit of the list
/// cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Creates a key, trimming surrounding slashes.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self(key.trim_matches('/').to_string())
    }

    /// Key as a path segment.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Stable name of one listing screen; the filter store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Wire shape of a paginated collection response.
///
/// Fields other than `count` and `results` (`next`, `previous`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Total rows matching the query, across all pages.
    pub count: u64,
    pub results: Vec<T>,
}

/// One page of a collection as the data table consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteListResult<T> {
    /// Rows of the requested page.
    pub results: Vec<T>,
    /// Total rows matching the query.
    pub count: u64,
    pub page_count: usize,
}

impl<T> RemoteListResult<T> {
    /// Wraps a response, deriving `page_count = ceil(count / page_size)`.
    #[must_use]
    pub fn from_response(response: ListResponse<T>, page_size: usize) -> Self {
        Self {
            page_count: page_count(response.count, page_size),
            count: response.count,
            results: response.results,
        }
    }

    /// Whether the page holds no rows. An empty page is still a successful read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl RemoteListResult<serde_json::Value> {
    /// Decodes the JSON rows into a concrete record type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ListingError::Decode`] when a row does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> crate::Result<RemoteListResult<T>> {
        let results = self
            .results
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(RemoteListResult {
            results,
            count: self.count,
            page_count: self.page_count,
        })
    }
}

/// Number of pages needed for `count` rows, 0 when `page_size` is 0.
#[must_use]
pub fn page_count(count: u64, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    let size = page_size as u64;
    usize::try_from(count.div_ceil(size)).unwrap_or(usize::MAX)
}

/// Change applied to a resource family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// `POST /<resource>/`
    Create { body: serde_json::Value },
    /// `PUT /<resource>/<id>/`
    Update { id: String, body: serde_json::Value },
    /// `DELETE /<resource>/<id>/`
    Delete { id: String },
}

impl Mutation {
    /// Short verb for logs and notifications.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn response_ignores_extra_fields() {
        let body = serde_json::json!({
            "count": 21,
            "next": "http://localhost/api/positions/?page=2",
            "previous": null,
            "results": [{"id": 1, "name": "Clerk"}]
        });
        let response: ListResponse<serde_json::Value> = serde_json::from_value(body).unwrap();
        let result = RemoteListResult::from_response(response, 10);
        assert_eq!(result.count, 21);
        assert_eq!(result.page_count, 3);
        assert_eq!(result.results.len(), 1);
    }

    #[test]
    fn resource_key_trims_slashes() {
        assert_eq!(ResourceKey::new("/purchase-orders/").as_str(), "purchase-orders");
    }
}
