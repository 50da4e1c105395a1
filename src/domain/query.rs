//! Pagination, sorting and query parameter construction.
//!
//! [`build_query`] is the single place where view state turns into request
//! parameters. It only narrows its inputs: inactive filters, an empty search
//! and an empty sort are omitted rather than sent as empty strings, because
//! the collection endpoints treat an absent parameter differently from an
//! explicit empty one.

use super::filters::PageFilterState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Parameter names owned by the query builder; filters may not shadow them.
pub const RESERVED_PARAMS: [&str; 4] = ["page", "page_size", "search", "ordering"];

/// Current page of a listing (0-based index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationState {
    /// Zero-based page index; sent to the server as `page_index + 1`.
    pub page_index: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl PaginationState {
    /// First page with the given size.
    #[must_use]
    pub const fn first(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size,
        }
    }

    /// Same page size, back to the first page.
    #[must_use]
    pub const fn reset(self) -> Self {
        Self::first(self.page_size)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One sorted column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortEntry {
    /// Column identifier, also the server-side ordering field.
    pub column_id: String,
    /// Descending when `true`.
    pub descending: bool,
}

/// Sort direction shown next to a column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordered sort entries. Listings sort by at most one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortState(pub Vec<SortEntry>);

impl SortState {
    /// No sorting.
    #[must_use]
    pub const fn unsorted() -> Self {
        Self(Vec::new())
    }

    /// Sorted by a single column.
    #[must_use]
    pub fn by(column_id: impl Into<String>, descending: bool) -> Self {
        Self(vec![SortEntry {
            column_id: column_id.into(),
            descending,
        }])
    }

    /// Cycles `column_id` through ascending, descending and unsorted.
    ///
    /// Any other sorted column is cleared, so the result holds at most one entry.
    #[must_use]
    pub fn toggle(&self, column_id: &str) -> Self {
        match self.direction_of(column_id) {
            None => Self::by(column_id, false),
            Some(SortDirection::Ascending) => Self::by(column_id, true),
            Some(SortDirection::Descending) => Self::unsorted(),
        }
    }

    /// Direction `column_id` is currently sorted in, if any.
    #[must_use]
    pub fn direction_of(&self, column_id: &str) -> Option<SortDirection> {
        self.0
            .iter()
            .find(|entry| entry.column_id == column_id)
            .map(|entry| {
                if entry.descending {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                }
            })
    }

    /// The `ordering` parameter (`field` or `-field`), `None` when unsorted.
    #[must_use]
    pub fn ordering(&self) -> Option<String> {
        self.0.first().map(|entry| {
            if entry.descending {
                format!("-{}", entry.column_id)
            } else {
                entry.column_id.clone()
            }
        })
    }
}

/// Flat request parameters for one collection read.
///
/// Built fresh for every request and never mutated afterwards; value equality
/// is what the list cache keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Looks up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Parameters as owned pairs, in key order, for the HTTP client.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Page size requested, falling back to the default.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.get("page_size")
            .and_then(|size| size.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

impl std::fmt::Display for QueryParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Everything the query builder looks at.
#[derive(Debug, Clone, Copy)]
pub struct QueryInput<'a> {
    pub pagination: PaginationState,
    pub sorting: &'a SortState,
    pub filters: &'a PageFilterState,
    /// Debounced search text; the raw input is never sent.
    pub search: &'a str,
}

/// Maps view state to the parameters of a paginated collection request.
///
/// - `page` is 1-based, `page_size` is always present.
/// - `search` is present only when the trimmed search text is non-empty.
/// - `ordering` is present only when a sort entry exists.
/// - Filters are present only when active; keys that collide with
///   [`RESERVED_PARAMS`] are dropped.
///
/// # Example
///
/// ```
/// use erp_listing::domain::{build_query, FilterValue, PageFilterState, PaginationState, QueryInput, SortState};
///
/// let filters = PageFilterState::default()
///     .with_filter("status", FilterValue::All)
///     .with_filter("priority", FilterValue::parse("high"));
/// let params = build_query(QueryInput {
///     pagination: PaginationState::first(25),
///     sorting: &SortState::by("created_at", true),
///     filters: &filters,
///     search: "",
/// });
///
/// assert_eq!(params.to_string(), "ordering=-created_at&page=1&page_size=25&priority=high");
/// ```
#[must_use]
pub fn build_query(input: QueryInput<'_>) -> QueryParams {
    let mut params = BTreeMap::new();

    params.insert("page".to_string(), (input.pagination.page_index + 1).to_string());
    params.insert("page_size".to_string(), input.pagination.page_size.to_string());

    let search = input.search.trim();
    if !search.is_empty() {
        params.insert("search".to_string(), search.to_string());
    }

    if let Some(ordering) = input.sorting.ordering() {
        params.insert("ordering".to_string(), ordering);
    }

    for (key, value) in input.filters.active() {
        if RESERVED_PARAMS.contains(&key) {
            tracing::debug!(filter = %key, "filter shadows a reserved parameter, skipping");
            continue;
        }
        params.insert(key.to_string(), value);
    }

    QueryParams(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::FilterValue;

    fn query(filters: &PageFilterState, search: &str, sorting: &SortState, page_index: usize) -> QueryParams {
        build_query(QueryInput {
            pagination: PaginationState {
                page_index,
                page_size: 10,
            },
            sorting,
            filters,
            search,
        })
    }

    #[test]
    fn inactive_filters_are_omitted() {
        let filters = PageFilterState::default()
            .with_filter("status", FilterValue::All)
            .with_filter("priority", FilterValue::Text("all".into()))
            .with_filter("vendor", FilterValue::Text(String::new()))
            .with_filter("paid", FilterValue::Bool(false));

        let params = query(&filters, "", &SortState::unsorted(), 0);

        assert!(!params.contains("status"));
        assert!(!params.contains("priority"));
        assert!(!params.contains("vendor"));
        assert_eq!(params.get("paid"), Some("false"));
    }

    #[test]
    fn empty_search_and_sort_are_omitted() {
        let params = query(&PageFilterState::default(), "   ", &SortState::unsorted(), 2);

        assert_eq!(params.get("page"), Some("3"));
        assert_eq!(params.get("page_size"), Some("10"));
        assert!(!params.contains("search"));
        assert!(!params.contains("ordering"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn ordering_is_negated_when_descending() {
        let filters = PageFilterState::default();
        assert_eq!(
            query(&filters, "", &SortState::by("name", false), 0).get("ordering"),
            Some("name")
        );
        assert_eq!(
            query(&filters, "", &SortState::by("name", true), 0).get("ordering"),
            Some("-name")
        );
    }

    #[test]
    fn reserved_keys_cannot_be_shadowed() {
        let filters = PageFilterState::default().with_filter("page", FilterValue::parse("99"));
        let params = query(&filters, "acme", &SortState::unsorted(), 0);

        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("search"), Some("acme"));
    }

    #[test]
    fn toggle_cycles_and_clears_other_columns() {
        let sort = SortState::unsorted().toggle("name");
        assert_eq!(sort.direction_of("name"), Some(SortDirection::Ascending));

        let sort = sort.toggle("name");
        assert_eq!(sort.direction_of("name"), Some(SortDirection::Descending));

        let sort = sort.toggle("name");
        assert_eq!(sort, SortState::unsorted());

        let sort = SortState::by("name", true).toggle("code");
        assert_eq!(sort.0.len(), 1);
        assert_eq!(sort.direction_of("name"), None);
        assert_eq!(sort.direction_of("code"), Some(SortDirection::Ascending));
    }

    #[test]
    fn equal_inputs_build_equal_params() {
        let filters = PageFilterState::default().with_filter("status", FilterValue::parse("draft"));
        let a = query(&filters, "acme", &SortState::by("date", true), 1);
        let b = query(&filters.clone(), "acme ", &SortState::by("date", true), 1);
        assert_eq!(a, b);
    }
}
