//! Per-page filter state.
//!
//! A listing page keeps its settled search text and its selected filter values
//! in a [`PageFilterState`]. Filter values are a small tagged variant
//! ([`FilterValue`]) so that "no filter" is a distinct value rather than a
//! magic string, and listing pages that want compile-time checked keys go
//! through the [`PageFilters`] trait.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel used by filter controls for "no filter applied".
pub const ALL: &str = "all";

/// Value selected in one filter control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    /// No filter applied; never sent to the server.
    #[default]
    All,
    /// Free-form or enumerated text value.
    Text(String),
    /// Boolean toggle such as `paid` or `is_active`.
    Bool(bool),
}

impl FilterValue {
    /// Parses a raw control value, mapping the `"all"` sentinel to [`FilterValue::All`].
    ///
    /// `"true"`/`"false"` stay text; callers that own a boolean control build
    /// [`FilterValue::Bool`] directly.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(ALL) {
            Self::All
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    /// Whether this value narrows the listing and must be sent.
    ///
    /// `All`, the empty string and the `"all"` text are all inactive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::All => false,
            Self::Text(text) => !text.is_empty() && !text.eq_ignore_ascii_case(ALL),
            Self::Bool(_) => true,
        }
    }

    /// Renders the value as a query parameter, `None` when inactive.
    #[must_use]
    pub fn as_param(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        match self {
            Self::All => None,
            Self::Text(text) => Some(text.clone()),
            Self::Bool(flag) => Some(flag.to_string()),
        }
    }
}

impl From<Option<bool>> for FilterValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::All, Self::Bool)
    }
}

impl From<Option<String>> for FilterValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::All, Self::Text)
    }
}

/// Search text and filter selections of one listing page.
///
/// Replaced wholesale on every change: callers read the current state, derive
/// a new one with [`PageFilterState::with_filter`] or
/// [`PageFilterState::with_search`], and write it back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageFilterState {
    /// Settled (debounced) search text.
    #[serde(default)]
    pub search: String,

    /// Filter name to selected value.
    #[serde(default)]
    pub values: BTreeMap<String, FilterValue>,
}

impl PageFilterState {
    /// Returns the value of `key`, [`FilterValue::All`] when unset.
    #[must_use]
    pub fn get(&self, key: &str) -> FilterValue {
        self.values.get(key).cloned().unwrap_or_default()
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with_filter(&self, key: impl Into<String>, value: FilterValue) -> Self {
        let mut next = self.clone();
        next.values.insert(key.into(), value);
        next
    }

    /// Returns a copy with the search text replaced.
    #[must_use]
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            values: self.values.clone(),
        }
    }

    /// Iterates over the filters that must be sent, as `(key, param)` pairs.
    pub fn active(&self) -> impl Iterator<Item = (&str, String)> {
        self.values
            .iter()
            .filter_map(|(key, value)| value.as_param().map(|param| (key.as_str(), param)))
    }

    /// Whether neither search nor any filter narrows the listing.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty() && self.active().next().is_none()
    }
}

/// Strongly-typed filter set of one listing page.
///
/// Implementors convert to and from the string-keyed [`PageFilterState`] the
/// store and query builder work with, so filter keys are spelled once.
pub trait PageFilters: Default + Clone + Send + Sync + 'static {
    /// Page identifier the filters are stored under.
    const PAGE_ID: &'static str;

    /// Writes the typed filters into `base`, keeping its search text.
    fn apply_to(&self, base: &PageFilterState) -> PageFilterState;

    /// Reads the typed filters back; unknown or malformed values fall back to "all".
    fn from_state(state: &PageFilterState) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_and_empty_values_are_inactive() {
        assert!(!FilterValue::All.is_active());
        assert!(!FilterValue::parse("all").is_active());
        assert!(!FilterValue::parse(" ALL ").is_active());
        assert!(!FilterValue::Text(String::new()).is_active());
        assert!(!FilterValue::Text("all".into()).is_active());
        assert!(FilterValue::Bool(false).is_active());
        assert_eq!(FilterValue::Bool(false).as_param().as_deref(), Some("false"));
    }

    #[test]
    fn active_skips_inactive_filters() {
        let state = PageFilterState::default()
            .with_filter("status", FilterValue::parse("pending_approval"))
            .with_filter("priority", FilterValue::All)
            .with_filter("vendor", FilterValue::Text(String::new()));

        let active: Vec<_> = state.active().collect();
        assert_eq!(active, vec![("status", "pending_approval".to_string())]);
        assert!(!state.is_unfiltered());
    }

    #[test]
    fn with_filter_leaves_original_untouched() {
        let base = PageFilterState::default().with_search("acme");
        let next = base.with_filter("paid", FilterValue::Bool(true));

        assert!(base.values.is_empty());
        assert_eq!(next.search, "acme");
        assert_eq!(next.get("paid"), FilterValue::Bool(true));
        assert_eq!(next.get("missing"), FilterValue::All);
    }
}
