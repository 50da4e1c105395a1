//! erp-listing: server-driven data tables for ERP admin listings.
//!
//! Every listing page of the console (employees, positions, purchase orders,
//! salary slips, contacts, short URLs) is backed by the same engine:
//! - Server-side pagination, sorting, search and per-field filters
//! - Search input debounced over a 500 ms quiet period
//! - Per-page filters that survive navigation, optionally persisted to disk
//! - A de-duplicating list cache with per-resource invalidation after mutations

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Terminal front end (main.rs)                       │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - Event handling                                   │
//! │  - Action execution (controller)                    │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Store Layer   │   │ Worker Layer  │
//! │ (ui/)         │   │ (store/)      │   │ (worker/)     │
//! │ - Rendering   │   │ - Filters     │   │ - Fetch       │
//! │ - Theming     │   │ - Snapshot    │   │ - Mutate      │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                                                   │
//!                                  ┌────────────────────────────────┐
//!                                  │ cache/ → transport/ (REST)     │
//!                                  └────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Listing state machine with event/action model
//! - [`domain`]: Filters, queries, resources, built-in pages and errors
//! - [`infrastructure`]: Debounce timer and data directory paths
//! - [`store`]: Per-page filter store with optional JSON snapshot
//! - [`cache`]: De-duplicating remote list cache
//! - [`transport`]: REST client and in-memory backend
//! - [`worker`]: Fetch and mutation messages
//! - [`ui`]: Terminal rendering with theme support
//! - [`observability`]: OpenTelemetry tracing to a local file
//!
//! # Configuration
//!
//! ```toml
//! base_url = "http://localhost:8000/api"
//! page_size = 10
//! debounce_ms = 500
//! state_file = "~/.local/share/erp-listing/filters.json"
//! theme = "catppuccin-latte"
//! trace_level = "debug"
//! ```
//!
//! # Example
//!
//! ```
//! use erp_listing::app::{Event, ListingController};
//! use erp_listing::domain::{pages, FilterValue};
//! use erp_listing::transport::MemoryTransport;
//! use erp_listing::{initialize_with_transport, Config};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> erp_listing::Result<()> {
//! let backend = Arc::new(MemoryTransport::new());
//! backend.seed(
//!     "purchase-orders",
//!     vec![
//!         json!({ "id": 1, "po_number": "PO-1", "vendor": "ACME", "status": "draft" }),
//!         json!({ "id": 2, "po_number": "PO-2", "vendor": "Globex", "status": "approved" }),
//!     ],
//! );
//!
//! let context = initialize_with_transport(&Config::default(), backend)?;
//! let mut view = ListingController::new(&context, pages::purchase_orders());
//! view.mount()?;
//! view.dispatch(Event::SetFilter { key: "status".into(), value: FilterValue::parse("draft") })?;
//! view.settle().await?;
//!
//! assert_eq!(view.state().count, 1);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cache;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod store;
pub mod transport;
pub mod ui;
pub mod worker;

pub use app::{handle_event, Action, Event, ListingController, ListingState};
pub use domain::{ListingError, Result};
pub use ui::Theme;

use cache::RemoteListCache;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::{FilterStore, JsonStorage};
use transport::{HttpTransport, ListTransport};

/// Console configuration, read from a TOML file and `key=value` overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the REST API. Default: `http://localhost:8000/api`
    pub base_url: String,

    /// Rows per page. Default: 10
    pub page_size: usize,

    /// Search quiet period in milliseconds. Default: 500
    pub debounce_ms: u64,

    /// Whole-request timeout in seconds. Default: 10
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds. Default: 5
    pub connect_timeout_secs: u64,

    /// Path of the filter snapshot. Filters stay in memory when unset.
    ///
    /// A leading `~` is expanded to the home directory.
    pub state_file: Option<String>,

    /// Built-in theme name: `catppuccin-mocha` or `catppuccin-latte`.
    pub theme: Option<String>,

    /// Path to a custom TOML theme file. Takes precedence over `theme`.
    pub theme_file: Option<String>,

    /// Tracing level: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            page_size: domain::query::DEFAULT_PAGE_SIZE,
            debounce_ms: 500,
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            state_file: None,
            theme: None,
            theme_file: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Reads a TOML configuration file. Missing keys take their defaults and
    /// a zero page size falls back to the default one.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Config`] if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ListingError::Config(format!("{}: {e}", path.display())))?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ListingError::Config(format!("{}: {e}", path.display())))?;
        if config.page_size == 0 {
            tracing::warn!(path = %path.display(), "page_size = 0 in config, using the default");
            config.page_size = domain::query::DEFAULT_PAGE_SIZE;
        }
        Ok(config)
    }

    /// Builds a configuration from a flat `key=value` map.
    ///
    /// Unknown keys are ignored and unparsable numbers fall back to the
    /// defaults, as do zero page sizes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use erp_listing::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("page_size".to_string(), "25".to_string());
    /// map.insert("debounce_ms".to_string(), "soon".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.page_size, 25);
    /// assert_eq!(config.debounce_ms, 500);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self::default().with_overrides(map)
    }

    /// Applies `key=value` overrides on top of this configuration.
    #[must_use]
    pub fn with_overrides(mut self, map: &BTreeMap<String, String>) -> Self {
        fn parsed<T: std::str::FromStr>(map: &BTreeMap<String, String>, key: &str) -> Option<T> {
            map.get(key).and_then(|s| s.trim().parse().ok())
        }
        fn text(map: &BTreeMap<String, String>, key: &str) -> Option<String> {
            map.get(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        if let Some(base_url) = text(map, "base_url") {
            self.base_url = base_url;
        }
        if let Some(page_size) = parsed::<usize>(map, "page_size").filter(|n| *n > 0) {
            self.page_size = page_size;
        }
        if let Some(debounce_ms) = parsed(map, "debounce_ms") {
            self.debounce_ms = debounce_ms;
        }
        if let Some(secs) = parsed(map, "request_timeout_secs") {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = parsed(map, "connect_timeout_secs") {
            self.connect_timeout_secs = secs;
        }
        if let Some(state_file) = text(map, "state_file") {
            self.state_file = Some(state_file);
        }
        if let Some(theme) = text(map, "theme") {
            self.theme = Some(theme);
        }
        if let Some(theme_file) = text(map, "theme_file") {
            self.theme_file = Some(theme_file);
        }
        if let Some(trace_level) = text(map, "trace_level") {
            self.trace_level = Some(trace_level);
        }
        self
    }

    fn state_path(&self) -> Option<PathBuf> {
        self.state_file.as_deref().map(infrastructure::expand_tilde)
    }
}

/// Everything the listing views of one console share.
#[derive(Debug, Clone)]
pub struct ListingContext {
    pub config: Config,
    /// Filters per page, kept across remounts and watched by mounted views.
    pub store: FilterStore,
    /// List responses shared by every view of the console.
    pub cache: RemoteListCache,
    /// Theme resolved from the configuration.
    pub theme: Theme,
}

/// Builds the shared context against the configured REST backend.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the filter
/// snapshot cannot be read.
pub fn initialize(config: &Config) -> Result<ListingContext> {
    let transport = HttpTransport::new(
        config.base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
        Duration::from_secs(config.connect_timeout_secs),
    )?;
    initialize_with_transport(config, Arc::new(transport))
}

/// Builds the shared context on top of `transport`.
///
/// An unknown theme or unreadable theme file falls back to the default theme.
///
/// # Errors
///
/// Returns an error if the filter snapshot cannot be read.
pub fn initialize_with_transport(
    config: &Config,
    transport: Arc<dyn ListTransport>,
) -> Result<ListingContext> {
    tracing::debug!(base_url = %config.base_url, "initializing listing context");

    let theme_file = config.theme_file.as_deref().map(infrastructure::expand_tilde);
    let theme = Theme::resolve(config.theme.as_deref(), theme_file.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load theme, using default");
        Theme::default()
    });

    let store = match config.state_path() {
        Some(path) => FilterStore::with_storage(Box::new(JsonStorage::new(path)?))?,
        None => FilterStore::new(),
    };

    Ok(ListingContext {
        config: config.clone(),
        store,
        cache: RemoteListCache::new(transport),
        theme,
    })
}
