//! Presentation-only data table.
//!
//! The table renders what the listing state tells it and reports user intent
//! upward as [`Event`](crate::app::Event)s (`PageChange`, `ToggleSort`); it
//! never fetches on its own.
//!
//! ```text
//! ListingState → compute_viewmodel → TableViewModel → render → ANSI frame
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: View model types
//! - [`renderer`]: Rendering entry point
//! - [`components`]: Header, search, table, message and footer renderers
//! - [`helpers`]: Highlighting, truncation and cursor positioning
//! - [`theme`]: Color schemes and ANSI escape sequences

pub mod components;
pub mod helpers;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use renderer::{render, render_viewmodel};
pub use theme::Theme;
pub use viewmodel::{
    ColumnHeader, DisplayCell, DisplayRow, EmptyState, FilterChip, FooterInfo, HeaderInfo,
    SearchBarInfo, TableBody, TableViewModel,
};
