//! Top-level rendering entry point.
//!
//! Computes the view model from the listing state and delegates to the
//! component renderers. The frame is returned as a string; clearing the
//! screen and printing is left to the caller.

use crate::app::ListingState;
use crate::ui::components;
use crate::ui::viewmodel::TableViewModel;
use crate::ui::theme::Theme;

/// Renders `state` to an ANSI frame for a terminal of `rows` x `cols`.
///
/// # Example
///
/// ```
/// use erp_listing::app::ListingState;
/// use erp_listing::domain::{pages, PageFilterState};
/// use erp_listing::ui::{render, Theme};
///
/// let state = ListingState::new(pages::contacts(), PageFilterState::default(), 10, Theme::default());
/// let frame = render(&state, 24, 80);
/// assert!(frame.contains("Contacts"));
/// assert!(frame.contains("Loading"));
/// ```
#[must_use]
pub fn render(state: &ListingState, rows: usize, cols: usize) -> String {
    let viewmodel = state.compute_viewmodel(rows, cols);
    render_viewmodel(&viewmodel, &state.theme, rows, cols)
}

/// Renders an already computed view model.
#[must_use]
pub fn render_viewmodel(vm: &TableViewModel, theme: &Theme, rows: usize, cols: usize) -> String {
    let mut out = String::new();
    components::render_listing(&mut out, vm, theme, cols, rows);
    out
}
