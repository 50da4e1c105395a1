//! Composable renderers for the parts of a listing screen.
//!
//! - [`header`]: Title bar with the row count
//! - [`search`]: Search box and active filter chips
//! - [`table`]: Column headers and rows
//! - [`empty`]: Centered loading, error and empty-state messages
//! - [`footer`]: Pagination line and mutation notification
//!
//! Layout, top to bottom:
//!
//! ```text
//! [blank line]
//! [Header]
//! [Border]
//! [Search Bar - 3 lines]     (when searching)
//! [Filter chips]             (when filters are active)
//! [Column headers]
//! [Rows | Loading | Error | Empty]
//! [Blank padding]
//! [Notification]             (after a mutation)
//! [Border]
//! [Footer]
//! ```

mod empty;
mod footer;
mod header;
mod search;
mod table;

use crate::ui::helpers::position_cursor;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{TableBody, TableViewModel};

use empty::{render_empty_state, render_message};
use footer::{render_footer, render_notification};
use header::render_header;
use search::{render_filter_chips, render_search_bar};
use table::{render_table_headers, render_table_rows};

/// Renders a horizontal border line at `row`.
fn render_border(out: &mut String, row: usize, color: &str, cols: usize) -> usize {
    position_cursor(out, row, 1);
    out.push_str(&Theme::fg(color));
    out.push_str(&"─".repeat(cols));
    out.push_str(Theme::reset());
    row + 1
}

/// Renders a full listing screen of `rows` x `cols`.
pub fn render_listing(out: &mut String, vm: &TableViewModel, theme: &Theme, cols: usize, rows: usize) {
    let mut current_row = 2;

    current_row = render_header(out, current_row, &vm.header, theme, cols);
    current_row = render_border(out, current_row, &theme.colors.border, cols);
    if let Some(search) = &vm.search_bar {
        current_row = render_search_bar(out, current_row, search, theme, cols);
    }
    if !vm.filter_chips.is_empty() {
        current_row = render_filter_chips(out, current_row, &vm.filter_chips, theme, cols);
    }
    current_row = render_table_headers(out, current_row, &vm.columns, theme, cols);

    let message_row = current_row + 1;
    match &vm.body {
        TableBody::Loading => {
            render_message(out, message_row, "Loading…", None, &theme.colors.text_dim, theme, cols);
        }
        TableBody::Error { message } => {
            render_message(
                out,
                message_row,
                message,
                Some("Press r to retry"),
                &theme.colors.error_fg,
                theme,
                cols,
            );
        }
        TableBody::Empty(empty) => {
            render_empty_state(out, message_row, empty, theme, cols);
        }
        TableBody::Rows { rows: display_rows, .. } => {
            render_table_rows(out, current_row, display_rows, theme, cols);
        }
    }

    let footer_row = rows.saturating_sub(1);
    let border_row = footer_row.saturating_sub(1);

    if let Some(notification) = &vm.notification {
        render_notification(out, border_row.saturating_sub(1), notification, theme, cols);
    }
    render_border(out, border_row, &theme.colors.border, cols);
    render_footer(out, footer_row, &vm.footer, theme, cols);
}
