//! Search bar and filter chip renderers.

use crate::ui::helpers::{position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{FilterChip, SearchBarInfo};

/// Horizontal margin of the search box.
const SEARCH_BOX_MARGIN: usize = 2;

/// Renders the 3-line search box at `row` and returns the row after it.
///
/// ```text
///   ┌──────────────────────┐
///   │ Search: acme …       │
///   └──────────────────────┘
/// ```
///
/// A trailing `…` marks input that has not settled yet.
pub fn render_search_bar(out: &mut String, row: usize, search: &SearchBarInfo, theme: &Theme, cols: usize) -> usize {
    let box_width = cols.saturating_sub(SEARCH_BOX_MARGIN * 2);
    let inner_width = box_width.saturating_sub(2);
    let margin = " ".repeat(SEARCH_BOX_MARGIN);
    let border = Theme::fg(&theme.colors.search_bar_border);

    position_cursor(out, row, 1);
    out.push_str(&margin);
    out.push_str(&border);
    out.push_str(&format!("┌{}┐", "─".repeat(inner_width)));
    out.push_str(Theme::reset());

    let suffix = if search.pending { " …" } else { "" };
    let search_text = truncate(&format!(" Search: {}{suffix}", search.query), inner_width);
    let padding = inner_width.saturating_sub(search_text.chars().count());

    position_cursor(out, row + 1, 1);
    out.push_str(&margin);
    out.push_str(&border);
    out.push('│');
    out.push_str(&Theme::fg(&theme.colors.text_normal));
    out.push_str(&search_text);
    out.push_str(&" ".repeat(padding));
    out.push_str(&border);
    out.push('│');
    out.push_str(Theme::reset());

    position_cursor(out, row + 2, 1);
    out.push_str(&margin);
    out.push_str(&border);
    out.push_str(&format!("└{}┘", "─".repeat(inner_width)));
    out.push_str(Theme::reset());

    row + 3
}

/// Renders active filters as `[key: value]` chips on one line.
pub fn render_filter_chips(out: &mut String, row: usize, chips: &[FilterChip], theme: &Theme, cols: usize) -> usize {
    let line = chips
        .iter()
        .map(|chip| format!("[{}: {}]", chip.key, chip.value))
        .collect::<Vec<_>>()
        .join(" ");
    let line = truncate(&format!(" {line}"), cols);

    position_cursor(out, row, 1);
    out.push_str(&Theme::fg(&theme.colors.chip_fg));
    out.push_str(&line);
    out.push_str(&" ".repeat(cols.saturating_sub(line.chars().count())));
    out.push_str(Theme::reset());
    row + 1
}
