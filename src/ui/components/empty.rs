//! Centered messages shown in place of the table rows.

use crate::ui::helpers::{position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

/// Renders a centered message with an optional dimmed subtitle below it.
///
/// Returns the row after the last line written.
pub fn render_message(
    out: &mut String,
    row: usize,
    message: &str,
    subtitle: Option<&str>,
    color: &str,
    theme: &Theme,
    cols: usize,
) -> usize {
    centered_line(out, row, message, &Theme::fg(color), cols);
    match subtitle {
        Some(subtitle) => {
            let style = format!("{}{}", Theme::dim(), Theme::fg(&theme.colors.text_dim));
            centered_line(out, row + 1, subtitle, &style, cols);
            row + 2
        }
        None => row + 1,
    }
}

/// Renders the empty state of a successful request with no rows.
pub fn render_empty_state(out: &mut String, row: usize, empty: &EmptyState, theme: &Theme, cols: usize) -> usize {
    render_message(
        out,
        row,
        &empty.message,
        Some(&empty.subtitle),
        &theme.colors.empty_state_fg,
        theme,
        cols,
    )
}

fn centered_line(out: &mut String, row: usize, text: &str, style: &str, cols: usize) {
    let text = truncate(text, cols);
    let len = text.chars().count();
    let padding = cols.saturating_sub(len) / 2;

    position_cursor(out, row, 1);
    out.push_str(style);
    out.push_str(&" ".repeat(padding));
    out.push_str(&text);
    out.push_str(&" ".repeat(cols.saturating_sub(padding + len)));
    out.push_str(Theme::reset());
}
