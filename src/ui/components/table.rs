//! Table component renderer.
//!
//! Column headers carry the sort indicator of their column; rows are padded
//! to the full terminal width so the selection background spans the line.

use crate::ui::helpers::{self, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{ColumnHeader, DisplayRow};

/// Renders the column header line at `row`.
///
/// Unsortable columns are dimmed.
pub fn render_table_headers(out: &mut String, row: usize, columns: &[ColumnHeader], theme: &Theme, cols: usize) -> usize {
    position_cursor(out, row, 1);
    out.push_str(Theme::bold());

    let mut used = 0;
    for column in columns {
        if used >= cols {
            break;
        }
        let width = column.width.min(cols - used);
        let label = truncate(&column.display_label(), width);

        out.push_str(&Theme::fg(&theme.colors.header_fg));
        if !column.sortable {
            out.push_str(Theme::dim());
        }
        out.push_str(&format!("{label:<width$}"));
        out.push_str(Theme::reset());
        out.push_str(Theme::bold());
        out.push(' ');
        used += width + 1;
    }

    out.push_str(&" ".repeat(cols.saturating_sub(used)));
    out.push_str(Theme::reset());
    row + 1
}

/// Renders `rows` starting at `row` and returns the row after the last one.
pub fn render_table_rows(out: &mut String, row: usize, rows: &[DisplayRow], theme: &Theme, cols: usize) -> usize {
    let mut current_row = row;
    for display_row in rows {
        current_row = render_table_row(out, current_row, display_row, theme, cols);
    }
    current_row
}

fn render_table_row(out: &mut String, row: usize, display_row: &DisplayRow, theme: &Theme, cols: usize) -> usize {
    position_cursor(out, row, 1);

    if display_row.is_selected {
        out.push_str(&Theme::fg(&theme.colors.selection_fg));
        out.push_str(&Theme::bg(&theme.colors.selection_bg));
    } else {
        out.push_str(&Theme::fg(&theme.colors.text_normal));
    }

    let mut used = 0;
    for cell in &display_row.cells {
        helpers::render_highlighted_text(out, &cell.text, &cell.highlight_ranges, theme, display_row.is_selected);
        out.push_str(&" ".repeat(cell.width.saturating_sub(cell.text.chars().count()) + 1));
        used += cell.width + 1;
    }

    out.push_str(&" ".repeat(cols.saturating_sub(used)));
    out.push_str(Theme::reset());
    row + 1
}
