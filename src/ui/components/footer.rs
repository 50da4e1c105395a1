//! Footer component renderer.
//!
//! Two lines: the pagination label with keybinding hints, and below it the
//! notification of the last mutation when there is one.

use crate::app::{Notification, NotificationKind};
use crate::ui::helpers::{position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::FooterInfo;

/// Renders the pagination and keybinding line at `row`.
///
/// The page label is left-aligned; keybindings are right-aligned and dropped
/// first when the terminal is too narrow for both.
pub fn render_footer(out: &mut String, row: usize, footer: &FooterInfo, theme: &Theme, cols: usize) -> usize {
    let label = truncate(&footer.page_label, cols);
    let label_len = label.chars().count();
    let room = cols.saturating_sub(label_len + 2);
    let hints = if footer.keybindings.chars().count() <= room {
        footer.keybindings.as_str()
    } else {
        ""
    };
    let hints_len = hints.chars().count();

    position_cursor(out, row, 1);
    out.push_str(&Theme::fg(&theme.colors.text_normal));
    out.push_str(&label);
    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(&" ".repeat(cols.saturating_sub(label_len + hints_len)));
    out.push_str(hints);
    out.push_str(Theme::reset());
    row + 1
}

/// Renders the notification line at `row`, colored by its kind.
pub fn render_notification(
    out: &mut String,
    row: usize,
    notification: &Notification,
    theme: &Theme,
    cols: usize,
) -> usize {
    let (marker, color) = match notification.kind {
        NotificationKind::Success => ("✓", &theme.colors.success_fg),
        NotificationKind::Error => ("✗", &theme.colors.error_fg),
    };
    let text = truncate(&format!("{marker} {}", notification.message), cols);

    position_cursor(out, row, 1);
    out.push_str(&Theme::fg(color));
    out.push_str(&text);
    out.push_str(&" ".repeat(cols.saturating_sub(text.chars().count())));
    out.push_str(Theme::reset());
    row + 1
}
