//! Shared rendering utilities.
//!
//! Components write into a `String` frame instead of stdout so a frame can be
//! built once and printed, or inspected in tests.
//!
//! # Example
//!
//! ```
//! use erp_listing::ui::helpers::{highlight_ranges, render_highlighted_text};
//! use erp_listing::ui::Theme;
//!
//! let ranges = highlight_ranges("ACME Supplies", "acme");
//! assert_eq!(ranges, vec![(0, 4)]);
//!
//! let mut out = String::new();
//! render_highlighted_text(&mut out, "ACME Supplies", &ranges, &Theme::default(), false);
//! assert!(out.contains("ACME"));
//! ```

use crate::ui::theme::Theme;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Appends the ANSI sequence moving the cursor to `row`, `col` (1-indexed).
pub fn position_cursor(out: &mut String, row: usize, col: usize) {
    out.push_str(&format!("\u{1b}[{row};{col}H"));
}

/// Character ranges of `text` matched by a fuzzy `query`.
///
/// Consecutive match indices are coalesced into `(start, end)` ranges with an
/// exclusive end. Returns an empty list for an empty query or no match.
#[must_use]
pub fn highlight_ranges(text: &str, query: &str) -> Vec<(usize, usize)> {
    let query = query.trim();
    if query.is_empty() {
        return vec![];
    }

    let matcher = SkimMatcherV2::default();
    let Some((_score, indices)) = matcher.fuzzy_indices(text, query) else {
        return vec![];
    };

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for idx in indices {
        match ranges.last_mut() {
            Some((_, end)) if *end == idx => *end = idx + 1,
            _ => ranges.push((idx, idx + 1)),
        }
    }
    ranges
}

/// Truncates `text` to `width` characters, ending with `...` when cut.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let kept: String = text.chars().take(width - 3).collect();
    format!("{kept}...")
}

/// Writes `text` with the given character ranges highlighted.
///
/// Selected rows are written without match highlighting so the selection
/// colors stay intact.
pub fn render_highlighted_text(
    out: &mut String,
    text: &str,
    ranges: &[(usize, usize)],
    theme: &Theme,
    is_selected: bool,
) {
    if ranges.is_empty() || is_selected {
        out.push_str(text);
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start < current_pos || start >= end {
            continue;
        }

        out.extend(&chars[current_pos..start]);
        out.push_str(&Theme::fg(&theme.colors.match_highlight_fg));
        out.push_str(&Theme::bg(&theme.colors.match_highlight_bg));
        out.extend(&chars[start..end]);
        out.push_str(Theme::reset());
        out.push_str(&Theme::fg(&theme.colors.text_normal));

        current_pos = end;
    }

    out.extend(&chars[current_pos..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_matches_are_coalesced() {
        assert_eq!(highlight_ranges("Manager", "man"), vec![(0, 3)]);
        assert!(highlight_ranges("Manager", "").is_empty());
        assert!(highlight_ranges("Manager", "xyz").is_empty());
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("Zürich Office", 9), "Zürich...");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn selected_text_is_not_highlighted() {
        let theme = Theme::default();
        let mut out = String::new();
        render_highlighted_text(&mut out, "Clerk", &[(0, 2)], &theme, true);
        assert_eq!(out, "Clerk");

        let mut highlighted = String::new();
        render_highlighted_text(&mut highlighted, "Clerk", &[(0, 2)], &theme, false);
        assert!(highlighted.contains("\u{1b}["));
        assert!(highlighted.ends_with("erk"));
    }
}
