//! Theme management and ANSI escape sequence generation.
//!
//! Built-in themes ship as TOML under `themes/` and are compiled in; custom
//! themes are read from a TOML file with the same layout.
//!
//! # Built-in Themes
//!
//! - `catppuccin-mocha`: Dark theme (default)
//! - `catppuccin-latte`: Light theme
//!
//! # TOML Format
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! header_fg = "#cdd6f4"
//! selection_fg = "#1e1e2e"
//! selection_bg = "#f5c2e7"
//! text_normal = "#cdd6f4"
//! text_dim = "#6c7086"
//! border = "#45475a"
//! search_bar_border = "#f5c2e7"
//! match_highlight_fg = "#1e1e2e"
//! match_highlight_bg = "#f9e2af"
//! empty_state_fg = "#89b4fa"
//! chip_fg = "#94e2d5"
//! success_fg = "#a6e3a1"
//! error_fg = "#f38ba8"
//! ```
//!
//! # Example
//!
//! ```
//! use erp_listing::ui::Theme;
//!
//! let theme = Theme::from_name("catppuccin-latte").unwrap();
//! assert_eq!(Theme::fg("#ff0000"), "\u{1b}[38;2;255;0;0m");
//! assert_eq!(theme.name, "catppuccin-latte");
//! ```

use crate::domain::{ListingError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the theme used when none is configured.
pub const DEFAULT_THEME: &str = "catppuccin-mocha";

/// Color scheme for table rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

/// Hex colors (`#rrggbb`) for every UI element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeColors {
    pub header_fg: String,
    #[serde(default)]
    pub header_bg: Option<String>,

    pub selection_fg: String,
    pub selection_bg: String,

    pub text_normal: String,
    /// Footer and secondary text.
    pub text_dim: String,

    pub border: String,

    pub search_bar_border: String,
    pub match_highlight_fg: String,
    pub match_highlight_bg: String,

    pub empty_state_fg: String,

    /// Active filter chips.
    pub chip_fg: String,

    /// Mutation succeeded.
    pub success_fg: String,
    /// Load errors and failed mutations.
    pub error_fg: String,
}

impl Theme {
    /// Loads a built-in theme by name, `None` when unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "catppuccin-mocha" => include_str!("../../themes/catppuccin-mocha.toml"),
            "catppuccin-latte" => include_str!("../../themes/catppuccin-latte.toml"),
            _ => return None,
        };

        toml::from_str(toml_str).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Theme`] if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ListingError::Theme(format!("failed to read {}: {e}", path.display()))
        })?;

        toml::from_str(&contents)
            .map_err(|e| ListingError::Theme(format!("failed to parse {}: {e}", path.display())))
    }

    /// Resolves a theme from an optional file and an optional built-in name.
    ///
    /// The file wins over the name; no setting at all gives the default theme.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Theme`] for an unreadable file or an unknown name.
    pub fn resolve(name: Option<&str>, file: Option<&Path>) -> Result<Self> {
        if let Some(file) = file {
            return Self::from_file(file);
        }
        match name {
            Some(name) => Self::from_name(name)
                .ok_or_else(|| ListingError::Theme(format!("unknown theme '{name}'"))),
            None => Ok(Self::default()),
        }
    }

    /// Greyscale palette used if the built-in default cannot be parsed.
    fn plain() -> Self {
        let grey = |hex: &str| hex.to_string();
        Self {
            name: "plain".to_string(),
            colors: ThemeColors {
                header_fg: grey("#ffffff"),
                header_bg: None,
                selection_fg: grey("#000000"),
                selection_bg: grey("#c0c0c0"),
                text_normal: grey("#e0e0e0"),
                text_dim: grey("#808080"),
                border: grey("#606060"),
                search_bar_border: grey("#c0c0c0"),
                match_highlight_fg: grey("#000000"),
                match_highlight_bg: grey("#ffffff"),
                empty_state_fg: grey("#c0c0c0"),
                chip_fg: grey("#c0c0c0"),
                success_fg: grey("#ffffff"),
                error_fg: grey("#ffffff"),
            },
        }
    }

    /// Parses `#rrggbb`; malformed colors render as white.
    fn rgb(hex: &str) -> (u8, u8, u8) {
        let digits = hex.trim().trim_start_matches('#');
        let value = (digits.len() == 6)
            .then(|| u32::from_str_radix(digits, 16).ok())
            .flatten()
            .unwrap_or(0x00ff_ffff);
        let [_, r, g, b] = value.to_be_bytes();
        (r, g, b)
    }

    fn color_sequence(layer: u8, hex: &str) -> String {
        let (r, g, b) = Self::rgb(hex);
        format!("\u{1b}[{layer};2;{r};{g};{b}m")
    }

    /// 24-bit foreground color sequence.
    #[must_use]
    pub fn fg(hex: &str) -> String {
        Self::color_sequence(38, hex)
    }

    /// 24-bit background color sequence.
    #[must_use]
    pub fn bg(hex: &str) -> String {
        Self::color_sequence(48, hex)
    }

    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{1b}[1m"
    }

    #[must_use]
    pub const fn dim() -> &'static str {
        "\u{1b}[2m"
    }

    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{1b}[0m"
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_name(DEFAULT_THEME).unwrap_or_else(|| {
            tracing::warn!(theme = DEFAULT_THEME, "built-in theme failed to parse, using plain colors");
            Self::plain()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_themes_parse() {
        assert_eq!(Theme::default().name, DEFAULT_THEME);
        assert!(Theme::from_name("catppuccin-latte").is_some());
        assert!(Theme::from_name("solarized").is_none());
    }

    #[test]
    fn malformed_hex_falls_back_to_white() {
        assert_eq!(Theme::fg("#12"), "\u{1b}[38;2;255;255;255m");
        assert_eq!(Theme::bg("1e1e2e"), "\u{1b}[48;2;30;30;46m");
    }

    #[test]
    fn resolve_prefers_file_and_rejects_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut custom = Theme::default();
        custom.name = "custom".to_string();
        fs::write(&path, toml::to_string(&custom).unwrap()).unwrap();

        let resolved = Theme::resolve(Some("catppuccin-latte"), Some(&path)).unwrap();
        assert_eq!(resolved.name, "custom");

        let err = Theme::resolve(Some("solarized"), None).unwrap_err();
        assert!(matches!(err, ListingError::Theme(_)));

        fs::write(&path, "name = 1").unwrap();
        assert!(matches!(Theme::from_file(&path), Err(ListingError::Theme(_))));
    }
}
