//! Filesystem locations for local state.
//!
//! The filter snapshot and trace files live under the user's data directory,
//! following the XDG base directory layout.

use std::path::PathBuf;

const APP_DIR: &str = "erp-listing";

/// Returns the data directory for erp-listing state.
///
/// Resolves to `$XDG_DATA_HOME/erp-listing`, falling back to
/// `$HOME/.local/share/erp-listing`, and finally to a relative
/// `.erp-listing` directory when neither variable is set.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    data_dir_from(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn data_dir_from(xdg_data_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(xdg) = xdg_data_home.filter(|p| p.is_absolute()) {
        return xdg.join(APP_DIR);
    }
    match home {
        Some(home) => home.join(".local").join("share").join(APP_DIR),
        None => PathBuf::from(format!(".{APP_DIR}")),
    }
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading tilde, and every path when `HOME` is unset, are
/// returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with(path, std::env::var_os("HOME").map(PathBuf::from))
}

fn expand_tilde_with(path: &str, home: Option<PathBuf>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };
    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_data_home_wins_over_home() {
        let dir = data_dir_from(Some("/xdg".into()), Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/xdg/erp-listing"));
    }

    #[test]
    fn relative_xdg_is_ignored() {
        let dir = data_dir_from(Some("relative".into()), Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/home/ana/.local/share/erp-listing"));
    }

    #[test]
    fn tilde_expansion() {
        let home = Some(PathBuf::from("/home/ana"));
        assert_eq!(expand_tilde_with("~", home.clone()), PathBuf::from("/home/ana"));
        assert_eq!(
            expand_tilde_with("~/state/filters.json", home.clone()),
            PathBuf::from("/home/ana/state/filters.json")
        );
        assert_eq!(expand_tilde_with("/etc/erp.toml", home), PathBuf::from("/etc/erp.toml"));
        assert_eq!(expand_tilde_with("~/x", None), PathBuf::from("~/x"));
    }
}
