//! Platform path helpers.
//!
//! Resolves the configuration directory through `dirs` and expands
//! `~` in user-supplied paths.

use std::path::{Path, PathBuf};

/// Application directory name under the platform config root.
pub const APP_DIR: &str = "unsplash-grid";

/// Returns the configuration directory, e.g. `~/.config/unsplash-grid` on Linux.
///
/// `None` if the platform has no notion of a config directory.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// Returns the default configuration file path.
///
/// # Examples
///
/// ```
/// use unsplash_grid::infrastructure::default_config_path;
///
/// if let Some(path) = default_config_path() {
///     assert!(path.ends_with("unsplash-grid/config.toml"));
/// }
/// ```
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or when no home directory is known, are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use unsplash_grid::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/var/log/grid.log"), PathBuf::from("/var/log/grid.log"));
/// assert_eq!(expand_tilde("logs/grid.log"), PathBuf::from("logs/grid.log"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Creates `path`'s parent directory if it is missing.
///
/// # Errors
///
/// Propagates the underlying I/O error.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_uses_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/logs/a.log"), home.join("logs/a.log"));
        }
        assert_eq!(expand_tilde("~other/a.log"), PathBuf::from("~other/a.log"));
    }

    #[test]
    fn test_ensure_parent_creates_directories() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("nested/deeper/grid.log");

        ensure_parent(&file).unwrap();
        assert!(file.parent().unwrap().is_dir());
        ensure_parent(Path::new("bare.log")).unwrap();
    }
}
