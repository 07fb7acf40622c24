//! Storage configuration and path management.
//!
//! All file paths the engine and its hosts touch are decided here. Production
//! code uses [`StorageConfig::from_env`], which resolves `$FOCUS_HOME` or
//! `~/.focus/`. Tests use [`StorageConfig::with_root`] with a temp directory.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{FocusError, Result};

/// Fixed key for the local session mirror; the mirror file is named after it.
pub const STORAGE_KEY: &str = "focus-timer-state";

const HOME_ENV: &str = "FOCUS_HOME";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the data root from `$FOCUS_HOME`, falling back to `~/.focus`.
    pub fn from_env() -> Result<Self> {
        if let Some(root) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }
        let home = dirs::home_dir().ok_or(FocusError::HomeDirNotFound)?;
        Ok(Self::with_root(home.join(".focus")))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Local mirror of the resumable session fields.
    pub fn session_mirror_file(&self) -> PathBuf {
        self.root.join(format!("{}.json", STORAGE_KEY))
    }

    /// Snapshot written by the file-backed session backend.
    pub fn remote_session_file(&self) -> PathBuf {
        self.root.join("remote-session.json")
    }

    /// Append-only log of completion records.
    pub fn completions_file(&self) -> PathBuf {
        self.root.join("completions.jsonl")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Creates the root directory if missing.
    pub fn ensure_root(&self) -> Result<()> {
        fs_err::create_dir_all(&self.root)
            .map_err(|err| FocusError::io(format!("create {}", self.root.display()), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/focus-test"));
        assert_eq!(
            storage.session_mirror_file(),
            PathBuf::from("/tmp/focus-test/focus-timer-state.json")
        );
        assert_eq!(
            storage.config_file(),
            PathBuf::from("/tmp/focus-test/config.toml")
        );
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/focus-test/logs"));
    }

    #[test]
    fn ensure_root_creates_directory() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let storage = StorageConfig::with_root(temp_dir.path().join("nested").join("focus"));
        storage.ensure_root().expect("create root");
        assert!(storage.root().is_dir());
    }
}
