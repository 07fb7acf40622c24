//! Local mirror of the resumable session fields.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "key": "focus-timer-state",
//!   "session": { "phase": "FOCUSING", "elapsedSeconds": 42, ... }
//! }
//! ```
//!
//! Only the resumable fields are written. Process-lifetime flags (completion in
//! progress, audio playing) never reach the file.
//!
//! # Defensive Reads
//!
//! Empty files, corrupt JSON, a foreign key and version mismatches all load as
//! "no snapshot" with a warning, never as an error that blocks startup.
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a crash mid-write leaves the previous mirror intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{FocusError, Result};
use crate::session::{BreakKind, Phase, Session, TaskRef};
use crate::storage::STORAGE_KEY;

const MIRROR_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    pub phase: Phase,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub active_task: Option<TaskRef>,
    #[serde(default)]
    pub session_count: u32,
    #[serde(default)]
    pub break_kind: Option<BreakKind>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl LocalSnapshot {
    pub fn from_session(session: &Session) -> Self {
        Self {
            phase: session.phase,
            elapsed_seconds: session.elapsed_seconds,
            active_task: session.active_task.clone(),
            session_count: session.session_count,
            break_kind: session.break_kind,
            started_at: session.started_at,
        }
    }

    pub fn to_session(&self) -> Session {
        Session {
            phase: self.phase,
            break_kind: self.break_kind,
            elapsed_seconds: self.elapsed_seconds,
            active_task: self.active_task.clone(),
            started_at: self.started_at,
            session_count: self.session_count,
        }
    }
}

pub trait LocalStore: Send + Sync {
    fn load(&self) -> Result<Option<LocalSnapshot>>;

    fn save(&self, snapshot: &LocalSnapshot) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct MirrorFile {
    version: u32,
    key: String,
    session: LocalSnapshot,
}

/// File-backed mirror, keyed by [`STORAGE_KEY`].
#[derive(Debug, Clone)]
pub struct FileStore {
    file_path: PathBuf,
}

impl FileStore {
    pub fn new(file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> Result<Option<LocalSnapshot>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content = fs_err::read_to_string(&self.file_path)
            .map_err(|err| FocusError::io("read session mirror", err))?;

        if content.trim().is_empty() {
            warn!(path = %self.file_path.display(), "Empty session mirror, ignoring");
            return Ok(None);
        }

        match serde_json::from_str::<MirrorFile>(&content) {
            Ok(file) if file.version == MIRROR_VERSION && file.key == STORAGE_KEY => {
                Ok(Some(file.session))
            }
            Ok(file) => {
                warn!(
                    version = file.version,
                    key = %file.key,
                    "Unsupported session mirror, ignoring"
                );
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, "Failed to parse session mirror, ignoring");
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &LocalSnapshot) -> Result<()> {
        let file = MirrorFile {
            version: MIRROR_VERSION,
            key: STORAGE_KEY.to_string(),
            session: snapshot.clone(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|err| FocusError::json("serialize session mirror", err))?;

        let parent_dir = self
            .file_path
            .parent()
            .ok_or_else(|| FocusError::io("session mirror path", std::io::ErrorKind::NotFound.into()))?;
        fs_err::create_dir_all(parent_dir)
            .map_err(|err| FocusError::io("create session mirror dir", err))?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|err| FocusError::io("create temp session mirror", err))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|err| FocusError::io("write temp session mirror", err))?;
        temp_file
            .flush()
            .map_err(|err| FocusError::io("flush temp session mirror", err))?;
        temp_file
            .persist(&self.file_path)
            .map_err(|err| FocusError::io("commit session mirror", err.error))?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs_err::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(FocusError::io("remove session mirror", err)),
        }
    }
}
