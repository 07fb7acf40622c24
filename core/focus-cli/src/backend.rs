//! File-backed stand-in for the session backend.
//!
//! The active session row lives in `remote-session.json` while a focus phase is
//! running or paused, and completion records are appended to
//! `completions.jsonl`. Both are read back by later invocations.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use focus_core::{
    CompletionRecord, FocusError, Phase, RemoteSessionSnapshot, RemoteStatus, SessionSink,
    StatusUpdate,
};
use focus_protocol::parse_snapshot;
use fs_err as fs;
use fs_err::OpenOptions;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{CliError, Result};

pub struct FileBackend {
    session_file: PathBuf,
    completions_file: PathBuf,
}

impl FileBackend {
    pub fn new(session_file: PathBuf, completions_file: PathBuf) -> Self {
        Self {
            session_file,
            completions_file,
        }
    }

    /// Reads the stored session row. Missing or invalid rows load as `None`.
    pub fn load_snapshot(&self) -> Option<RemoteSessionSnapshot> {
        match read_snapshot(&self.session_file) {
            Ok(snapshot) => Some(snapshot),
            Err(CliError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                None
            }
            Err(err) => {
                warn!(path = %self.session_file.display(), error = %err, "Ignoring unreadable session row");
                None
            }
        }
    }

    pub fn completions(&self) -> Result<Vec<CompletionRecord>> {
        let content = match fs::read_to_string(&self.completions_file) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CliError::io("reading completions", err)),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|err| CliError::json("parsing completion", err))
            })
            .collect()
    }

    fn write_snapshot(&self, snapshot: &RemoteSessionSnapshot) -> Result<()> {
        let dir = self.session_file.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|err| CliError::io("creating data directory", err))?;
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|err| CliError::json("serializing session row", err))?;

        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|err| CliError::io("creating temp session row", err))?;
        temp.write_all(content.as_bytes())
            .map_err(|err| CliError::io("writing session row", err))?;
        temp.persist(&self.session_file)
            .map_err(|err| CliError::io("persisting session row", err.error))?;
        Ok(())
    }

    fn remove_snapshot(&self) -> Result<()> {
        match fs::remove_file(&self.session_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CliError::io("removing session row", err)),
        }
    }

    fn append_completion(&self, record: &CompletionRecord) -> Result<()> {
        if let Some(dir) = self.completions_file.parent() {
            fs::create_dir_all(dir).map_err(|err| CliError::io("creating data directory", err))?;
        }
        let line = serde_json::to_string(record)
            .map_err(|err| CliError::json("serializing completion", err))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.completions_file)
            .map_err(|err| CliError::io("opening completions", err))?;
        writeln!(file, "{}", line).map_err(|err| CliError::io("appending completion", err))
    }
}

/// Reads and validates a session row from `path`.
pub fn read_snapshot(path: &Path) -> Result<RemoteSessionSnapshot> {
    let content =
        fs::read_to_string(path).map_err(|err| CliError::io("reading session row", err))?;
    let value: Value =
        serde_json::from_str(&content).map_err(|err| CliError::json("parsing session row", err))?;
    parse_snapshot(value).map_err(|info| CliError::Snapshot {
        path: path.to_path_buf(),
        info,
    })
}

fn snapshot_from_status(update: &StatusUpdate) -> Option<RemoteSessionSnapshot> {
    let status = match update.phase {
        Phase::Focusing => RemoteStatus::InProgress,
        Phase::Paused if update.break_kind.is_none() => RemoteStatus::Paused,
        _ => return None,
    };
    Some(RemoteSessionSnapshot {
        task_id: update.task_id.clone()?,
        task_title: update.task_title.clone().unwrap_or_default(),
        start_time: update.started_at.unwrap_or_else(Utc::now),
        current_duration: update.elapsed_seconds,
        status,
        focus_duration_minutes: update.focus_duration_minutes,
    })
}

fn backend_error(err: CliError) -> FocusError {
    FocusError::Backend(err.to_string())
}

impl SessionSink for FileBackend {
    fn record_completion(&self, record: &CompletionRecord) -> focus_core::Result<()> {
        self.append_completion(record).map_err(backend_error)
    }

    fn update_status(&self, update: &StatusUpdate) -> focus_core::Result<()> {
        let written = match snapshot_from_status(update) {
            Some(snapshot) => self.write_snapshot(&snapshot),
            None => self.remove_snapshot(),
        };
        written.map_err(backend_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{Session, TaskRef};
    use focus_protocol::SessionKind;
    use tempfile::tempdir;

    fn backend(dir: &Path) -> FileBackend {
        FileBackend::new(
            dir.join("remote-session.json"),
            dir.join("completions.jsonl"),
        )
    }

    fn focusing(elapsed: u64) -> Session {
        Session {
            phase: Phase::Focusing,
            break_kind: None,
            elapsed_seconds: elapsed,
            active_task: Some(TaskRef::new("A", "Algebra").with_focus_minutes(1)),
            started_at: Some(Utc::now()),
            session_count: 0,
        }
    }

    #[test]
    fn focusing_status_writes_row() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        backend
            .update_status(&StatusUpdate::from_session(&focusing(12)))
            .unwrap();

        let snapshot = backend.load_snapshot().expect("row");
        assert_eq!(snapshot.task_id, "A");
        assert_eq!(snapshot.current_duration, 12);
        assert_eq!(snapshot.status, RemoteStatus::InProgress);
        assert_eq!(snapshot.focus_duration_minutes, Some(1));
    }

    #[test]
    fn idle_status_removes_row() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        backend
            .update_status(&StatusUpdate::from_session(&focusing(1)))
            .unwrap();
        backend
            .update_status(&StatusUpdate::from_session(&Session::idle(1)))
            .unwrap();
        assert!(backend.load_snapshot().is_none());
        backend
            .update_status(&StatusUpdate::from_session(&Session::idle(1)))
            .unwrap();
    }

    #[test]
    fn invalid_row_loads_as_none() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        fs::write(dir.path().join("remote-session.json"), "{\"taskId\": \"\"}").unwrap();
        assert!(backend.load_snapshot().is_none());
    }

    #[test]
    fn completions_append_in_order() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());
        let now = Utc::now();
        for (id, auto) in [("A", true), ("B", false)] {
            backend
                .record_completion(&CompletionRecord {
                    task_id: id.to_string(),
                    task_title: id.to_string(),
                    duration_seconds: 60,
                    kind: SessionKind::Focus,
                    started_at: now,
                    ended_at: now,
                    auto_completed: auto,
                })
                .unwrap();
        }
        let records = backend.completions().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].task_id, "A");
        assert!(!records[1].auto_completed);
    }

    #[test]
    fn read_snapshot_reports_validation_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(
            &path,
            r#"{"taskId":"A","taskTitle":"x","startTime":"2026-01-30T12:00:00Z","currentDuration":1,"status":"COMPLETED","focusDurationMinutes":0}"#,
        )
        .unwrap();
        match read_snapshot(&path) {
            Err(CliError::Snapshot { info, .. }) => assert_eq!(info.code, "invalid_duration"),
            other => panic!("unexpected: {:?}", other.map(|s| s.task_id)),
        }
    }
}
