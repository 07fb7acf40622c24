//! Wire types shared by the focus timer engine and the session backend.
//!
//! The backend owns session rows; the engine only reads a remote snapshot of the
//! active session and publishes completion records. Keeping both shapes here lets
//! hosts build valid payloads without depending on the engine itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_TASK_ID_LEN: usize = 128;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Status of a session row as the backend reports it.
///
/// Unrecognised strings decode to `Unknown`; the engine treats those as a
/// running focus phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteStatus {
    InProgress,
    Paused,
    Completed,
    #[serde(other)]
    Unknown,
}

/// Authoritative snapshot of the active session held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoteSessionSnapshot {
    pub task_id: String,
    pub task_title: String,
    pub start_time: DateTime<Utc>,
    pub current_duration: u64,
    pub status: RemoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_duration_minutes: Option<u32>,
}

impl RemoteSessionSnapshot {
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.task_id.trim().is_empty() {
            return Err(ErrorInfo::new("missing_field", "taskId is required"));
        }
        if self.task_id.len() > MAX_TASK_ID_LEN {
            return Err(ErrorInfo::new(
                "invalid_task_id",
                format!("taskId must be {} characters or fewer", MAX_TASK_ID_LEN),
            ));
        }
        if self.focus_duration_minutes == Some(0) {
            return Err(ErrorInfo::new(
                "invalid_duration",
                "focusDurationMinutes must be positive when present",
            ));
        }
        Ok(())
    }
}

pub fn parse_snapshot(params: Value) -> Result<RemoteSessionSnapshot, ErrorInfo> {
    let snapshot: RemoteSessionSnapshot = serde_json::from_value(params).map_err(|err| {
        ErrorInfo::new(
            "invalid_params",
            format!("session snapshot is invalid: {}", err),
        )
    })?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    Focus,
}

/// Summary of a finished or manually stopped focus phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub task_id: String,
    pub task_title: String,
    pub duration_seconds: u64,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub auto_completed: bool,
}
