//! Collaborator ports the engine reports to.
//!
//! The session backend and the platform notification surface live outside the
//! engine. Their failures are logged by the engine and never retried.

use chrono::{DateTime, Utc};
use focus_protocol::CompletionRecord;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::{BreakKind, Phase, Session};

/// Phase/status update sent to the backend after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub phase: Phase,
    pub break_kind: Option<BreakKind>,
    pub elapsed_seconds: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub focus_duration_minutes: Option<u32>,
}

impl StatusUpdate {
    pub fn from_session(session: &Session) -> Self {
        let task = session.active_task.as_ref();
        Self {
            task_id: task.map(|task| task.id.clone()),
            task_title: task.map(|task| task.title.clone()),
            phase: session.phase,
            break_kind: session.break_kind,
            elapsed_seconds: session.elapsed_seconds,
            started_at: session.started_at,
            focus_duration_minutes: task.and_then(|task| task.focus_duration_minutes),
        }
    }
}

pub trait SessionSink: Send + Sync {
    fn record_completion(&self, record: &CompletionRecord) -> Result<()>;

    fn update_status(&self, update: &StatusUpdate) -> Result<()>;
}

/// Out-of-band alert used when a completion cue cannot be played.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}
