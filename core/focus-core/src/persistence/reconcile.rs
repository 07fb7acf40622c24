//! Pure reducers that overlay stored snapshots onto the session.

use chrono::{DateTime, Utc};
use focus_protocol::{CompletionRecord, RemoteSessionSnapshot, RemoteStatus, SessionKind};
use tracing::warn;

use super::store::LocalSnapshot;
use crate::session::{Phase, Session, TaskRef};

/// Overlays the local mirror. An inconsistent mirror is ignored.
pub fn apply_local_snapshot(current: &Session, snapshot: &LocalSnapshot) -> Session {
    let candidate = snapshot.to_session();
    if candidate.phase == Phase::Idle {
        return Session::idle(candidate.session_count);
    }
    if !candidate.is_consistent() {
        warn!(phase = candidate.phase.as_str(), "Ignoring inconsistent session mirror");
        return current.clone();
    }
    candidate
}

/// Overwrites the session with the backend's view of it.
///
/// `PAUSED` maps to PAUSED; every other status maps to FOCUSING.
pub fn apply_remote_snapshot(current: &Session, snapshot: &RemoteSessionSnapshot) -> Session {
    let phase = match snapshot.status {
        RemoteStatus::Paused => Phase::Paused,
        RemoteStatus::InProgress | RemoteStatus::Completed | RemoteStatus::Unknown => {
            Phase::Focusing
        }
    };
    Session {
        phase,
        break_kind: None,
        elapsed_seconds: snapshot.current_duration,
        active_task: Some(TaskRef {
            id: snapshot.task_id.clone(),
            title: snapshot.task_title.clone(),
            focus_duration_minutes: snapshot.focus_duration_minutes,
        }),
        started_at: Some(snapshot.start_time),
        session_count: current.session_count,
    }
}

/// Forces the session idle and builds the record a remote completion implies.
pub fn apply_remote_completion(
    current: &Session,
    snapshot: &RemoteSessionSnapshot,
    now: DateTime<Utc>,
) -> (Session, CompletionRecord) {
    let record = CompletionRecord {
        task_id: snapshot.task_id.clone(),
        task_title: snapshot.task_title.clone(),
        duration_seconds: snapshot.current_duration,
        kind: SessionKind::Focus,
        started_at: snapshot.start_time,
        ended_at: now,
        auto_completed: true,
    };
    (Session::idle(current.session_count), record)
}

/// Startup restore: local mirror first, remote snapshot last.
///
/// A remote snapshot already marked `COMPLETED` leaves the session idle; the
/// caller runs the completion path separately.
pub fn restore_session(
    local: Option<&LocalSnapshot>,
    remote: Option<&RemoteSessionSnapshot>,
) -> Session {
    let mut session = Session::default();
    if let Some(local) = local {
        session = apply_local_snapshot(&session, local);
    }
    if let Some(remote) = remote {
        session = match remote.status {
            RemoteStatus::Completed => Session::idle(session.session_count),
            _ => apply_remote_snapshot(&session, remote),
        };
    }
    session
}
