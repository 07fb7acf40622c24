//! The session aggregate and its vocabulary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Durations;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Idle,
    Focusing,
    Paused,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Focusing => "FOCUSING",
            Phase::Paused => "PAUSED",
            Phase::Break => "BREAK",
        }
    }

    /// Phases whose elapsed counter advances on tick.
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Focusing | Phase::Break)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakKind {
    Short,
    Long,
}

impl BreakKind {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "short" => Some(BreakKind::Short),
            "long" => Some(BreakKind::Long),
            _ => None,
        }
    }
}

/// Read-only copy of the task a focus phase runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_duration_minutes: Option<u32>,
}

impl TaskRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            focus_duration_minutes: None,
        }
    }

    pub fn with_focus_minutes(mut self, minutes: u32) -> Self {
        self.focus_duration_minutes = Some(minutes);
        self
    }
}

/// The single mutable aggregate of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub phase: Phase,
    #[serde(default)]
    pub break_kind: Option<BreakKind>,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub active_task: Option<TaskRef>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_count: u32,
}

impl Session {
    /// An idle session that keeps the lifetime completion counter.
    pub fn idle(session_count: u32) -> Self {
        Self {
            session_count,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Target length of the current phase in seconds.
    ///
    /// A paused focus phase reports the focus target; IDLE has none.
    pub fn target_seconds(&self, durations: &Durations) -> Option<u64> {
        match (self.phase, self.break_kind) {
            (Phase::Idle, _) => None,
            (Phase::Break, Some(kind)) | (Phase::Paused, Some(kind)) => {
                Some(durations.break_target_secs(kind))
            }
            (Phase::Break, None) => None,
            (Phase::Focusing, _) | (Phase::Paused, None) => Some(durations.focus_target_secs(
                self.active_task
                    .as_ref()
                    .and_then(|task| task.focus_duration_minutes),
            )),
        }
    }

    pub fn remaining_seconds(&self, durations: &Durations) -> Option<u64> {
        self.target_seconds(durations)
            .map(|target| target.saturating_sub(self.elapsed_seconds))
    }

    /// Wall-clock time since the phase began, independent of tick drift.
    pub fn wall_clock_elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.started_at
            .map(|started_at| now.signed_duration_since(started_at).max(Duration::zero()))
    }

    /// Checks the phase/task/break invariants.
    ///
    /// Break phases may keep the task reference for display continuity.
    pub fn is_consistent(&self) -> bool {
        match self.phase {
            Phase::Idle => {
                self.active_task.is_none() && self.break_kind.is_none() && self.elapsed_seconds == 0
            }
            Phase::Focusing => self.active_task.is_some() && self.break_kind.is_none(),
            Phase::Paused => self.active_task.is_some() || self.break_kind.is_some(),
            Phase::Break => self.break_kind.is_some(),
        }
    }
}
