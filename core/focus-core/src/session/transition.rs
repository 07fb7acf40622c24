//! Pure transition function for the session aggregate.
//! Returns the next session plus the side effects the engine should dispatch.
//! Commands that are not defined for the current phase leave it unchanged.

use chrono::{DateTime, Utc};
use focus_protocol::{CompletionRecord, SessionKind};

use super::types::{BreakKind, Phase, Session, TaskRef};
use crate::config::Durations;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartFocus(TaskRef),
    StartBreak(BreakKind),
    Pause,
    Resume,
    Stop,
    Reset,
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StopAudio,
    PlayStartCue,
    StartFocusLoop,
    PumpLoop,
    Completed(CompletionRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(session: &Session) -> Self {
        Self {
            session: session.clone(),
            effects: Vec::new(),
        }
    }

    fn to(session: Session, effects: Vec<Effect>) -> Self {
        Self { session, effects }
    }
}

pub fn next_session(
    current: &Session,
    command: Command,
    durations: &Durations,
    now: DateTime<Utc>,
) -> Transition {
    match command {
        Command::StartFocus(task) if task.id.trim().is_empty() => Transition::unchanged(current),
        Command::StartFocus(task) => Transition::to(
            Session {
                phase: Phase::Focusing,
                break_kind: None,
                elapsed_seconds: 0,
                active_task: Some(task),
                started_at: Some(now),
                session_count: current.session_count,
            },
            vec![Effect::StopAudio, Effect::PlayStartCue, Effect::StartFocusLoop],
        ),
        Command::StartBreak(kind) => Transition::to(
            Session {
                phase: Phase::Break,
                break_kind: Some(kind),
                elapsed_seconds: 0,
                active_task: current.active_task.clone(),
                started_at: Some(now),
                session_count: current.session_count,
            },
            vec![Effect::StopAudio],
        ),
        Command::Pause if current.phase == Phase::Focusing => Transition::to(
            Session {
                phase: Phase::Paused,
                ..current.clone()
            },
            vec![Effect::StopAudio],
        ),
        Command::Pause => Transition::unchanged(current),
        Command::Resume if current.phase == Phase::Paused => {
            if current.break_kind.is_some() {
                Transition::to(
                    Session {
                        phase: Phase::Break,
                        ..current.clone()
                    },
                    Vec::new(),
                )
            } else {
                Transition::to(
                    Session {
                        phase: Phase::Focusing,
                        ..current.clone()
                    },
                    vec![Effect::StartFocusLoop],
                )
            }
        }
        Command::Resume => Transition::unchanged(current),
        Command::Stop => {
            let mut effects = vec![Effect::StopAudio];
            if let Some(record) = manual_completion(current, now) {
                effects.push(Effect::Completed(record));
            }
            Transition::to(Session::idle(current.session_count), effects)
        }
        Command::Reset => Transition::to(Session::idle(0), vec![Effect::StopAudio]),
        Command::Tick => tick(current, durations, now),
    }
}

fn tick(current: &Session, durations: &Durations, now: DateTime<Utc>) -> Transition {
    if !current.phase.is_running() {
        return Transition::unchanged(current);
    }

    let mut next = current.clone();
    next.elapsed_seconds = current.elapsed_seconds.saturating_add(1);

    let Some(target) = next.target_seconds(durations) else {
        return Transition::to(next, Vec::new());
    };

    // >= so an exact match completes on this tick, not the next.
    if next.elapsed_seconds < target {
        let effects = if next.phase == Phase::Focusing {
            vec![Effect::PumpLoop]
        } else {
            Vec::new()
        };
        return Transition::to(next, effects);
    }

    match next.phase {
        Phase::Focusing => {
            let mut effects = vec![Effect::StopAudio];
            if let Some(task) = next.active_task.as_ref() {
                effects.push(Effect::Completed(CompletionRecord {
                    task_id: task.id.clone(),
                    task_title: task.title.clone(),
                    duration_seconds: next.elapsed_seconds,
                    kind: SessionKind::Focus,
                    started_at: next.started_at.unwrap_or(now),
                    ended_at: now,
                    auto_completed: true,
                }));
            }
            // session_count is bumped by the engine once the guard grants the record.
            Transition::to(Session::idle(next.session_count), effects)
        }
        _ => Transition::to(Session::idle(next.session_count), vec![Effect::StopAudio]),
    }
}

/// A stopped focus phase (running or paused) with time on it is journaled.
fn manual_completion(current: &Session, now: DateTime<Utc>) -> Option<CompletionRecord> {
    let is_focus_phase = match current.phase {
        Phase::Focusing => true,
        Phase::Paused => current.break_kind.is_none(),
        Phase::Idle | Phase::Break => false,
    };
    if !is_focus_phase || current.elapsed_seconds == 0 {
        return None;
    }

    let task = current.active_task.as_ref()?;
    Some(CompletionRecord {
        task_id: task.id.clone(),
        task_title: task.title.clone(),
        duration_seconds: current.elapsed_seconds,
        kind: SessionKind::Focus,
        started_at: current.started_at.unwrap_or(now),
        ended_at: now,
        auto_completed: false,
    })
}
