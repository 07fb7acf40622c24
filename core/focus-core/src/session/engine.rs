//! FocusEngine - the stateful shell around the pure transition function.
//!
//! Every command follows the same order:
//!
//! 1. Compute the next session with [`next_session`] (pure, total).
//! 2. Commit it, mirror it to the local store and report it to the backend.
//! 3. Dispatch the returned side effects: audio, completion records, notifications.
//!
//! State always commits before any side effect runs, so a slow preference fetch
//! or a broken audio device can never hold the timer back. Side-effect failures
//! are logged and swallowed.
//!
//! The engine is single-threaded by contract: the host serializes commands and
//! owns the one-second driver that calls [`FocusEngine::tick`].

use std::sync::Arc;

use chrono::Duration;
use focus_protocol::{CompletionRecord, RemoteSessionSnapshot, RemoteStatus};
use tracing::{debug, info, warn};

use super::transition::{next_session, Command, Effect, Transition};
use super::types::{BreakKind, Phase, Session, TaskRef};
use crate::audio::{AudioOutput, PlayOutcome};
use crate::clock::Clock;
use crate::config::{Durations, EngineConfig};
use crate::error::{FocusError, Result};
use crate::guard::CompletionGuard;
use crate::persistence::{
    apply_remote_completion, apply_remote_snapshot, restore_session, LocalSnapshot, LocalStore,
};
use crate::ports::{Notifier, SessionSink, StatusUpdate};
use crate::preferences::{current_preferences, freshest_preferences, PreferenceProvider};

pub struct FocusEngine {
    session: Session,
    durations: Durations,
    clock: Arc<dyn Clock>,
    audio: AudioOutput,
    preferences: Arc<dyn PreferenceProvider>,
    guard: Arc<CompletionGuard>,
    store: Option<Arc<dyn LocalStore>>,
    sink: Option<Arc<dyn SessionSink>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl FocusEngine {
    /// Creates an idle engine. The completion guard shares the engine's clock.
    pub fn new(
        config: &EngineConfig,
        audio: AudioOutput,
        preferences: Arc<dyn PreferenceProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let guard = Arc::new(CompletionGuard::new(config.guard.window(), clock.clone()));
        Self {
            session: Session::default(),
            durations: config.durations,
            clock,
            audio,
            preferences,
            guard,
            store: None,
            sink: None,
            notifier: None,
        }
    }

    /// Replaces the default guard, e.g. to share one across engines.
    pub fn with_guard(mut self, guard: Arc<CompletionGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn LocalStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn SessionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    pub fn guard(&self) -> &Arc<CompletionGuard> {
        &self.guard
    }

    pub fn target_seconds(&self) -> Option<u64> {
        self.session.target_seconds(&self.durations)
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.session.remaining_seconds(&self.durations)
    }

    pub fn wall_clock_elapsed(&self) -> Option<Duration> {
        self.session.wall_clock_elapsed(self.clock.now())
    }

    pub fn active_loop_sound(&self) -> Option<&'static str> {
        self.audio.active_loop_sound()
    }

    /// Unlocks audio output; the host calls this on its first user interaction.
    pub fn unlock_audio(&mut self) -> bool {
        self.audio.unlock()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn start_focus_session(&mut self, task: TaskRef) -> Result<()> {
        if task.id.trim().is_empty() {
            return Err(FocusError::InvalidTask("task id is required".to_string()));
        }
        if task.focus_duration_minutes == Some(0) {
            return Err(FocusError::InvalidTask(
                "focus duration must be positive when present".to_string(),
            ));
        }
        info!(task_id = %task.id, "Focus session started");
        self.apply(Command::StartFocus(task));
        Ok(())
    }

    pub fn start_break(&mut self, kind: BreakKind) {
        debug!(kind = ?kind, "Break started");
        self.apply(Command::StartBreak(kind));
    }

    pub fn pause_timer(&mut self) {
        self.apply(Command::Pause);
    }

    pub fn resume_timer(&mut self) {
        self.apply(Command::Resume);
    }

    /// Ends the session. A focus phase with time on it yields a manual record.
    pub fn stop_timer(&mut self) -> Option<CompletionRecord> {
        self.apply(Command::Stop)
    }

    /// Hard abort: IDLE without a record, the completion counter cleared and
    /// the local mirror removed.
    pub fn reset_timer(&mut self) {
        self.apply(Command::Reset);
        if let Some(store) = self.store.as_ref() {
            if let Err(err) = store.clear() {
                warn!(error = %err, "Failed to clear session mirror");
            }
        }
    }

    /// Advances the running phase by one second.
    ///
    /// No-op while PAUSED or IDLE. Returns the record when this tick completed a
    /// focus phase and the completion guard granted it.
    pub fn tick(&mut self) -> Option<CompletionRecord> {
        self.apply(Command::Tick)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Resume / reconciliation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Startup restore from the local mirror and, when available, the backend.
    ///
    /// The remote snapshot is authoritative. A remote snapshot already marked
    /// `COMPLETED` runs the guarded completion path.
    pub fn restore(
        &mut self,
        remote: Option<&RemoteSessionSnapshot>,
    ) -> Result<Option<CompletionRecord>> {
        if let Some(snapshot) = remote {
            snapshot.validate()?;
        }

        let local = self.store.as_ref().and_then(|store| match store.load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "Failed to load session mirror");
                None
            }
        });

        if let Some(snapshot) = remote.filter(|s| s.status == RemoteStatus::Completed) {
            self.session = restore_session(local.as_ref(), None);
            return self.complete_timer_from_database(snapshot);
        }

        self.session = restore_session(local.as_ref(), remote);
        debug!(phase = self.session.phase.as_str(), "Session restored");
        self.audio.stop_all();
        if self.session.phase == Phase::Focusing {
            let preferences = if remote.is_some() {
                freshest_preferences(self.preferences.as_ref())
            } else {
                current_preferences(self.preferences.as_ref())
            };
            self.audio
                .play_loop(&preferences.background_cue, preferences.gain());
        }
        self.commit();
        Ok(None)
    }

    /// Overwrites the session with the backend's snapshot.
    pub fn resume_from_database(&mut self, snapshot: &RemoteSessionSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.session = apply_remote_snapshot(&self.session, snapshot);
        info!(
            task_id = %snapshot.task_id,
            phase = self.session.phase.as_str(),
            elapsed = self.session.elapsed_seconds,
            "Session resumed from backend"
        );
        self.commit();

        self.audio.stop_all();
        if self.session.phase == Phase::Focusing {
            let preferences = freshest_preferences(self.preferences.as_ref());
            self.audio
                .play_loop(&preferences.background_cue, preferences.gain());
        }
        Ok(())
    }

    /// Forces IDLE because the backend already marked the session complete.
    ///
    /// Side effects run only if the completion guard grants them, so a tick that
    /// already completed the same task locally suppresses this one.
    pub fn complete_timer_from_database(
        &mut self,
        snapshot: &RemoteSessionSnapshot,
    ) -> Result<Option<CompletionRecord>> {
        snapshot.validate()?;
        let (session, record) =
            apply_remote_completion(&self.session, snapshot, self.clock.now());
        self.session = session;
        self.audio.stop_all();

        let granted = self.guard.try_acquire(&record.task_id);
        if granted {
            self.session.session_count = self.session.session_count.saturating_add(1);
        }
        self.commit();

        if !granted {
            debug!(task_id = %record.task_id, "Remote completion suppressed by guard");
            return Ok(None);
        }
        Ok(self.publish_auto_completion(record))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────────

    fn apply(&mut self, command: Command) -> Option<CompletionRecord> {
        let now = self.clock.now();
        let Transition { session, effects } =
            next_session(&self.session, command, &self.durations, now);

        if session != self.session {
            if session.phase != self.session.phase {
                debug!(
                    from = self.session.phase.as_str(),
                    to = session.phase.as_str(),
                    "Phase transition"
                );
            }
            self.session = session;
            self.commit();
        }

        self.dispatch(effects)
    }

    /// Mirrors the session locally and reports it to the backend.
    fn commit(&self) {
        if let Some(store) = self.store.as_ref() {
            if let Err(err) = store.save(&LocalSnapshot::from_session(&self.session)) {
                warn!(error = %err, "Failed to mirror session state");
            }
        }
        if let Some(sink) = self.sink.as_ref() {
            if let Err(err) = sink.update_status(&StatusUpdate::from_session(&self.session)) {
                warn!(error = %err, "Failed to report session status");
            }
        }
    }

    fn dispatch(&mut self, effects: Vec<Effect>) -> Option<CompletionRecord> {
        let mut completed = None;
        for effect in effects {
            match effect {
                Effect::StopAudio => self.audio.stop_all(),
                Effect::PlayStartCue => {
                    let preferences = current_preferences(self.preferences.as_ref());
                    self.audio
                        .play_once(&preferences.focus_cue, preferences.gain());
                }
                Effect::StartFocusLoop => {
                    let preferences = current_preferences(self.preferences.as_ref());
                    self.audio
                        .play_loop(&preferences.background_cue, preferences.gain());
                }
                Effect::PumpLoop => self.audio.pump(),
                Effect::Completed(record) if record.auto_completed => {
                    if self.guard.try_acquire(&record.task_id) {
                        self.session.session_count = self.session.session_count.saturating_add(1);
                        self.commit();
                        completed = self.publish_auto_completion(record);
                    } else {
                        debug!(task_id = %record.task_id, "Local completion suppressed by guard");
                    }
                }
                Effect::Completed(record) => {
                    info!(
                        task_id = %record.task_id,
                        duration_seconds = record.duration_seconds,
                        "Focus session stopped"
                    );
                    self.deliver(&record);
                    completed = Some(record);
                }
            }
        }
        completed
    }

    /// Delivers a guard-approved completion and plays the completion cue.
    fn publish_auto_completion(&mut self, record: CompletionRecord) -> Option<CompletionRecord> {
        info!(
            task_id = %record.task_id,
            duration_seconds = record.duration_seconds,
            "Focus session completed"
        );
        self.deliver(&record);

        let preferences = freshest_preferences(self.preferences.as_ref());
        let outcome = self
            .audio
            .play_once(&preferences.completion_cue, preferences.gain());
        if outcome == PlayOutcome::Failed {
            self.notify_completion(&record);
        }
        Some(record)
    }

    fn deliver(&self, record: &CompletionRecord) {
        if let Some(sink) = self.sink.as_ref() {
            if let Err(err) = sink.record_completion(record) {
                warn!(task_id = %record.task_id, error = %err, "Failed to deliver completion record");
            }
        }
    }

    fn notify_completion(&self, record: &CompletionRecord) {
        let Some(notifier) = self.notifier.as_ref() else {
            return;
        };
        let body = format!("{} is done. Time for a break.", record.task_title);
        if let Err(err) = notifier.notify("Focus session complete", &body) {
            warn!(error = %err, "Completion notification failed");
        }
    }
}
