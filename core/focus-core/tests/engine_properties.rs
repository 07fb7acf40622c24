//! Integration tests for the session engine's observable behavior.

use std::sync::Arc;

use chrono::{Duration, Utc};
use focus_core::clock::ManualClock;
use focus_core::memory::{RecordingBackend, RecordingSink, StaticPreferences};
use focus_core::{
    AudioOutput, BreakKind, CompletionGuard, CompletionRecord, EngineConfig, FileStore,
    FocusEngine, LocalStore, Phase, RemoteSessionSnapshot, RemoteStatus, SoundPreferences,
    TaskRef,
};
use tempfile::TempDir;

struct Rig {
    engine: FocusEngine,
    clock: Arc<ManualClock>,
    backend: RecordingBackend,
    sink: RecordingSink,
}

fn rig() -> Rig {
    rig_with_config(&EngineConfig::default())
}

fn rig_with_config(config: &EngineConfig) -> Rig {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let backend = RecordingBackend::new();
    let sink = RecordingSink::new();
    let audio = AudioOutput::new(Box::new(backend.clone()), clock.clone());
    let engine = FocusEngine::new(
        config,
        audio,
        Arc::new(StaticPreferences::new(Some(SoundPreferences::default()))),
        clock.clone(),
    )
    .with_sink(Arc::new(sink.clone()));
    Rig {
        engine,
        clock,
        backend,
        sink,
    }
}

fn tick_n(rig: &mut Rig, count: u64) -> Vec<CompletionRecord> {
    let mut records = Vec::new();
    for _ in 0..count {
        rig.clock.advance_secs(1);
        records.extend(rig.engine.tick());
    }
    records
}

fn snapshot(status: RemoteStatus, duration: u64) -> RemoteSessionSnapshot {
    RemoteSessionSnapshot {
        task_id: "A".to_string(),
        task_title: "Algebra".to_string(),
        start_time: Utc::now() - Duration::seconds(duration as i64),
        current_duration: duration,
        status,
        focus_duration_minutes: Some(1),
    }
}

#[test]
fn test_focus_completes_exactly_at_target() {
    for minutes in [1u32, 2, 3] {
        let mut rig = rig();
        rig.engine
            .start_focus_session(TaskRef::new("T", "Task").with_focus_minutes(minutes))
            .unwrap();

        let target = u64::from(minutes) * 60;
        assert!(tick_n(&mut rig, target - 1).is_empty());
        assert_eq!(rig.engine.session().phase, Phase::Focusing);

        let records = tick_n(&mut rig, 1);
        assert_eq!(records.len(), 1);
        assert!(records[0].auto_completed);
        assert_eq!(records[0].duration_seconds, target);
        assert_eq!(rig.engine.session().phase, Phase::Idle);
    }
}

#[test]
fn test_focus_without_override_uses_default_duration() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("T", "Task"))
        .unwrap();
    assert!(tick_n(&mut rig, 25 * 60 - 1).is_empty());
    assert_eq!(tick_n(&mut rig, 1).len(), 1);
}

#[test]
fn test_pause_resume_round_trip_keeps_elapsed() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("T", "Task").with_focus_minutes(25))
        .unwrap();
    tick_n(&mut rig, 5);
    rig.engine.pause_timer();
    tick_n(&mut rig, 3);
    rig.engine.resume_timer();
    tick_n(&mut rig, 5);

    assert_eq!(rig.engine.session().elapsed_seconds, 10);
    assert_eq!(rig.engine.session().phase, Phase::Focusing);
}

#[test]
fn test_manual_stop_mid_session() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("T", "Task").with_focus_minutes(25))
        .unwrap();
    tick_n(&mut rig, 3);

    let record = rig.engine.stop_timer().expect("manual record");
    assert_eq!(record.duration_seconds, 3);
    assert!(!record.auto_completed);
    assert_eq!(rig.engine.session().phase, Phase::Idle);
    assert_eq!(rig.sink.completions(), vec![record]);
    assert_eq!(rig.engine.session().session_count, 0);
}

#[test]
fn test_remote_override_precedence() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("L", "Local").with_focus_minutes(25))
        .unwrap();
    tick_n(&mut rig, 300);

    rig.engine
        .resume_from_database(&snapshot(RemoteStatus::Paused, 42))
        .unwrap();
    assert_eq!(rig.engine.session().phase, Phase::Paused);
    assert_eq!(rig.engine.session().elapsed_seconds, 42);
    assert_eq!(
        rig.engine.session().active_task.as_ref().map(|t| t.id.as_str()),
        Some("A")
    );
}

#[test]
fn test_sixty_second_task_scenario() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("A", "Algebra").with_focus_minutes(1))
        .unwrap();
    let records = tick_n(&mut rig, 60);

    assert_eq!(records.len(), 1);
    assert_eq!(rig.engine.session().session_count, 1);
    assert_eq!(rig.engine.session().active_task, None);
    assert_eq!(rig.sink.completions().len(), 1);
}

#[test]
fn test_short_break_scenario() {
    let mut rig = rig();
    rig.engine.start_break(BreakKind::Short);
    let records = tick_n(&mut rig, 5 * 60);

    assert!(records.is_empty());
    assert_eq!(rig.engine.session().phase, Phase::Idle);
    assert_eq!(rig.engine.session().break_kind, None);
    assert!(rig.sink.completions().is_empty());
}

#[test]
fn test_configured_break_length_is_honored() {
    let mut config = EngineConfig::default();
    config.durations.long_break_minutes = 2;
    let mut rig = rig_with_config(&config);
    rig.engine.start_break(BreakKind::Long);

    tick_n(&mut rig, 119);
    assert_eq!(rig.engine.session().phase, Phase::Break);
    tick_n(&mut rig, 1);
    assert_eq!(rig.engine.session().phase, Phase::Idle);
}

#[test]
fn test_guard_window_expires() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let guard = CompletionGuard::new(Duration::seconds(4), clock.clone());

    assert!(guard.try_acquire("T1"));
    clock.advance_secs(2);
    assert!(!guard.try_acquire("T1"));
    clock.advance_secs(2);
    assert!(guard.try_acquire("T1"));
}

#[test]
fn test_duplicate_completion_has_one_side_effect() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("A", "Algebra").with_focus_minutes(1))
        .unwrap();
    tick_n(&mut rig, 60);
    let cues = rig.backend.started_assets().len();

    rig.clock.advance_secs(1);
    let duplicate = rig
        .engine
        .complete_timer_from_database(&snapshot(RemoteStatus::Completed, 60))
        .unwrap();

    assert_eq!(duplicate, None);
    assert_eq!(rig.sink.completions().len(), 1);
    assert_eq!(rig.backend.started_assets().len(), cues);
}

#[test]
fn test_remote_completion_after_window_is_delivered() {
    let mut rig = rig();
    rig.engine
        .start_focus_session(TaskRef::new("A", "Algebra").with_focus_minutes(1))
        .unwrap();
    tick_n(&mut rig, 60);

    rig.clock.advance_secs(10);
    let late = rig
        .engine
        .complete_timer_from_database(&snapshot(RemoteStatus::Completed, 60))
        .unwrap();
    assert!(late.is_some());
    assert_eq!(rig.engine.session().session_count, 2);
}

#[test]
fn test_shared_guard_spans_engines() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let guard = Arc::new(CompletionGuard::new(Duration::seconds(4), clock.clone()));
    let build = || {
        FocusEngine::new(
            &EngineConfig::default(),
            AudioOutput::new(Box::new(RecordingBackend::new()), clock.clone()),
            Arc::new(StaticPreferences::new(None)),
            clock.clone(),
        )
        .with_guard(guard.clone())
    };
    let mut first = build();
    let mut second = build();

    assert!(first
        .complete_timer_from_database(&snapshot(RemoteStatus::Completed, 60))
        .unwrap()
        .is_some());
    assert!(second
        .complete_timer_from_database(&snapshot(RemoteStatus::Completed, 60))
        .unwrap()
        .is_none());
}

#[test]
fn test_audio_failure_never_blocks_the_timer() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let audio = AudioOutput::new(Box::new(RecordingBackend::new().unavailable()), clock.clone());
    let mut engine = FocusEngine::new(
        &EngineConfig::default(),
        audio,
        Arc::new(StaticPreferences::new(None).failing_fetch()),
        clock.clone(),
    );

    engine
        .start_focus_session(TaskRef::new("A", "Algebra").with_focus_minutes(1))
        .unwrap();
    let mut completed = 0;
    for _ in 0..60 {
        clock.advance_secs(1);
        assert!(engine.session().is_consistent());
        completed += engine.tick().into_iter().count();
    }
    assert_eq!(completed, 1);
    assert_eq!(engine.session().phase, Phase::Idle);
}

#[test]
fn test_file_mirror_survives_engine_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("focus-timer-state.json");
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let build = |store: Arc<FileStore>| {
        FocusEngine::new(
            &EngineConfig::default(),
            AudioOutput::new(Box::new(RecordingBackend::new()), clock.clone()),
            Arc::new(StaticPreferences::new(Some(SoundPreferences::default()))),
            clock.clone(),
        )
        .with_store(store)
    };

    let mut engine = build(Arc::new(FileStore::new(&path)));
    engine
        .start_focus_session(TaskRef::new("A", "Algebra").with_focus_minutes(25))
        .unwrap();
    for _ in 0..7 {
        clock.advance_secs(1);
        engine.tick();
    }
    engine.pause_timer();
    drop(engine);

    let store = Arc::new(FileStore::new(&path));
    assert!(store.load().unwrap().is_some());
    let mut restored = build(store);
    restored.restore(None).unwrap();
    assert_eq!(restored.session().phase, Phase::Paused);
    assert_eq!(restored.session().elapsed_seconds, 7);
    assert_eq!(restored.active_loop_sound(), None);
}

#[test]
fn test_stop_all_twice_is_harmless() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let backend = RecordingBackend::new();
    let mut audio = AudioOutput::new(Box::new(backend.clone()), clock);
    audio.stop_all();
    let after_first = backend.events();
    audio.stop_all();
    assert_eq!(backend.events(), after_first);
    assert_eq!(audio.active_loop_sound(), None);
}
