use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace, warn};

use super::backend::{AudioBackend, BufferId, ElementPlayer, VoiceId};
use crate::catalog::{self, SoundEntry, SoundLookup};
use crate::clock::Clock;
use crate::config::DEFAULT_LOOP_INTERVAL_MS;
use crate::error::{FocusError, Result};
use crate::preferences::clamp_gain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Started on the buffered backend.
    Played,
    /// Buffered path failed; the element fallback played it.
    FellBack,
    /// `none`, or an identifier missing from the catalog.
    Silent,
    /// Nothing could play the sound.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnlockState {
    NotAttempted,
    Unlocked,
    Refused,
}

struct ActiveLoop {
    sound: &'static SoundEntry,
    buffer: BufferId,
    gain: f32,
    voice: Option<VoiceId>,
    next_fire_at: DateTime<Utc>,
}

pub struct AudioOutput {
    backend: Box<dyn AudioBackend>,
    element: Option<Box<dyn ElementPlayer>>,
    clock: Arc<dyn Clock>,
    decoded: HashMap<&'static str, BufferId>,
    one_shots: Vec<VoiceId>,
    active_loop: Option<ActiveLoop>,
    unlock_state: UnlockState,
    loop_interval: Duration,
}

impl AudioOutput {
    pub fn new(backend: Box<dyn AudioBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            element: None,
            clock,
            decoded: HashMap::new(),
            one_shots: Vec::new(),
            active_loop: None,
            unlock_state: UnlockState::NotAttempted,
            loop_interval: Duration::milliseconds(DEFAULT_LOOP_INTERVAL_MS as i64),
        }
    }

    pub fn with_element_player(mut self, element: Box<dyn ElementPlayer>) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_loop_interval(mut self, interval: StdDuration) -> Self {
        self.loop_interval = Duration::from_std(interval)
            .unwrap_or_else(|_| Duration::milliseconds(DEFAULT_LOOP_INTERVAL_MS as i64));
        self
    }

    /// Explicit unlock, called by the host on its first user interaction.
    pub fn unlock(&mut self) -> bool {
        self.unlock_state = match self.backend.unlock() {
            Ok(()) => UnlockState::Unlocked,
            Err(err) => {
                warn!(error = %err, "Audio unlock refused");
                UnlockState::Refused
            }
        };
        self.is_unlocked()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlock_state == UnlockState::Unlocked
    }

    /// Attempts an implicit unlock at most once.
    fn ensure_unlocked(&mut self) -> bool {
        if self.unlock_state == UnlockState::NotAttempted {
            self.unlock();
        }
        self.is_unlocked()
    }

    pub fn active_loop_sound(&self) -> Option<&'static str> {
        self.active_loop.as_ref().map(|active| active.sound.id)
    }

    /// Plays `sound_id` once without blocking.
    pub fn play_once(&mut self, sound_id: &str, volume: f32) -> PlayOutcome {
        let Some(entry) = resolve(sound_id) else {
            return PlayOutcome::Silent;
        };
        let gain = clamp_gain(volume);
        self.prune_finished();

        match self.start_buffered(entry, gain) {
            Ok(voice) => {
                trace!(sound = entry.id, voice, "One-shot started");
                self.one_shots.push(voice);
                PlayOutcome::Played
            }
            Err(err) => {
                debug!(sound = entry.id, error = %err, "Buffered playback failed; trying element fallback");
                self.play_element(entry, gain)
            }
        }
    }

    /// Starts a caller-driven repeat of `sound_id`, retiring any previous loop.
    ///
    /// The clip is re-triggered by [`AudioOutput::pump`] once per loop interval.
    pub fn play_loop(&mut self, sound_id: &str, volume: f32) -> PlayOutcome {
        self.retire_loop();

        let Some(entry) = resolve(sound_id) else {
            return PlayOutcome::Silent;
        };
        let gain = clamp_gain(volume);

        let started = self
            .buffer_for(entry)
            .and_then(|buffer| self.start_voice(buffer, gain).map(|voice| (buffer, voice)));
        match started {
            Ok((buffer, voice)) => {
                let Some(next_fire_at) = self.clock.now().checked_add_signed(self.loop_interval)
                else {
                    warn!(sound = entry.id, "Loop interval out of range; dropping loop");
                    self.backend.stop(voice);
                    return PlayOutcome::Failed;
                };
                debug!(sound = entry.id, "Loop started");
                self.active_loop = Some(ActiveLoop {
                    sound: entry,
                    buffer,
                    gain,
                    voice: Some(voice),
                    next_fire_at,
                });
                PlayOutcome::Played
            }
            Err(err) => {
                warn!(sound = entry.id, error = %err, "Loop playback failed");
                PlayOutcome::Failed
            }
        }
    }

    /// Re-triggers the active loop when its interval has elapsed.
    pub fn pump(&mut self) {
        let now = self.clock.now();
        let Some(active) = self.active_loop.as_mut() else {
            return;
        };
        if now < active.next_fire_at {
            return;
        }

        if let Some(previous) = active.voice.take() {
            self.backend.stop(previous);
        }
        match self.backend.start(active.buffer, active.gain) {
            Ok(voice) => match now.checked_add_signed(self.loop_interval) {
                Some(next_fire_at) => {
                    trace!(sound = active.sound.id, voice, "Loop re-triggered");
                    active.voice = Some(voice);
                    active.next_fire_at = next_fire_at;
                }
                None => {
                    warn!(sound = active.sound.id, "Loop interval out of range; dropping loop");
                    self.backend.stop(voice);
                    self.active_loop = None;
                }
            },
            Err(err) => {
                warn!(sound = active.sound.id, error = %err, "Loop re-trigger failed; dropping loop");
                self.active_loop = None;
            }
        }
    }

    /// Halts every in-flight one-shot and cancels the active loop. Idempotent.
    pub fn stop_all(&mut self) {
        for voice in self.one_shots.drain(..) {
            self.backend.stop(voice);
        }
        if let Some(element) = self.element.as_mut() {
            element.stop_all();
        }
        self.retire_loop();
    }

    fn retire_loop(&mut self) {
        if let Some(previous) = self.active_loop.take() {
            debug!(sound = previous.sound.id, "Loop stopped");
            if let Some(voice) = previous.voice {
                self.backend.stop(voice);
            }
        }
    }

    fn start_buffered(&mut self, entry: &'static SoundEntry, gain: f32) -> Result<VoiceId> {
        let buffer = self.buffer_for(entry)?;
        self.start_voice(buffer, gain)
    }

    fn start_voice(&mut self, buffer: BufferId, gain: f32) -> Result<VoiceId> {
        self.backend.start(buffer, gain)
    }

    fn buffer_for(&mut self, entry: &'static SoundEntry) -> Result<BufferId> {
        if !self.backend.is_available() {
            return Err(FocusError::AudioUnavailable);
        }
        if !self.ensure_unlocked() {
            return Err(FocusError::AudioLocked);
        }
        if let Some(buffer) = self.decoded.get(entry.id) {
            return Ok(*buffer);
        }
        let buffer = self.backend.decode(entry.asset)?;
        self.decoded.insert(entry.id, buffer);
        Ok(buffer)
    }

    fn play_element(&mut self, entry: &'static SoundEntry, gain: f32) -> PlayOutcome {
        let Some(element) = self.element.as_mut() else {
            warn!(sound = entry.id, "No fallback player; cue dropped");
            return PlayOutcome::Failed;
        };
        match element.play(entry.asset, gain) {
            Ok(()) => PlayOutcome::FellBack,
            Err(err) => {
                warn!(sound = entry.id, error = %err, "Fallback playback failed; cue dropped");
                PlayOutcome::Failed
            }
        }
    }

    fn prune_finished(&mut self) {
        let backend = &self.backend;
        self.one_shots.retain(|voice| backend.is_playing(*voice));
    }
}

fn resolve(sound_id: &str) -> Option<&'static SoundEntry> {
    match catalog::lookup(sound_id) {
        Ok(SoundLookup::Asset(entry)) => Some(entry),
        Ok(SoundLookup::Silent) => None,
        Err(err) => {
            warn!(sound = sound_id, error = %err, "Stale sound preference; treating as none");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::{RecordingBackend, RecordingElementPlayer};

    fn output_with(backend: &RecordingBackend) -> (AudioOutput, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let output = AudioOutput::new(Box::new(backend.clone()), clock.clone());
        (output, clock)
    }

    #[test]
    fn none_is_silent_for_both_paths() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        assert_eq!(output.play_once("none", 1.0), PlayOutcome::Silent);
        assert_eq!(output.play_loop("none", 1.0), PlayOutcome::Silent);
        assert!(backend.started_assets().is_empty());
        assert_eq!(backend.unlock_attempts(), 0);
    }

    #[test]
    fn unknown_sound_is_silent() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        assert_eq!(output.play_once("deleted", 1.0), PlayOutcome::Silent);
        assert!(backend.started_assets().is_empty());
    }

    #[test]
    fn decodes_once_and_reuses_buffer() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        assert_eq!(output.play_once("chime", 0.5), PlayOutcome::Played);
        assert_eq!(output.play_once("chime", 0.5), PlayOutcome::Played);
        assert_eq!(backend.decode_count(), 1);
        assert_eq!(backend.started_assets().len(), 2);
    }

    #[test]
    fn gain_is_clamped_per_call() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        output.play_once("chime", 3.0);
        output.play_once("chime", -1.0);
        assert_eq!(backend.gains(), vec![1.0, 0.0]);
    }

    #[test]
    fn out_of_range_loop_interval_drops_loop() {
        let backend = RecordingBackend::new();
        let (output, _) = output_with(&backend);
        let mut output = output.with_loop_interval(StdDuration::from_secs(1_000_000_000_000_000));
        assert_eq!(output.play_loop("ticking", 1.0), PlayOutcome::Failed);
        assert_eq!(output.active_loop_sound(), None);
        assert_eq!(backend.playing_count(), 0);
    }

    #[test]
    fn unlock_is_attempted_once() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        output.play_once("chime", 1.0);
        output.play_once("gong", 1.0);
        output.play_loop("ticking", 1.0);
        assert_eq!(backend.unlock_attempts(), 1);
        assert!(output.is_unlocked());
    }

    #[test]
    fn refused_unlock_is_not_retried_implicitly() {
        let backend = RecordingBackend::new().refusing_unlock();
        let (mut output, _) = output_with(&backend);
        assert_eq!(output.play_once("chime", 1.0), PlayOutcome::Failed);
        assert_eq!(output.play_once("chime", 1.0), PlayOutcome::Failed);
        assert_eq!(backend.unlock_attempts(), 1);

        assert!(!output.unlock());
        assert_eq!(backend.unlock_attempts(), 2);
    }

    #[test]
    fn falls_back_to_element_for_one_shots() {
        let backend = RecordingBackend::new().unavailable();
        let element = RecordingElementPlayer::new();
        let (output, _) = output_with(&backend);
        let mut output = output.with_element_player(Box::new(element.clone()));

        assert_eq!(output.play_once("chime", 0.4), PlayOutcome::FellBack);
        assert_eq!(element.played(), vec!["sounds/complete/chime.mp3".to_string()]);
        assert_eq!(output.play_loop("ticking", 0.4), PlayOutcome::Failed);
        assert_eq!(element.played().len(), 1);
    }

    #[test]
    fn decode_failure_falls_back() {
        let backend = RecordingBackend::new().failing_decode("sounds/complete/gong.mp3");
        let element = RecordingElementPlayer::new();
        let (output, _) = output_with(&backend);
        let mut output = output.with_element_player(Box::new(element.clone()));
        assert_eq!(output.play_once("gong", 1.0), PlayOutcome::FellBack);
    }

    #[test]
    fn failed_fallback_is_swallowed() {
        let backend = RecordingBackend::new().unavailable();
        let element = RecordingElementPlayer::new().failing();
        let (output, _) = output_with(&backend);
        let mut output = output.with_element_player(Box::new(element));
        assert_eq!(output.play_once("chime", 1.0), PlayOutcome::Failed);
    }

    #[test]
    fn second_loop_retires_first() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        output.play_loop("ticking", 1.0);
        output.play_loop("metronome", 1.0);
        assert_eq!(output.active_loop_sound(), Some("metronome"));
        assert_eq!(backend.playing_count(), 1);
    }

    #[test]
    fn pump_retriggers_on_interval() {
        let backend = RecordingBackend::new();
        let (mut output, clock) = output_with(&backend);
        output.play_loop("ticking", 1.0);
        assert_eq!(backend.started_assets().len(), 1);

        output.pump();
        assert_eq!(backend.started_assets().len(), 1);

        clock.advance_secs(1);
        output.pump();
        assert_eq!(backend.started_assets().len(), 2);
        assert_eq!(backend.playing_count(), 1);
    }

    #[test]
    fn stop_all_cancels_loop_and_one_shots() {
        let backend = RecordingBackend::new();
        let element = RecordingElementPlayer::new();
        let (output, clock) = output_with(&backend);
        let mut output = output.with_element_player(Box::new(element.clone()));
        output.play_loop("ticking", 1.0);
        output.play_once("chime", 1.0);

        output.stop_all();
        assert_eq!(backend.playing_count(), 0);
        assert_eq!(output.active_loop_sound(), None);
        assert_eq!(element.stop_calls(), 1);

        clock.advance_secs(5);
        output.pump();
        assert_eq!(backend.started_assets().len(), 2);
    }

    #[test]
    fn stop_all_twice_is_harmless() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        output.stop_all();
        output.stop_all();
        assert_eq!(backend.playing_count(), 0);
        assert!(backend.started_assets().is_empty());
    }

    #[test]
    fn finished_one_shots_are_pruned() {
        let backend = RecordingBackend::new();
        let (mut output, _) = output_with(&backend);
        output.play_once("chime", 1.0);
        backend.finish_all();
        output.play_once("chime", 1.0);
        assert_eq!(output.one_shots.len(), 1);
    }
}
