//! In-memory implementations of the engine's ports.
//!
//! Used by tests and by headless hosts that have no real audio device or
//! backend. Every type is a cheap clone over shared state, so a test can keep a
//! handle and inspect what the engine did after handing the other one over.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use focus_protocol::CompletionRecord;

use crate::audio::{AudioBackend, BufferId, ElementPlayer, VoiceId};
use crate::error::{FocusError, Result};
use crate::persistence::{LocalSnapshot, LocalStore};
use crate::ports::{Notifier, SessionSink, StatusUpdate};
use crate::preferences::{PreferenceProvider, SoundPreferences};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Local store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Arc<Mutex<Option<LocalSnapshot>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: LocalSnapshot) -> Self {
        let store = Self::default();
        *locked(&store.snapshot) = Some(snapshot);
        store
    }

    pub fn snapshot(&self) -> Option<LocalSnapshot> {
        locked(&self.snapshot).clone()
    }

    pub fn save_count(&self) -> usize {
        *locked(&self.saves)
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> Result<Option<LocalSnapshot>> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &LocalSnapshot) -> Result<()> {
        *locked(&self.snapshot) = Some(snapshot.clone());
        *locked(&self.saves) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *locked(&self.snapshot) = None;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audio
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Started { asset: String, gain: f32, voice: VoiceId },
    Stopped { voice: VoiceId },
}

#[derive(Debug, Default)]
struct RecorderState {
    unavailable: bool,
    refuse_unlock: bool,
    failing_decode: HashSet<String>,
    unlock_attempts: usize,
    decodes: Vec<String>,
    buffers: Vec<String>,
    playing: HashSet<VoiceId>,
    next_voice: VoiceId,
    events: Vec<AudioEvent>,
}

/// Buffered backend that records every call instead of producing sound.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable(self) -> Self {
        locked(&self.state).unavailable = true;
        self
    }

    pub fn refusing_unlock(self) -> Self {
        locked(&self.state).refuse_unlock = true;
        self
    }

    pub fn failing_decode(self, asset: &str) -> Self {
        locked(&self.state).failing_decode.insert(asset.to_string());
        self
    }

    pub fn unlock_attempts(&self) -> usize {
        locked(&self.state).unlock_attempts
    }

    pub fn decode_count(&self) -> usize {
        locked(&self.state).decodes.len()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        locked(&self.state).events.clone()
    }

    /// Assets started so far, in order, including loop re-triggers.
    pub fn started_assets(&self) -> Vec<String> {
        locked(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                AudioEvent::Started { asset, .. } => Some(asset.clone()),
                AudioEvent::Stopped { .. } => None,
            })
            .collect()
    }

    pub fn gains(&self) -> Vec<f32> {
        locked(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                AudioEvent::Started { gain, .. } => Some(*gain),
                AudioEvent::Stopped { .. } => None,
            })
            .collect()
    }

    pub fn playing_count(&self) -> usize {
        locked(&self.state).playing.len()
    }

    /// Marks every voice as finished, as if the clips ran out.
    pub fn finish_all(&self) {
        locked(&self.state).playing.clear();
    }
}

impl AudioBackend for RecordingBackend {
    fn is_available(&self) -> bool {
        !locked(&self.state).unavailable
    }

    fn unlock(&mut self) -> Result<()> {
        let mut state = locked(&self.state);
        state.unlock_attempts += 1;
        if state.refuse_unlock {
            Err(FocusError::AudioLocked)
        } else {
            Ok(())
        }
    }

    fn decode(&mut self, asset: &str) -> Result<BufferId> {
        let mut state = locked(&self.state);
        state.decodes.push(asset.to_string());
        if state.failing_decode.contains(asset) {
            return Err(FocusError::Decode {
                sound: asset.to_string(),
                details: "corrupt asset".to_string(),
            });
        }
        state.buffers.push(asset.to_string());
        Ok((state.buffers.len() - 1) as BufferId)
    }

    fn start(&mut self, buffer: BufferId, gain: f32) -> Result<VoiceId> {
        let mut state = locked(&self.state);
        let asset = state
            .buffers
            .get(buffer as usize)
            .cloned()
            .ok_or_else(|| FocusError::Playback {
                sound: buffer.to_string(),
                details: "unknown buffer".to_string(),
            })?;
        state.next_voice += 1;
        let voice = state.next_voice;
        state.playing.insert(voice);
        state.events.push(AudioEvent::Started { asset, gain, voice });
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        let mut state = locked(&self.state);
        if state.playing.remove(&voice) {
            state.events.push(AudioEvent::Stopped { voice });
        }
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        locked(&self.state).playing.contains(&voice)
    }
}

#[derive(Debug, Default)]
struct ElementState {
    failing: bool,
    played: Vec<String>,
    stop_calls: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingElementPlayer {
    state: Arc<Mutex<ElementState>>,
}

impl RecordingElementPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self) -> Self {
        locked(&self.state).failing = true;
        self
    }

    pub fn played(&self) -> Vec<String> {
        locked(&self.state).played.clone()
    }

    pub fn stop_calls(&self) -> usize {
        locked(&self.state).stop_calls
    }
}

impl ElementPlayer for RecordingElementPlayer {
    fn play(&mut self, asset: &str, _gain: f32) -> Result<()> {
        let mut state = locked(&self.state);
        if state.failing {
            return Err(FocusError::Playback {
                sound: asset.to_string(),
                details: "element playback rejected".to_string(),
            });
        }
        state.played.push(asset.to_string());
        Ok(())
    }

    fn stop_all(&mut self) {
        locked(&self.state).stop_calls += 1;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborators
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SinkState {
    failing: bool,
    completions: Vec<CompletionRecord>,
    statuses: Vec<StatusUpdate>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self) -> Self {
        locked(&self.state).failing = true;
        self
    }

    pub fn completions(&self) -> Vec<CompletionRecord> {
        locked(&self.state).completions.clone()
    }

    pub fn statuses(&self) -> Vec<StatusUpdate> {
        locked(&self.state).statuses.clone()
    }
}

impl SessionSink for RecordingSink {
    fn record_completion(&self, record: &CompletionRecord) -> Result<()> {
        let mut state = locked(&self.state);
        if state.failing {
            return Err(FocusError::Backend("backend offline".to_string()));
        }
        state.completions.push(record.clone());
        Ok(())
    }

    fn update_status(&self, update: &StatusUpdate) -> Result<()> {
        let mut state = locked(&self.state);
        if state.failing {
            return Err(FocusError::Backend("backend offline".to_string()));
        }
        state.statuses.push(update.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        locked(&self.sent).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        locked(&self.sent).push((title.to_string(), body.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PreferenceState {
    cached: Option<SoundPreferences>,
    fresh: Option<SoundPreferences>,
    fail_fetch: bool,
    fetches: usize,
}

/// Preference provider with a fixed cache and an optional fresh value.
#[derive(Debug, Clone, Default)]
pub struct StaticPreferences {
    state: Arc<Mutex<PreferenceState>>,
}

impl StaticPreferences {
    pub fn new(cached: Option<SoundPreferences>) -> Self {
        let provider = Self::default();
        locked(&provider.state).cached = cached;
        provider
    }

    pub fn with_fresh(self, fresh: SoundPreferences) -> Self {
        locked(&self.state).fresh = Some(fresh);
        self
    }

    pub fn failing_fetch(self) -> Self {
        locked(&self.state).fail_fetch = true;
        self
    }

    pub fn set_cached(&self, cached: SoundPreferences) {
        locked(&self.state).cached = Some(cached);
    }

    pub fn set_fresh(&self, fresh: SoundPreferences) {
        locked(&self.state).fresh = Some(fresh);
    }

    pub fn fetch_count(&self) -> usize {
        locked(&self.state).fetches
    }
}

impl PreferenceProvider for StaticPreferences {
    fn cached(&self) -> Option<SoundPreferences> {
        locked(&self.state).cached.clone()
    }

    fn fetch_fresh(&self) -> Result<SoundPreferences> {
        let mut state = locked(&self.state);
        state.fetches += 1;
        if state.fail_fetch {
            return Err(FocusError::PreferenceFetch("preference store offline".to_string()));
        }
        state
            .fresh
            .clone()
            .or_else(|| state.cached.clone())
            .ok_or_else(|| FocusError::PreferenceFetch("no preferences stored".to_string()))
    }
}
