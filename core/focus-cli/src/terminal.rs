//! Terminal renditions of the engine's audio and notification ports.
//!
//! One-shot cues ring the terminal bell. Background cues cannot be rendered in
//! a terminal, so their re-triggers are only traced. When stdout is not a
//! terminal the buffered backend reports itself unavailable and the engine
//! falls back to [`TextCuePlayer`], which prints the cue instead.

use std::collections::{HashMap, HashSet};
use std::io::{self, IsTerminal, Write};

use focus_core::audio::{BufferId, VoiceId};
use focus_core::catalog::{self, SoundCategory};
use focus_core::{AudioBackend, ElementPlayer, FocusError, Notifier};
use tracing::trace;

const BELL: &[u8] = b"\x07";

type Output = Box<dyn Write + Send>;

pub struct TerminalBackend {
    available: bool,
    out: Output,
    next_id: u64,
    buffers: HashMap<BufferId, Buffer>,
    looping: HashSet<VoiceId>,
}

struct Buffer {
    asset: String,
    background: bool,
}

impl TerminalBackend {
    pub fn stdout() -> Self {
        Self::with_output(io::stdout().is_terminal(), Box::new(io::stdout()))
    }

    pub fn with_output(available: bool, out: Output) -> Self {
        Self {
            available,
            out,
            next_id: 0,
            buffers: HashMap::new(),
            looping: HashSet::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn is_background(asset: &str) -> bool {
    catalog::sounds_in(SoundCategory::FocusBackground).any(|entry| entry.asset == asset)
}

impl AudioBackend for TerminalBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn unlock(&mut self) -> focus_core::Result<()> {
        Ok(())
    }

    fn decode(&mut self, asset: &str) -> focus_core::Result<BufferId> {
        if asset.is_empty() {
            return Err(FocusError::Decode {
                sound: asset.to_string(),
                details: "empty asset reference".to_string(),
            });
        }
        let id = self.next_id();
        self.buffers.insert(
            id,
            Buffer {
                asset: asset.to_string(),
                background: is_background(asset),
            },
        );
        Ok(id)
    }

    fn start(&mut self, buffer: BufferId, _gain: f32) -> focus_core::Result<VoiceId> {
        let Some(clip) = self.buffers.get(&buffer) else {
            return Err(FocusError::Playback {
                sound: buffer.to_string(),
                details: "buffer was never decoded".to_string(),
            });
        };
        let (asset, background) = (clip.asset.clone(), clip.background);

        let voice = self.next_id();
        if background {
            trace!(asset = %asset, voice, "Background cue tick");
            self.looping.insert(voice);
            return Ok(voice);
        }

        self.out
            .write_all(BELL)
            .and_then(|_| self.out.flush())
            .map_err(|err| FocusError::Playback {
                sound: asset,
                details: err.to_string(),
            })?;
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        self.looping.remove(&voice);
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.looping.contains(&voice)
    }
}

/// Prints the cue as a line of text.
pub struct TextCuePlayer {
    out: Output,
}

impl TextCuePlayer {
    pub fn stdout() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(out: Output) -> Self {
        Self { out }
    }
}

impl ElementPlayer for TextCuePlayer {
    fn play(&mut self, asset: &str, gain: f32) -> focus_core::Result<()> {
        if gain <= 0.0 {
            return Ok(());
        }
        writeln!(self.out, "[cue] {}", asset).map_err(|err| FocusError::Playback {
            sound: asset.to_string(),
            details: err.to_string(),
        })
    }

    fn stop_all(&mut self) {}
}

pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, title: &str, body: &str) -> focus_core::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}: {}", title, body).map_err(|err| FocusError::Backend(err.to_string()))
    }
}
