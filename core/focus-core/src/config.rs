//! Engine configuration loaded from `config.toml`.
//!
//! A missing file yields defaults; a malformed file is an error carrying the path.
//!
//! ```toml
//! [durations]
//! default_focus_minutes = 25
//! short_break_minutes = 5
//! long_break_minutes = 15
//!
//! [guard]
//! suppression_window_secs = 4
//!
//! [audio]
//! loop_interval_ms = 1000
//!
//! [sounds]
//! focus_cue = "bell"
//! completion_cue = "chime"
//! background_cue = "ticking"
//! volume = 0.6
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

use crate::error::{FocusError, Result};
use crate::preferences::SoundPreferences;
use crate::session::BreakKind;

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const SHORT_BREAK_MINUTES: u32 = 5;
pub const LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_SUPPRESSION_WINDOW_SECS: u64 = 4;
pub const DEFAULT_LOOP_INTERVAL_MS: u64 = 1000;
pub const MAX_SUPPRESSION_WINDOW_SECS: u64 = 3600;
pub const MAX_LOOP_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub durations: Durations,
    pub guard: GuardConfig,
    pub audio: AudioConfig,
    pub sounds: SoundPreferences,
}

/// Phase lengths. The focus default applies when a task carries no override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Durations {
    pub default_focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            default_focus_minutes: DEFAULT_FOCUS_MINUTES,
            short_break_minutes: SHORT_BREAK_MINUTES,
            long_break_minutes: LONG_BREAK_MINUTES,
        }
    }
}

impl Durations {
    pub fn focus_target_secs(&self, focus_duration_minutes: Option<u32>) -> u64 {
        u64::from(focus_duration_minutes.unwrap_or(self.default_focus_minutes)) * 60
    }

    pub fn break_target_secs(&self, kind: BreakKind) -> u64 {
        let minutes = match kind {
            BreakKind::Short => self.short_break_minutes,
            BreakKind::Long => self.long_break_minutes,
        };
        u64::from(minutes) * 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub suppression_window_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            suppression_window_secs: DEFAULT_SUPPRESSION_WINDOW_SECS,
        }
    }
}

impl GuardConfig {
    /// Suppression window, capped at [`MAX_SUPPRESSION_WINDOW_SECS`].
    pub fn window(&self) -> chrono::Duration {
        let secs = self.suppression_window_secs.min(MAX_SUPPRESSION_WINDOW_SECS) as i64;
        chrono::Duration::try_seconds(secs)
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_SUPPRESSION_WINDOW_SECS as i64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub loop_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: DEFAULT_LOOP_INTERVAL_MS,
        }
    }
}

impl AudioConfig {
    pub fn loop_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.loop_interval_ms.clamp(1, MAX_LOOP_INTERVAL_MS))
    }
}

pub fn load_engine_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    let Some(config_path) = path else {
        return Ok(EngineConfig::default());
    };

    if !config_path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs_err::read_to_string(&config_path)
        .map_err(|err| FocusError::io(format!("read {}", config_path.display()), err))?;
    parse_engine_config(&config_path, &content)
}

fn parse_engine_config(path: &Path, content: &str) -> Result<EngineConfig> {
    let malformed = |details: String| FocusError::ConfigMalformed {
        path: path.to_path_buf(),
        details,
    };
    let config =
        toml::from_str::<EngineConfig>(content).map_err(|err| malformed(err.to_string()))?;

    if config.guard.suppression_window_secs > MAX_SUPPRESSION_WINDOW_SECS {
        return Err(malformed(format!(
            "guard.suppression_window_secs must be at most {}",
            MAX_SUPPRESSION_WINDOW_SECS
        )));
    }
    if config.audio.loop_interval_ms == 0 || config.audio.loop_interval_ms > MAX_LOOP_INTERVAL_MS {
        return Err(malformed(format!(
            "audio.loop_interval_ms must be between 1 and {}",
            MAX_LOOP_INTERVAL_MS
        )));
    }
    Ok(config)
}
