//! Sound preferences and the provider port that supplies them.
//!
//! The preference store lives outside the engine. The engine reads the cached
//! copy for cues played at command time and asks for the freshest copy before
//! a completion cue, falling back to the cache and then to silence.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::NONE_SOUND;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundPreferences {
    /// One-shot cue when a focus phase starts.
    #[serde(alias = "focusCueId")]
    pub focus_cue: String,
    #[serde(alias = "completionCueId")]
    pub completion_cue: String,
    /// Cue repeated while focusing.
    #[serde(alias = "backgroundCueId")]
    pub background_cue: String,
    pub volume: f32,
}

impl Default for SoundPreferences {
    fn default() -> Self {
        Self {
            focus_cue: "bell".to_string(),
            completion_cue: "chime".to_string(),
            background_cue: "ticking".to_string(),
            volume: 0.6,
        }
    }
}

impl SoundPreferences {
    pub fn silent() -> Self {
        Self {
            focus_cue: NONE_SOUND.to_string(),
            completion_cue: NONE_SOUND.to_string(),
            background_cue: NONE_SOUND.to_string(),
            volume: 0.0,
        }
    }

    pub fn gain(&self) -> f32 {
        clamp_gain(self.volume)
    }
}

/// Clamps a volume to `[0, 1]`; NaN counts as muted.
pub fn clamp_gain(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

pub trait PreferenceProvider: Send + Sync {
    /// Last known preferences, if any were ever loaded.
    fn cached(&self) -> Option<SoundPreferences>;

    /// Fetches the freshest preferences from the backing store.
    fn fetch_fresh(&self) -> Result<SoundPreferences>;
}

/// Preferences for cues played at command time: the cached copy, else silence.
pub fn current_preferences(provider: &dyn PreferenceProvider) -> SoundPreferences {
    provider.cached().unwrap_or_else(SoundPreferences::silent)
}

/// Preferences for the completion cue: fresh fetch, then cache, then silence.
pub fn freshest_preferences(provider: &dyn PreferenceProvider) -> SoundPreferences {
    match provider.fetch_fresh() {
        Ok(preferences) => preferences,
        Err(err) => {
            warn!(error = %err, "Preference fetch failed; using cached sound settings");
            current_preferences(provider)
        }
    }
}
