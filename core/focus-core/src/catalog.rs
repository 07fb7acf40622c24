//! Static registry of the sounds the timer can play.
//!
//! Each identifier maps to an asset reference and one category. The `none`
//! sentinel is valid in every category and always resolves to silence.

use serde::{Deserialize, Serialize};

use crate::error::{FocusError, Result};

pub const NONE_SOUND: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    /// One-shot cue when a focus phase starts.
    TimerStart,
    /// One-shot cue when a focus phase completes.
    TaskCompletion,
    /// Short clip repeated on a cadence while focusing.
    FocusBackground,
}

impl SoundCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCategory::TimerStart => "timer_start",
            SoundCategory::TaskCompletion => "task_completion",
            SoundCategory::FocusBackground => "focus_background",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "timer_start" => Some(SoundCategory::TimerStart),
            "task_completion" => Some(SoundCategory::TaskCompletion),
            "focus_background" => Some(SoundCategory::FocusBackground),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoundEntry {
    pub id: &'static str,
    pub asset: &'static str,
    pub category: SoundCategory,
}

const SOUNDS: &[SoundEntry] = &[
    SoundEntry {
        id: "bell",
        asset: "sounds/start/bell.mp3",
        category: SoundCategory::TimerStart,
    },
    SoundEntry {
        id: "whistle",
        asset: "sounds/start/whistle.mp3",
        category: SoundCategory::TimerStart,
    },
    SoundEntry {
        id: "digital",
        asset: "sounds/start/digital.mp3",
        category: SoundCategory::TimerStart,
    },
    SoundEntry {
        id: "chime",
        asset: "sounds/complete/chime.mp3",
        category: SoundCategory::TaskCompletion,
    },
    SoundEntry {
        id: "gong",
        asset: "sounds/complete/gong.mp3",
        category: SoundCategory::TaskCompletion,
    },
    SoundEntry {
        id: "fanfare",
        asset: "sounds/complete/fanfare.mp3",
        category: SoundCategory::TaskCompletion,
    },
    SoundEntry {
        id: "ticking",
        asset: "sounds/background/ticking.mp3",
        category: SoundCategory::FocusBackground,
    },
    SoundEntry {
        id: "metronome",
        asset: "sounds/background/metronome.mp3",
        category: SoundCategory::FocusBackground,
    },
];

/// Result of resolving a sound identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundLookup {
    Silent,
    Asset(&'static SoundEntry),
}

/// Resolves `id` to an asset. Unknown identifiers are an error.
pub fn lookup(id: &str) -> Result<SoundLookup> {
    if id == NONE_SOUND {
        return Ok(SoundLookup::Silent);
    }
    SOUNDS
        .iter()
        .find(|entry| entry.id == id)
        .map(SoundLookup::Asset)
        .ok_or_else(|| FocusError::UnknownSound(id.to_string()))
}

/// Lists the sounds that belong to `category`, excluding the `none` sentinel.
pub fn sounds_in(category: SoundCategory) -> impl Iterator<Item = &'static SoundEntry> {
    SOUNDS.iter().filter(move |entry| entry.category == category)
}

/// Returns true if `id` is a valid selection for `category`.
pub fn accepts(category: SoundCategory, id: &str) -> bool {
    match lookup(id) {
        Ok(SoundLookup::Silent) => true,
        Ok(SoundLookup::Asset(entry)) => entry.category == category,
        Err(_) => false,
    }
}
