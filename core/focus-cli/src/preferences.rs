//! Sound preferences read from the `[sounds]` table of `config.toml`.

use std::path::PathBuf;

use focus_core::catalog::{self, SoundCategory};
use focus_core::{load_engine_config, FocusError, PreferenceProvider, SoundPreferences};
use tracing::warn;

pub struct ConfigPreferences {
    path: PathBuf,
    cached: SoundPreferences,
}

impl ConfigPreferences {
    /// `cached` is the copy loaded at startup; fresh fetches re-read `path`.
    pub fn new(path: PathBuf, cached: SoundPreferences) -> Self {
        warn_on_mismatched(&cached);
        Self { path, cached }
    }
}

fn warn_on_mismatched(preferences: &SoundPreferences) {
    let slots = [
        (SoundCategory::TimerStart, &preferences.focus_cue),
        (SoundCategory::TaskCompletion, &preferences.completion_cue),
        (SoundCategory::FocusBackground, &preferences.background_cue),
    ];
    for (category, id) in slots {
        if !catalog::accepts(category, id) {
            warn!(category = category.as_str(), sound = %id, "Sound preference does not fit its slot");
        }
    }
}

impl PreferenceProvider for ConfigPreferences {
    fn cached(&self) -> Option<SoundPreferences> {
        Some(self.cached.clone())
    }

    fn fetch_fresh(&self) -> focus_core::Result<SoundPreferences> {
        load_engine_config(Some(self.path.clone()))
            .map(|config| config.sounds)
            .map_err(|err| FocusError::PreferenceFetch(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use tempfile::tempdir;

    #[test]
    fn fresh_fetch_sees_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let provider = ConfigPreferences::new(path.clone(), SoundPreferences::default());

        fs::write(&path, "[sounds]\ncompletion_cue = \"fanfare\"\n").unwrap();
        assert_eq!(provider.fetch_fresh().unwrap().completion_cue, "fanfare");
        assert_eq!(provider.cached().unwrap().completion_cue, "chime");
    }

    #[test]
    fn malformed_file_is_a_fetch_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[sounds\n").unwrap();
        let provider = ConfigPreferences::new(path, SoundPreferences::default());
        assert!(matches!(
            provider.fetch_fresh(),
            Err(FocusError::PreferenceFetch(_))
        ));
    }
}
