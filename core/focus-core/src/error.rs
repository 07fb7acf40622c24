//! Error types for focus-core operations.
//!
//! Most of these never escape a transition: the engine logs and swallows audio,
//! preference, store and sink failures so the timer state keeps advancing.

use std::path::PathBuf;

use focus_protocol::ErrorInfo;

/// All errors that can occur in focus-core operations.
#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid session snapshot: {code}: {message}")]
    InvalidSnapshot { code: String, message: String },

    // ─────────────────────────────────────────────────────────────────────
    // Audio Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Unknown sound identifier: {0}")]
    UnknownSound(String),

    #[error("Audio output unavailable")]
    AudioUnavailable,

    #[error("Audio output is locked until the first user interaction")]
    AudioLocked,

    #[error("Failed to decode sound {sound}: {details}")]
    Decode { sound: String, details: String },

    #[error("Failed to play sound {sound}: {details}")]
    Playback { sound: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Preference fetch failed: {0}")]
    PreferenceFetch(String),

    #[error("Session backend rejected update: {0}")]
    Backend(String),

    // ─────────────────────────────────────────────────────────────────────
    // Configuration / I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using FocusError.
pub type Result<T> = std::result::Result<T, FocusError>;

impl From<ErrorInfo> for FocusError {
    fn from(info: ErrorInfo) -> Self {
        FocusError::InvalidSnapshot {
            code: info.code,
            message: info.message,
        }
    }
}

impl FocusError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FocusError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        FocusError::Json {
            context: context.into(),
            source,
        }
    }
}
