//! # focus-core
//!
//! Session engine for a study-focus timer: the timer state machine, the audio
//! cues that accompany it, duplicate-completion suppression, and the local and
//! remote persistence that lets a session survive a reload.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The host owns the one-second
//!   driver and calls [`FocusEngine::tick`].
//! - **Not thread-safe**: The host serializes commands into the engine.
//! - **Graceful degradation**: Audio, preference and backend failures are logged
//!   and absorbed. Only malformed input is reported as an error.
//! - **Ports at the edges**: audio, preferences, storage, the backend and
//!   notifications are traits so hosts and tests plug in their own.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use focus_core::{FocusEngine, TaskRef};
//!
//! let mut engine = FocusEngine::new(&config, audio, preferences, clock);
//! engine.start_focus_session(TaskRef::new("task-1", "Read chapter 4"))?;
//! loop {
//!     if let Some(record) = engine.tick() {
//!         println!("done: {}", record.task_title);
//!     }
//! }
//! ```

pub mod audio;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod memory;
pub mod persistence;
pub mod ports;
pub mod preferences;
pub mod session;
pub mod storage;

pub use audio::{AudioBackend, AudioOutput, ElementPlayer, PlayOutcome};
pub use catalog::{SoundCategory, SoundEntry, SoundLookup, NONE_SOUND};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_engine_config, Durations, EngineConfig};
pub use error::{FocusError, Result};
pub use guard::CompletionGuard;
pub use persistence::{FileStore, LocalSnapshot, LocalStore};
pub use ports::{Notifier, SessionSink, StatusUpdate};
pub use preferences::{PreferenceProvider, SoundPreferences};
pub use session::{BreakKind, FocusEngine, Phase, Session, TaskRef};
pub use storage::StorageConfig;

pub use focus_protocol::{CompletionRecord, RemoteSessionSnapshot, RemoteStatus};
