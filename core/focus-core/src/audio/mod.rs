//! Audio output for timer cues.
//!
//! [`AudioOutput`] wraps a low-latency buffered backend ([`AudioBackend`]) and an
//! optional element-style fallback ([`ElementPlayer`]) used for one-shot cues when
//! the buffered path is unavailable. It owns the single active loop handle, so a
//! second `play_loop` retires the first by construction.
//!
//! Nothing here returns an error to the caller: failures are logged and reported
//! as a [`PlayOutcome`].

mod backend;
mod output;

pub use backend::{AudioBackend, BufferId, ElementPlayer, VoiceId};
pub use output::{AudioOutput, PlayOutcome};
