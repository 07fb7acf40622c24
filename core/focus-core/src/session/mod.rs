//! The session aggregate and the engine that drives it.

mod engine;
mod transition;
mod types;

pub use engine::FocusEngine;
pub use transition::{next_session, Command, Effect, Transition};
pub use types::{BreakKind, Phase, Session, TaskRef};
