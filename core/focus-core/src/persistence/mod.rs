//! Session persistence and resume.
//!
//! Two writers feed the in-memory session:
//!
//! - [`store`]: the local mirror, written after every transition so a reload can
//!   rebuild phase and elapsed time without the server.
//! - [`reconcile`]: pure reducers that overlay a local or remote snapshot onto a
//!   session. [`restore_session`] applies the local mirror first and the remote
//!   snapshot second, so the remote wins by composition order.

mod reconcile;
mod store;

pub use reconcile::{apply_local_snapshot, apply_remote_completion, apply_remote_snapshot, restore_session};
pub use store::{FileStore, LocalSnapshot, LocalStore};
