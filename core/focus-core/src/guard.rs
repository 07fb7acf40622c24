//! Completion dedup guard.
//!
//! Two paths can observe the end of the same focus phase: the local tick
//! overflow and a remote snapshot reporting the session as completed. Whichever
//! acquires the guard first produces the side effects; the other is suppressed.
//!
//! Locks live in memory only and expire after the suppression window. A reload
//! resets them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;

#[derive(Debug, Default)]
struct GuardState {
    locks: HashMap<String, DateTime<Utc>>,
    last_completed: Option<(String, DateTime<Utc>)>,
}

impl GuardState {
    fn prune(&mut self, now: DateTime<Utc>, window: Duration) {
        self.locks
            .retain(|_, acquired_at| now.signed_duration_since(*acquired_at) < window);
        if let Some((_, completed_at)) = &self.last_completed {
            if now.signed_duration_since(*completed_at) >= window {
                self.last_completed = None;
            }
        }
    }
}

pub struct CompletionGuard {
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<GuardState>,
}

impl CompletionGuard {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            state: Mutex::new(GuardState::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if the caller may run completion side effects for `task_id`.
    pub fn try_acquire(&self, task_id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.prune(now, self.window);

        if state.locks.contains_key(task_id) {
            debug!(task_id = %task_id, "Completion suppressed: lock held");
            return false;
        }

        let recently_completed = state
            .last_completed
            .as_ref()
            .map(|(last, _)| last == task_id)
            .unwrap_or(false);
        if recently_completed && !state.locks.is_empty() {
            debug!(task_id = %task_id, "Completion suppressed: task just completed");
            return false;
        }

        state.locks.insert(task_id.to_string(), now);
        state.last_completed = Some((task_id.to_string(), now));
        true
    }

    /// Releases the lock early. Locks also expire on their own.
    pub fn release(&self, task_id: &str) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.locks.remove(task_id);
    }

    pub fn is_held(&self, task_id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.prune(now, self.window);
        state.locks.contains_key(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn guard(window_secs: i64) -> (CompletionGuard, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let guard = CompletionGuard::new(Duration::seconds(window_secs), clock.clone());
        (guard, clock)
    }

    #[test]
    fn second_acquire_within_window_is_denied() {
        let (guard, clock) = guard(4);
        assert!(guard.try_acquire("T1"));
        clock.advance_secs(3);
        assert!(!guard.try_acquire("T1"));
    }

    #[test]
    fn acquire_after_window_is_granted() {
        let (guard, clock) = guard(4);
        assert!(guard.try_acquire("T1"));
        clock.advance_secs(4);
        assert!(guard.try_acquire("T1"));
    }

    #[test]
    fn different_tasks_do_not_interfere() {
        let (guard, _) = guard(4);
        assert!(guard.try_acquire("T1"));
        assert!(guard.try_acquire("T2"));
    }

    #[test]
    fn release_allows_reacquire() {
        let (guard, _) = guard(4);
        assert!(guard.try_acquire("T1"));
        guard.release("T1");
        assert!(!guard.is_held("T1"));
        assert!(guard.try_acquire("T1"));
    }

    #[test]
    fn released_task_still_suppressed_while_other_lock_held() {
        let (guard, _) = guard(4);
        assert!(guard.try_acquire("T2"));
        assert!(guard.try_acquire("T1"));
        guard.release("T1");
        assert!(!guard.try_acquire("T1"));

        guard.release("T2");
        assert!(guard.try_acquire("T1"));
    }

    #[test]
    fn is_held_expires() {
        let (guard, clock) = guard(3);
        guard.try_acquire("T1");
        assert!(guard.is_held("T1"));
        clock.advance_secs(3);
        assert!(!guard.is_held("T1"));
    }
}
