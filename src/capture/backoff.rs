//! Retry state machine and backoff schedule for capture attempts.
//!
//! The schedule is a pure function and sleeping goes through an injected
//! abstraction, so tests drive the full retry path without real delays.

use std::time::Duration;

/// Maximum capture attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Explicit retry state. Each failed attempt advances to the next state;
/// failure in `Attempt3` lands in `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Attempt1,
    Attempt2,
    Attempt3,
    Exhausted,
}

impl AttemptState {
    /// 1-based attempt number; `None` once exhausted.
    pub fn number(&self) -> Option<u32> {
        match self {
            AttemptState::Attempt1 => Some(1),
            AttemptState::Attempt2 => Some(2),
            AttemptState::Attempt3 => Some(3),
            AttemptState::Exhausted => None,
        }
    }

    /// State after a failure in this state.
    pub fn after_failure(&self) -> AttemptState {
        match self {
            AttemptState::Attempt1 => AttemptState::Attempt2,
            AttemptState::Attempt2 => AttemptState::Attempt3,
            AttemptState::Attempt3 => AttemptState::Exhausted,
            AttemptState::Exhausted => AttemptState::Exhausted,
        }
    }
}

/// Backoff delay after a failed attempt: 2s, 4s, 8s.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.max(1)))
}

/// Injected sleep so tests run without real waiting.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn states_advance_to_exhausted() {
        let mut state = AttemptState::Attempt1;
        assert_eq!(state.number(), Some(1));

        state = state.after_failure();
        assert_eq!(state, AttemptState::Attempt2);
        state = state.after_failure();
        assert_eq!(state, AttemptState::Attempt3);
        state = state.after_failure();
        assert_eq!(state, AttemptState::Exhausted);
        assert_eq!(state.number(), None);

        // Exhausted is absorbing.
        assert_eq!(state.after_failure(), AttemptState::Exhausted);
    }
}
