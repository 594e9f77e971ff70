use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use desk_core::Clock;

/// Failures allowed inside one window before the principal locks out.
pub const MAX_FAILURES: u32 = 3;

/// Lockout window length, measured from the first failure.
pub const WINDOW_SECS: i64 = 60;

struct AttemptState {
    failures: u32,
    window_started_at: DateTime<Utc>,
}

/// In-memory failed-login throttle, keyed by username.
///
/// A principal gets [`MAX_FAILURES`] failures inside a [`WINDOW_SECS`]
/// window counted from the first failure. Reaching the limit locks the
/// principal out until the window expires; expiry is lazy, checked on the
/// next attempt. A successful login clears the counter. State is process
/// local and lost on restart.
pub struct LoginThrottle {
    clock: Arc<dyn Clock>,
    attempts: Mutex<HashMap<String, AttemptState>>,
}

/// Outcome of recording a failed attempt.
pub struct FailureOutcome {
    /// Attempts left before lockout. Zero means locked.
    pub remaining_attempts: u32,
    /// Seconds until the lock expires, set only when this failure locked
    /// the principal out.
    pub retry_after_secs: Option<u64>,
}

impl LoginThrottle {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Seconds remaining on an active lockout for `username`, if any.
    ///
    /// Expired windows are dropped here, so a caller past the window sees
    /// a clean slate.
    pub fn check_locked(&self, username: &str) -> Option<u64> {
        let now = self.clock.now();
        let mut attempts = self.lock_attempts();

        let Some(state) = attempts.get(username) else {
            return None;
        };

        let elapsed = (now - state.window_started_at).num_seconds();
        if elapsed >= WINDOW_SECS {
            attempts.remove(username);
            return None;
        }

        if state.failures >= MAX_FAILURES {
            Some((WINDOW_SECS - elapsed) as u64)
        } else {
            None
        }
    }

    /// Record a failed attempt for `username`.
    ///
    /// The window starts at the first failure; failures after a window
    /// expires start a fresh window.
    pub fn record_failure(&self, username: &str) -> FailureOutcome {
        let now = self.clock.now();
        let mut attempts = self.lock_attempts();

        let state = attempts
            .entry(username.to_string())
            .and_modify(|s| {
                if (now - s.window_started_at).num_seconds() >= WINDOW_SECS {
                    s.failures = 0;
                    s.window_started_at = now;
                }
            })
            .or_insert_with(|| AttemptState {
                failures: 0,
                window_started_at: now,
            });

        state.failures += 1;
        let remaining = MAX_FAILURES.saturating_sub(state.failures);

        let retry_after = if state.failures >= MAX_FAILURES {
            let elapsed = (now - state.window_started_at).num_seconds();
            Some((WINDOW_SECS - elapsed).max(0) as u64)
        } else {
            None
        };

        FailureOutcome {
            remaining_attempts: remaining,
            retry_after_secs: retry_after,
        }
    }

    /// Clear the failure counter after a successful login.
    pub fn record_success(&self, username: &str) {
        self.lock_attempts().remove(username);
    }

    /// The map stays usable even if a holder panicked mid-update; the worst
    /// case is one stale counter, which the window expiry already handles.
    fn lock_attempts(&self) -> std::sync::MutexGuard<'_, HashMap<String, AttemptState>> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}
