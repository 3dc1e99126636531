// Account lockout policy
//
// Pure state-transition functions over the per-user lockout fields: a
// failed-login counter with a lazy-expiring lock. The expired-lock clear
// must run before the locked short-circuit, otherwise a user whose lock
// just elapsed would be rejected once more.

use chrono::{DateTime, Duration, Utc};

/// Failed attempts that trigger a lock
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Lock window length in minutes
pub const LOCK_DURATION_MINUTES: i64 = 15;

/// Per-user lockout fields, detached from the full user record so the
/// transitions stay pure and testable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutState {
    pub failed_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
}

impl LockoutState {
    pub fn new(failed_attempts: i32, lock_until: Option<DateTime<Utc>>) -> Self {
        Self {
            failed_attempts,
            lock_until,
        }
    }
}

/// Outcome of evaluating the lock before a credential check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDecision {
    /// Credentials may be evaluated
    Proceed,
    /// Still inside the lock window; do not evaluate the password
    Locked { until: DateTime<Utc> },
}

/// Evaluate the lock state at `now`, lazily clearing an expired lock
///
/// Returns the (possibly cleared) state and the decision. The caller must
/// persist the returned state when it differs from the input, so the clear
/// survives even if the subsequent credential check fails the request.
pub fn evaluate(state: LockoutState, now: DateTime<Utc>) -> (LockoutState, LockDecision) {
    match state.lock_until {
        // Expired lock: clear it and reset the counter before anything else
        Some(until) if until <= now => (LockoutState::new(0, None), LockDecision::Proceed),
        // Active lock: reject without touching the password or the clock
        Some(until) => (state, LockDecision::Locked { until }),
        None => (state, LockDecision::Proceed),
    }
}

/// Record a failed credential check
///
/// Increments the counter; reaching the threshold starts a lock window.
pub fn record_failure(state: LockoutState, now: DateTime<Utc>) -> LockoutState {
    let attempts = state.failed_attempts + 1;
    let lock_until = if attempts >= MAX_FAILED_ATTEMPTS {
        Some(now + Duration::minutes(LOCK_DURATION_MINUTES))
    } else {
        state.lock_until
    };
    LockoutState::new(attempts, lock_until)
}

/// Record a successful authentication: counter and lock are cleared
pub fn record_success() -> LockoutState {
    LockoutState::new(0, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn open_state_proceeds() {
        let state = LockoutState::new(0, None);
        let (next, decision) = evaluate(state, now());
        assert_eq!(decision, LockDecision::Proceed);
        assert_eq!(next, state);
    }

    #[test]
    fn failures_below_threshold_do_not_lock() {
        let mut state = LockoutState::new(0, None);
        for _ in 0..(MAX_FAILED_ATTEMPTS - 1) {
            state = record_failure(state, now());
        }
        assert_eq!(state.failed_attempts, MAX_FAILED_ATTEMPTS - 1);
        assert!(state.lock_until.is_none());
    }

    #[test]
    fn fifth_failure_starts_a_lock_window() {
        let t = now();
        let mut state = LockoutState::new(0, None);
        for _ in 0..MAX_FAILED_ATTEMPTS {
            state = record_failure(state, t);
        }
        assert_eq!(state.failed_attempts, MAX_FAILED_ATTEMPTS);
        let until = state.lock_until.expect("lock must be set");
        assert!(until >= t + Duration::minutes(LOCK_DURATION_MINUTES));
    }

    #[test]
    fn active_lock_rejects_without_clearing() {
        let t = now();
        let until = t + Duration::minutes(10);
        let state = LockoutState::new(MAX_FAILED_ATTEMPTS, Some(until));
        let (next, decision) = evaluate(state, t);
        assert_eq!(decision, LockDecision::Locked { until });
        assert_eq!(next, state);
    }

    #[test]
    fn expired_lock_is_cleared_before_the_locked_check() {
        let t = now();
        let state = LockoutState::new(MAX_FAILED_ATTEMPTS, Some(t - Duration::seconds(1)));
        let (next, decision) = evaluate(state, t);
        assert_eq!(decision, LockDecision::Proceed);
        assert_eq!(next.failed_attempts, 0);
        assert!(next.lock_until.is_none());
    }

    #[test]
    fn lock_expiring_exactly_now_is_treated_as_expired() {
        let t = now();
        let state = LockoutState::new(MAX_FAILED_ATTEMPTS, Some(t));
        let (next, decision) = evaluate(state, t);
        assert_eq!(decision, LockDecision::Proceed);
        assert_eq!(next.failed_attempts, 0);
    }

    #[test]
    fn success_resets_counter_and_lock() {
        let state = record_success();
        assert_eq!(state.failed_attempts, 0);
        assert!(state.lock_until.is_none());
    }

    #[test]
    fn failure_after_lazy_clear_counts_from_zero() {
        let t = now();
        let state = LockoutState::new(MAX_FAILED_ATTEMPTS, Some(t - Duration::minutes(1)));
        let (cleared, _) = evaluate(state, t);
        let after_failure = record_failure(cleared, t);
        assert_eq!(after_failure.failed_attempts, 1);
        assert!(after_failure.lock_until.is_none());
    }
}
