//! # Circuit Breaker Module
//!
//! Guards calls to the remote translation service. When the service fails
//! repeatedly the breaker opens and the translator answers from its static
//! table (or the sentinel) without waiting on the network, so one dead
//! upstream cannot slow down a whole daily broadcast.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker for remote lookups
///
/// ```text
/// CLOSED ────failures ≥ threshold────► OPEN
///    ▲                                   │
///    └─────────reset timeout─────────────┘
/// ```
///
/// - **CLOSED → OPEN**: when the consecutive failure count reaches `failure_threshold`
/// - **OPEN → CLOSED**: once `reset_timeout` has elapsed since the last failure;
///   the next call is let through as a probe
/// - Any success resets the failure count
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    ///
    /// ```rust
    /// use daily_words_bot::circuit_breaker::CircuitBreaker;
    /// use std::time::Duration;
    ///
    /// let breaker = CircuitBreaker::new(5, Duration::from_secs(60));
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
        }
    }

    /// Check if circuit breaker is open (blocking requests)
    ///
    /// Resets itself to closed once the reset timeout has elapsed.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock();

        if state.failure_count < self.failure_threshold {
            return false;
        }

        match state.last_failure_time {
            Some(last_time) if last_time.elapsed() < self.reset_timeout => true,
            _ => {
                *state = BreakerState::default();
                false
            }
        }
    }

    /// Record a failure to increment the failure counter
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_time = Some(Instant::now());
    }

    /// Record a success to reset the failure counter
    pub fn record_success(&self) {
        *self.state.lock() = BreakerState::default();
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));

        breaker.record_failure();
        assert!(!breaker.is_open());

        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn test_success_resets_failures() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));

        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();

        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 1);
    }

    #[test]
    fn test_closes_after_reset_timeout() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));

        breaker.record_failure();
        // Zero timeout: the probe is allowed immediately
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }
}
