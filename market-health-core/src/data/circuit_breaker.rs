//! Circuit breaker for the upstream price provider.
//!
//! HTTP 403 trips the breaker immediately. Repeated failures (429, 5xx,
//! malformed payloads) trip it after a threshold. While open, every attempt
//! is refused without touching the network, which lets a scoring pass fall
//! through to stale cache entries quickly instead of sleeping on a ban.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30 * 60);
const DEFAULT_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open { tripped_at: Instant },
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    consecutive_failures: u32,
}

/// Shared breaker state. One instance per provider.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CircuitBreaker {
    /// Closed breaker that stays open for `cooldown` once tripped.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: DEFAULT_THRESHOLD,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the counters inconsistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a request may go out now. Closes the breaker once the cooldown has passed.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.lock();
        match inner.phase {
            Phase::Closed => true,
            Phase::Open { tripped_at } if tripped_at.elapsed() >= self.cooldown => {
                inner.phase = Phase::Closed;
                inner.consecutive_failures = 0;
                log::info!("circuit breaker cooldown expired, resuming requests");
                true
            }
            Phase::Open { .. } => false,
        }
    }

    /// Reset the failure streak.
    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    /// Count a failure; trips the breaker at the threshold.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            if inner.phase == Phase::Closed {
                log::warn!(
                    "circuit breaker tripped after {} consecutive failures",
                    inner.consecutive_failures
                );
            }
            inner.phase = Phase::Open {
                tripped_at: Instant::now(),
            };
        }
    }

    /// Open immediately (403 / IP ban).
    pub fn trip(&self) {
        log::warn!("circuit breaker tripped: provider refused access");
        self.lock().phase = Phase::Open {
            tripped_at: Instant::now(),
        };
    }

    /// Time left until requests resume; zero when closed.
    pub fn remaining_cooldown(&self) -> Duration {
        match self.lock().phase {
            Phase::Closed => Duration::ZERO,
            Phase::Open { tripped_at } => self.cooldown.saturating_sub(tripped_at.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        assert!(cb.is_allowed());
        assert_eq!(cb.remaining_cooldown(), Duration::ZERO);
    }

    #[test]
    fn trips_after_threshold_failures() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_failure();
        assert!(!cb.is_allowed());
        assert!(cb.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn immediate_trip() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.trip();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn success_resets_counter() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.is_allowed());
    }

    #[test]
    fn expires_after_cooldown() {
        let cb = CircuitBreaker::new(Duration::from_millis(10));
        cb.trip();
        assert!(!cb.is_allowed());
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.is_allowed());
    }
}
