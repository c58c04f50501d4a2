//! Time source used for notification expiry and token checks.
//!
//! Stores never call [`Utc::now`] directly; they read an injected
//! [`Clock`] so tests can move time forward deterministically with
//! [`ManualClock`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current wall-clock time.
pub trait Clock: core::fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can hand one
/// clone to a store and advance another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    /// Shared current instant.
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[inline]
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `delta`.
    #[inline]
    pub fn advance(&self, delta: core::time::Duration) {
        let step = to_time_delta(delta);
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Jumps the clock to `instant`.
    #[inline]
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Converts a std duration into a chrono delta, saturating on overflow.
pub(crate) fn to_time_delta(duration: core::time::Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn manual_clock_starts_where_told() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(start());
        let handle = clock.clone();
        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), start() + TimeDelta::milliseconds(1500));
    }

    #[test]
    fn manual_clock_set_jumps() {
        let clock = ManualClock::new(start());
        let later = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn huge_durations_saturate() {
        assert_eq!(to_time_delta(Duration::MAX), TimeDelta::MAX);
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
