//! Wall-clock time access
//!
//! Every "now" the core reads — window eviction, action duration checks,
//! hourly counter resets — goes through a [`Clock`] rather than calling
//! `Utc::now()` directly, so tests can drive time deterministically.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock: the system's real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock with a value that only moves when told to.
///
/// # Example
/// ```
/// use chrono::Duration;
/// use payment_agent_core::clock::{Clock, FixedClock};
///
/// let mut clock = FixedClock::at_epoch();
/// let t0 = clock.now();
/// clock.advance(Duration::seconds(30));
/// assert!(clock.now() > t0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock { now }
    }

    pub fn at_epoch() -> Self {
        FixedClock {
            now: DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is representable"),
        }
    }

    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now += duration;
    }

    pub fn set(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
