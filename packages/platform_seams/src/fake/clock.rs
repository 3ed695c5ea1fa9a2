use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};

use crate::{MonotonicClock, TimeProvider};

/// A [`TimeProvider`] that reports a time set by the test.
///
/// Clones share the same time.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, TimeDelta};
/// use platform_seams::TimeProvider;
/// use platform_seams::fake::FakeTimeProvider;
///
/// let time = FakeTimeProvider::new(
///     DateTime::parse_from_rfc3339("2024-12-31T23:30:00+02:00").unwrap(),
/// );
/// time.advance(TimeDelta::hours(1));
///
/// assert_eq!(time.today().to_string(), "2025-01-01");
/// assert_eq!(time.utc_now().to_rfc3339(), "2024-12-31T22:30:00+00:00");
/// ```
#[derive(Clone, Debug)]
pub struct FakeTimeProvider {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl FakeTimeProvider {
    /// Creates a provider that reports `now` until changed.
    #[must_use]
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    fn current(&self) -> MutexGuard<'_, DateTime<FixedOffset>> {
        self.now
            .lock()
            .expect("fake time lock poisoned - cannot continue execution")
    }

    /// Sets the reported time, in either direction.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.current() = now;
    }

    /// Moves the reported time by `delta`, which may be negative.
    ///
    /// # Panics
    ///
    /// Panics if the result is outside the range `chrono` can represent.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.current();

        *now = now
            .checked_add_signed(delta)
            .expect("fake time advanced beyond the representable range");
    }
}

impl TimeProvider for FakeTimeProvider {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.current()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.current().with_timezone(&Utc)
    }

    fn today(&self) -> NaiveDate {
        self.current().date_naive()
    }
}

/// A [`MonotonicClock`] that only moves when the test advances it.
///
/// Clones share the same time.
#[derive(Clone, Debug)]
pub struct FakeMonotonicClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl FakeMonotonicClock {
    /// Creates a clock frozen at an arbitrary starting point.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    fn offset(&self) -> MutexGuard<'_, Duration> {
        self.offset
            .lock()
            .expect("fake clock lock poisoned - cannot continue execution")
    }

    /// Moves the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the total offset overflows [`Duration`].
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset();

        *offset = offset
            .checked_add(by)
            .expect("fake clock advanced beyond the representable range");
    }

    /// Total time the clock has been advanced since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset()
    }
}

impl Default for FakeMonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for FakeMonotonicClock {
    fn now(&self) -> Instant {
        self.base
            .checked_add(*self.offset())
            .expect("fake clock advanced beyond the range of Instant")
    }
}
