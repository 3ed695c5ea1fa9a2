use std::fmt::Debug;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

/// Provides the current wall-clock time.
///
/// Wall-clock time can jump in either direction when the system clock is adjusted. For measuring
/// how long something takes, use a [`Stopwatch`][crate::Stopwatch] instead.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Debug + Send + Sync {
    /// The current local time, carrying the UTC offset in effect at that moment.
    fn now(&self) -> DateTime<FixedOffset>;

    /// The current time in UTC.
    fn utc_now(&self) -> DateTime<Utc>;

    /// The current date in the local time zone.
    fn today(&self) -> NaiveDate;
}

/// Reads the time from the host clock.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
    /// Creates a time provider that reads the host clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
