use std::fmt::Debug;
use std::time::Instant;

/// A source of monotonically non-decreasing timestamps.
///
/// This is the timer that a [`SystemStopwatch`][crate::SystemStopwatch] reads. Supplying your own
/// implementation (for example [`FakeMonotonicClock`][crate::fake::FakeMonotonicClock] with the
/// `test-util` feature) lets tests decide exactly how much time passes.
pub trait MonotonicClock: Debug + Send + Sync {
    /// The current timestamp. Never earlier than any timestamp previously returned.
    fn now(&self) -> Instant;
}

/// Reads the operating system monotonic clock via [`Instant::now()`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemMonotonicClock;

impl SystemMonotonicClock {
    /// Creates a clock that reads the operating system monotonic clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MonotonicClock for SystemMonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn timestamps_do_not_go_backwards() {
        let clock = SystemMonotonicClock::new();

        let first = clock.now();
        let second = clock.now();

        assert!(second >= first);
    }
}
