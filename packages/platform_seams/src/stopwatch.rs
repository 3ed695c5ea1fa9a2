use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::{MonotonicClock, SystemMonotonicClock};

/// Number of [`Stopwatch::elapsed_ticks()`] units in one second.
pub const TICKS_PER_SECOND: u64 = 1_000_000_000;

/// Measures elapsed time.
///
/// A stopwatch accumulates time while running. Stopping it freezes the accumulated value,
/// starting it again continues accumulating from where it left off.
///
/// Starting a running stopwatch or stopping a stopped one has no effect.
#[cfg_attr(test, mockall::automock)]
pub trait Stopwatch: Debug + Send {
    /// Starts or resumes measuring elapsed time.
    fn start(&mut self);

    /// Stops measuring elapsed time, keeping the value accumulated so far.
    fn stop(&mut self);

    /// Stops measuring and sets the elapsed time to zero.
    fn reset(&mut self);

    /// Sets the elapsed time to zero and starts measuring.
    ///
    /// Equivalent to [`reset()`][Self::reset] followed immediately by [`start()`][Self::start].
    fn restart(&mut self);

    /// Whether the stopwatch is currently measuring.
    fn is_running(&self) -> bool;

    /// Total elapsed time measured so far, including the current running interval.
    fn elapsed(&self) -> Duration;

    /// Total elapsed time in whole milliseconds.
    fn elapsed_milliseconds(&self) -> u64;

    /// Total elapsed time in ticks. There are [`TICKS_PER_SECOND`] ticks in one second.
    fn elapsed_ticks(&self) -> u64;
}

/// Stopwatch that reads timestamps from a [`MonotonicClock`].
///
/// By default the operating system monotonic clock is used. Use
/// [`with_clock()`][Self::with_clock] to supply a different one.
///
/// # Example
///
/// ```rust
/// use platform_seams::{Stopwatch, SystemStopwatch};
///
/// let mut stopwatch = SystemStopwatch::start_new();
/// std::thread::sleep(std::time::Duration::from_millis(2));
/// stopwatch.stop();
///
/// assert!(!stopwatch.is_running());
/// assert!(stopwatch.elapsed_milliseconds() >= 2);
/// ```
#[derive(Debug)]
pub struct SystemStopwatch<C = SystemMonotonicClock>
where
    C: MonotonicClock,
{
    clock: C,

    /// When the current running interval started. `None` if stopped.
    running_since: Option<Instant>,

    /// Time accumulated by completed running intervals.
    accumulated: Duration,
}

impl SystemStopwatch<SystemMonotonicClock> {
    /// Creates a stopped stopwatch that reads the operating system monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemMonotonicClock::new())
    }

    /// Creates a stopwatch that reads the operating system monotonic clock and starts it.
    #[must_use]
    pub fn start_new() -> Self {
        Self::start_new_with_clock(SystemMonotonicClock::new())
    }
}

impl<C> SystemStopwatch<C>
where
    C: MonotonicClock,
{
    /// Creates a stopped stopwatch that reads timestamps from the provided clock.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            running_since: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Creates a stopwatch that reads timestamps from the provided clock and starts it.
    #[must_use]
    pub fn start_new_with_clock(clock: C) -> Self {
        let mut stopwatch = Self::with_clock(clock);
        stopwatch.start();
        stopwatch
    }

    /// The clock this stopwatch reads.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl Default for SystemStopwatch<SystemMonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Stopwatch for SystemStopwatch<C>
where
    C: MonotonicClock,
{
    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(self.clock.now());
        }
    }

    fn stop(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated = self
                .accumulated
                .saturating_add(self.clock.now().saturating_duration_since(since));
        }
    }

    fn reset(&mut self) {
        self.running_since = None;
        self.accumulated = Duration::ZERO;
    }

    fn restart(&mut self) {
        self.reset();
        self.start();
    }

    fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self
                .accumulated
                .saturating_add(self.clock.now().saturating_duration_since(since)),
            None => self.accumulated,
        }
    }

    fn elapsed_milliseconds(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn elapsed_ticks(&self) -> u64 {
        u64::try_from(self.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::fake::FakeMonotonicClock;

    assert_impl_all!(SystemStopwatch: Send, Sync);
    assert_impl_all!(SystemStopwatch<FakeMonotonicClock>: Send, Sync);

    fn fake_stopwatch() -> (SystemStopwatch<FakeMonotonicClock>, FakeMonotonicClock) {
        let clock = FakeMonotonicClock::new();
        (SystemStopwatch::with_clock(clock.clone()), clock)
    }

    #[test]
    fn new_is_stopped_at_zero() {
        let (stopwatch, clock) = fake_stopwatch();
        clock.advance(Duration::from_secs(3));

        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
        assert_eq!(stopwatch.elapsed_ticks(), 0);
    }

    #[test]
    fn accumulates_while_running() {
        let (mut stopwatch, clock) = fake_stopwatch();

        stopwatch.start();
        clock.advance(Duration::from_millis(250));

        assert!(stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::from_millis(250));
        assert_eq!(stopwatch.elapsed_milliseconds(), 250);
        assert_eq!(stopwatch.elapsed_ticks(), 250_000_000);
    }

    #[test]
    fn stop_freezes_elapsed() {
        let (mut stopwatch, clock) = fake_stopwatch();

        stopwatch.start();
        clock.advance(Duration::from_millis(100));
        stopwatch.stop();
        clock.advance(Duration::from_millis(900));

        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn start_resumes_from_accumulated() {
        let (mut stopwatch, clock) = fake_stopwatch();

        stopwatch.start();
        clock.advance(Duration::from_millis(100));
        stopwatch.stop();
        clock.advance(Duration::from_millis(50));
        stopwatch.start();
        clock.advance(Duration::from_millis(10));

        assert_eq!(stopwatch.elapsed(), Duration::from_millis(110));
    }

    #[test]
    fn start_while_running_is_no_op() {
        let (mut stopwatch, clock) = fake_stopwatch();

        stopwatch.start();
        clock.advance(Duration::from_millis(40));
        stopwatch.start();
        clock.advance(Duration::from_millis(2));

        assert_eq!(stopwatch.elapsed(), Duration::from_millis(42));
    }

    #[test]
    fn stop_while_stopped_is_no_op() {
        let (mut stopwatch, clock) = fake_stopwatch();

        stopwatch.stop();
        clock.advance(Duration::from_millis(40));
        stopwatch.stop();

        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn reset_stops_and_zeroes() {
        let (mut stopwatch, clock) = fake_stopwatch();

        stopwatch.start();
        clock.advance(Duration::from_millis(40));
        stopwatch.reset();
        clock.advance(Duration::from_millis(40));

        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn restart_equals_reset_then_start() {
        let (mut restarted, restarted_clock) = fake_stopwatch();
        let (mut manual, manual_clock) = fake_stopwatch();

        for (stopwatch, clock) in [
            (&mut restarted, &restarted_clock),
            (&mut manual, &manual_clock),
        ] {
            stopwatch.start();
            clock.advance(Duration::from_millis(500));
        }

        restarted.restart();
        manual.reset();
        manual.start();

        restarted_clock.advance(Duration::from_millis(7));
        manual_clock.advance(Duration::from_millis(7));

        assert!(restarted.is_running());
        assert_eq!(restarted.is_running(), manual.is_running());
        assert_eq!(restarted.elapsed(), manual.elapsed());
        assert_eq!(restarted.elapsed(), Duration::from_millis(7));
    }

    #[test]
    fn start_new_with_clock_is_running() {
        let clock = FakeMonotonicClock::new();
        let stopwatch = SystemStopwatch::start_new_with_clock(clock.clone());

        clock.advance(Duration::from_secs(1));

        assert!(stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn real_clock_elapsed_is_non_decreasing() {
        let stopwatch = SystemStopwatch::start_new();

        let mut previous = stopwatch.elapsed();
        for _ in 0..1000 {
            let current = stopwatch.elapsed();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn consumer_drives_mocked_stopwatch() {
        fn timed(stopwatch: &mut impl Stopwatch) -> u64 {
            stopwatch.restart();
            stopwatch.stop();
            stopwatch.elapsed_milliseconds()
        }

        let mut stopwatch = MockStopwatch::new();
        stopwatch.expect_restart().times(1).return_const(());
        stopwatch.expect_stop().times(1).return_const(());
        stopwatch.expect_elapsed_milliseconds().return_const(17_u64);

        assert_eq!(timed(&mut stopwatch), 17);
    }
}
