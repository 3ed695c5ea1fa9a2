//! In-memory implementations of every capability trait, for testing code that depends on them.
//!
//! Only available when the `test-util` feature is enabled.
//!
//! Each fake is fully controlled by the test: clocks only move when advanced, drives and images
//! contain exactly what was configured and a watcher only reports the changes the test simulates.
//! Cloning a fake yields a handle to the same state, so a test can keep one clone for steering
//! while the code under test owns another.
//!
//! # Designing testable code
//!
//! Accept the capability as a generic parameter instead of calling the operating system:
//!
//! ```
//! use std::time::Duration;
//!
//! use platform_seams::fake::FakeMonotonicClock;
//! use platform_seams::{MonotonicClock, Stopwatch, SystemStopwatch};
//!
//! fn is_slow<C: MonotonicClock>(stopwatch: &SystemStopwatch<C>) -> bool {
//!     stopwatch.elapsed() > Duration::from_secs(1)
//! }
//!
//! let clock = FakeMonotonicClock::new();
//! let stopwatch = SystemStopwatch::start_new_with_clock(clock.clone());
//! assert!(!is_slow(&stopwatch));
//!
//! clock.advance(Duration::from_secs(2));
//! assert!(is_slow(&stopwatch));
//! ```

mod clock;
mod environment;
mod image;
mod storage;
mod watcher;

pub use clock::*;
pub use environment::*;
pub use image::*;
pub use storage::*;
pub use watcher::*;
