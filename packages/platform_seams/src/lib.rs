#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Code that talks to the operating system directly is hard to unit test: the clock keeps moving,
//! the set of mounted volumes differs between machines, file change notifications arrive on their
//! own schedule and environment variables are shared by every test in the process.
//!
//! This package puts a seam between your code and those facilities. Each facility is described by
//! a capability trait that mirrors what the platform offers, with a real implementation that
//! forwards every call to the operating system unchanged:
//!
//! | Capability | Trait | Real implementation |
//! |---|---|---|
//! | Wall-clock time | [`TimeProvider`] | [`SystemTimeProvider`] |
//! | Monotonic time | [`MonotonicClock`] | [`SystemMonotonicClock`] |
//! | Elapsed time measurement | [`Stopwatch`] | [`SystemStopwatch`] |
//! | Mounted storage volumes | [`DriveFactory`], [`Drive`], [`Directory`] | [`SystemDriveFactory`] |
//! | File change notifications | [`FileSystemWatcher`] | [`SystemFileSystemWatcher`] |
//! | Executable images | [`ExecutableImage`] | [`SystemImage`] |
//! | Process environment | [`Environment`] | [`SystemEnvironment`] |
//!
//! The real implementations add no behavior of their own. Errors are the errors of the platform,
//! returned unchanged. Where a platform operation yields another facility (the root directory of
//! a volume, an image loaded from another image), the result is itself wrapped, so callers only
//! ever handle types from this package.
//!
//! # Quick start
//!
//! Accept the capability as a generic parameter (or trait object) instead of calling the
//! operating system directly:
//!
//! ```rust
//! use platform_seams::{Stopwatch, SystemStopwatch};
//!
//! fn measure(stopwatch: &mut impl Stopwatch, work: impl FnOnce()) -> u64 {
//!     stopwatch.restart();
//!     work();
//!     stopwatch.stop();
//!     stopwatch.elapsed_milliseconds()
//! }
//!
//! let mut stopwatch = SystemStopwatch::new();
//! let millis = measure(&mut stopwatch, || std::thread::sleep(std::time::Duration::from_millis(5)));
//! assert!(millis >= 5);
//! ```
//!
//! # Testing with fakes
//!
//! With the `test-util` Cargo feature enabled, the [`fake`] module offers an in-memory
//! implementation of every capability trait. Production code receives the real implementation,
//! tests receive a fake they fully control.
//!
//! ```rust
//! # #[cfg(feature = "test-util")]
//! # {
//! use platform_seams::fake::FakeFileSystemWatcher;
//! use platform_seams::FileSystemWatcher;
//! use std::sync::{Arc, Mutex};
//!
//! let watcher = FakeFileSystemWatcher::new("/tmp/watched", "*.txt").unwrap();
//! watcher.set_enable_raising_events(true).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! watcher.on_created(Box::new(move |event| {
//!     sink.lock().unwrap().push(event.name().to_owned());
//! }));
//!
//! watcher.simulate_created("notes.txt");
//! watcher.simulate_created("image.png");
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["notes.txt".to_owned()]);
//! # }
//! ```
//!
//! # Logging
//!
//! Real implementations emit `tracing` events when they arm or disarm a file watch, enumerate
//! volumes or load an image. The package never installs a subscriber.

mod directory;
mod drive;
mod drive_factory;
mod environment;
mod executable_image;
mod monotonic_clock;
mod stopwatch;
mod time_provider;
mod watcher;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use directory::*;
pub use drive::*;
pub use drive_factory::*;
pub use environment::*;
pub use executable_image::*;
pub use monotonic_clock::*;
pub use stopwatch::*;
pub use time_provider::*;
pub use watcher::*;

mod pal;
