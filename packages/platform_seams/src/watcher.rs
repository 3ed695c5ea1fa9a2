use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;
mod event;
mod hub;
mod name_filter;
mod system;

pub use error::*;
pub use event::*;
pub(crate) use hub::*;
pub(crate) use name_filter::*;
pub use system::*;

/// Receives changes observed by a [`FileSystemWatcher`].
pub type ChangeHandler = Box<dyn Fn(&ChangeEvent) + Send + Sync + 'static>;

/// Receives errors reported by a [`FileSystemWatcher`].
pub type ErrorHandler = Box<dyn Fn(&WatchError) + Send + Sync + 'static>;

/// Watches a directory for changes to the files and directories in it.
///
/// A watcher starts out disabled: configure it, subscribe to the changes of interest, then call
/// [`set_enable_raising_events(true)`][Self::set_enable_raising_events]. While disabled, no
/// changes are delivered.
///
/// Handlers are invoked on a thread owned by the notification mechanism, not on the thread that
/// subscribed. Handlers must not block for long, as that delays delivery of further changes.
///
/// Dropping the watcher releases the underlying notification handle.
pub trait FileSystemWatcher: Debug + Send + Sync {
    /// The watched directory.
    fn path(&self) -> PathBuf;

    /// Changes the watched directory. If raising events is enabled, the watch moves to the new
    /// directory immediately.
    ///
    /// # Errors
    ///
    /// Fails with the error of the notification mechanism if the new directory cannot be watched.
    /// Raising events is disabled in that case.
    fn set_path(&self, path: &Path) -> Result<(), WatchError>;

    /// The wildcard pattern that file names must match for changes to be delivered.
    fn filter(&self) -> String;

    /// Changes the wildcard pattern. `*` and `?` are supported; an empty pattern, `*` and `*.*`
    /// match every name.
    ///
    /// # Errors
    ///
    /// Fails if the pattern is not a valid wildcard pattern. The previous filter stays in effect.
    fn set_filter(&self, filter: &str) -> Result<(), WatchError>;

    /// Whether changes in subdirectories of the watched directory are delivered.
    fn include_subdirectories(&self) -> bool;

    /// Changes whether changes in subdirectories of the watched directory are delivered.
    ///
    /// # Errors
    ///
    /// Fails with the error of the notification mechanism if the watch cannot be re-established.
    /// Raising events is disabled in that case.
    fn set_include_subdirectories(&self, include: bool) -> Result<(), WatchError>;

    /// Requested size in bytes of the buffer that holds pending notifications.
    fn internal_buffer_size(&self) -> u32;

    /// Changes the requested size of the buffer that holds pending notifications.
    fn set_internal_buffer_size(&self, size: u32);

    /// Which changes are delivered.
    fn notify_filter(&self) -> NotifyFilters;

    /// Changes which changes are delivered.
    fn set_notify_filter(&self, filters: NotifyFilters);

    /// Whether changes are currently being delivered.
    fn enable_raising_events(&self) -> bool;

    /// Starts or stops delivering changes.
    ///
    /// # Errors
    ///
    /// Fails with the error of the notification mechanism if the watch cannot be established,
    /// for example because the watched directory does not exist.
    fn set_enable_raising_events(&self, enable: bool) -> Result<(), WatchError>;

    /// Subscribes to creation of files and directories.
    fn on_created(&self, handler: ChangeHandler) -> SubscriptionId;

    /// Subscribes to changes of the content or metadata of files and directories.
    fn on_changed(&self, handler: ChangeHandler) -> SubscriptionId;

    /// Subscribes to deletion of files and directories.
    fn on_deleted(&self, handler: ChangeHandler) -> SubscriptionId;

    /// Subscribes to renaming of files and directories.
    fn on_renamed(&self, handler: ChangeHandler) -> SubscriptionId;

    /// Subscribes to errors of the notification mechanism.
    ///
    /// Errors that arrive while there are no error subscribers are logged.
    fn on_error(&self, handler: ErrorHandler) -> SubscriptionId;

    /// Removes a handler. Returns `false` if no handler with this ID is registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Blocks the calling thread until a change matching `change_types` is observed or the
    /// timeout elapses. `None` waits without a time limit.
    ///
    /// If raising events is disabled, it is enabled for the duration of the wait and disabled
    /// again afterwards.
    ///
    /// # Errors
    ///
    /// Fails with the error of the notification mechanism if the watch cannot be established.
    fn wait_for_changed(
        &self,
        change_types: WatcherChangeTypes,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome, WatchError>;
}
