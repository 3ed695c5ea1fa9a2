use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::watcher::{EventHub, NameFilter, WatchConfig};
use crate::{
    ChangeEvent, ChangeHandler, ChangeKind, ErrorHandler, FileSystemWatcher, NotifyFilters,
    SubscriptionId, WaitOutcome, WatchError, WatcherChangeTypes,
};

/// A [`FileSystemWatcher`] that reports only the changes the test simulates.
///
/// Simulated changes go through the same delivery rules as real ones: nothing is delivered while
/// raising events is disabled, names must match the filter and changes below subdirectories are
/// only delivered when [`include_subdirectories()`][FileSystemWatcher::include_subdirectories]
/// is set. The notify filter is not applied, since a simulated change carries no information
/// about which attribute changed.
///
/// Handlers run on the thread that calls the `simulate_*` method.
///
/// Clones share the same state.
#[derive(Clone, Debug)]
pub struct FakeFileSystemWatcher {
    hub: Arc<EventHub>,
}

impl FakeFileSystemWatcher {
    /// Creates a disabled watcher for the directory at `path`, delivering changes to names
    /// matching the wildcard pattern `filter`.
    ///
    /// # Errors
    ///
    /// Fails if `filter` is not a valid wildcard pattern.
    pub fn new(path: impl Into<PathBuf>, filter: &str) -> Result<Self, WatchError> {
        Ok(Self {
            hub: Arc::new(EventHub::new(WatchConfig::new(path.into(), filter)?)),
        })
    }

    fn simulate(&self, kind: ChangeKind, name: &str) {
        let full_path = self.hub.config().path.join(name);

        self.hub
            .publish(&ChangeEvent::new(kind, full_path, name.to_owned()));
    }

    /// Simulates creation of `name`, relative to the watched directory.
    pub fn simulate_created(&self, name: &str) {
        self.simulate(ChangeKind::Created, name);
    }

    /// Simulates a change to `name`, relative to the watched directory.
    pub fn simulate_changed(&self, name: &str) {
        self.simulate(ChangeKind::Changed, name);
    }

    /// Simulates deletion of `name`, relative to the watched directory.
    pub fn simulate_deleted(&self, name: &str) {
        self.simulate(ChangeKind::Deleted, name);
    }

    /// Simulates renaming `old_name` to `new_name`, both relative to the watched directory.
    pub fn simulate_renamed(&self, old_name: &str, new_name: &str) {
        let (old_full_path, full_path) = {
            let config = self.hub.config();
            (config.path.join(old_name), config.path.join(new_name))
        };

        self.hub.publish(&ChangeEvent::renamed(
            old_full_path,
            old_name.to_owned(),
            full_path,
            new_name.to_owned(),
        ));
    }

    /// Simulates an error of the notification mechanism.
    ///
    /// Errors are delivered regardless of whether raising events is enabled.
    pub fn simulate_error(&self, message: &str) {
        self.hub
            .publish_error(&WatchError::Simulated(message.to_owned()));
    }
}

impl FileSystemWatcher for FakeFileSystemWatcher {
    fn path(&self) -> PathBuf {
        self.hub.config().path.clone()
    }

    fn set_path(&self, path: &Path) -> Result<(), WatchError> {
        self.hub.config().path = path.to_path_buf();
        Ok(())
    }

    fn filter(&self) -> String {
        self.hub.config().filter.pattern().to_owned()
    }

    fn set_filter(&self, filter: &str) -> Result<(), WatchError> {
        let filter = NameFilter::new(filter)?;
        self.hub.config().filter = filter;
        Ok(())
    }

    fn include_subdirectories(&self) -> bool {
        self.hub.config().include_subdirectories
    }

    fn set_include_subdirectories(&self, include: bool) -> Result<(), WatchError> {
        self.hub.config().include_subdirectories = include;
        Ok(())
    }

    fn internal_buffer_size(&self) -> u32 {
        self.hub.config().internal_buffer_size
    }

    fn set_internal_buffer_size(&self, size: u32) {
        self.hub.config().internal_buffer_size = size;
    }

    fn notify_filter(&self) -> NotifyFilters {
        self.hub.config().notify_filter
    }

    fn set_notify_filter(&self, filters: NotifyFilters) {
        self.hub.config().notify_filter = filters;
    }

    fn enable_raising_events(&self) -> bool {
        self.hub.is_enabled()
    }

    fn set_enable_raising_events(&self, enable: bool) -> Result<(), WatchError> {
        self.hub.set_enabled(enable);
        Ok(())
    }

    fn on_created(&self, handler: ChangeHandler) -> SubscriptionId {
        self.hub.subscribe(ChangeKind::Created, handler)
    }

    fn on_changed(&self, handler: ChangeHandler) -> SubscriptionId {
        self.hub.subscribe(ChangeKind::Changed, handler)
    }

    fn on_deleted(&self, handler: ChangeHandler) -> SubscriptionId {
        self.hub.subscribe(ChangeKind::Deleted, handler)
    }

    fn on_renamed(&self, handler: ChangeHandler) -> SubscriptionId {
        self.hub.subscribe(ChangeKind::Renamed, handler)
    }

    fn on_error(&self, handler: ErrorHandler) -> SubscriptionId {
        self.hub.subscribe_error(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    fn wait_for_changed(
        &self,
        change_types: WatcherChangeTypes,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome, WatchError> {
        self.hub.wait_for_changed(change_types, timeout, |enable| {
            self.hub.set_enabled(enable);
            Ok(())
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use static_assertions::assert_impl_all;
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(FakeFileSystemWatcher: Send, Sync, Clone);

    fn watcher() -> FakeFileSystemWatcher {
        FakeFileSystemWatcher::new("/w", "*").expect("valid filter")
    }

    fn record(watcher: &FakeFileSystemWatcher) -> Arc<Mutex<Vec<(ChangeKind, String)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subscriptions: [fn(&FakeFileSystemWatcher, ChangeHandler) -> SubscriptionId; 4] = [
            FakeFileSystemWatcher::on_created,
            FakeFileSystemWatcher::on_changed,
            FakeFileSystemWatcher::on_deleted,
            FakeFileSystemWatcher::on_renamed,
        ];

        for subscribe in subscriptions {
            let sink = Arc::clone(&seen);
            subscribe(
                watcher,
                Box::new(move |event: &ChangeEvent| {
                    sink.lock()
                        .expect("no panics while holding lock")
                        .push((event.kind(), event.name().to_owned()));
                }),
            );
        }

        seen
    }

    #[test]
    fn simulated_changes_reach_matching_handlers() {
        let watcher = watcher();
        let seen = record(&watcher);
        watcher
            .set_enable_raising_events(true)
            .expect("fake cannot fail");

        watcher.simulate_created("a");
        watcher.simulate_changed("a");
        watcher.simulate_renamed("a", "b");
        watcher.simulate_deleted("b");

        assert_eq!(
            *seen.lock().expect("no panics while holding lock"),
            vec![
                (ChangeKind::Created, "a".to_owned()),
                (ChangeKind::Changed, "a".to_owned()),
                (ChangeKind::Renamed, "b".to_owned()),
                (ChangeKind::Deleted, "b".to_owned()),
            ]
        );
    }

    #[test]
    fn disabled_watcher_delivers_nothing() {
        let watcher = watcher();
        let seen = record(&watcher);

        watcher.simulate_created("a");

        assert!(seen.lock().expect("no panics while holding lock").is_empty());
    }

    #[test]
    fn full_path_is_under_watched_directory() {
        let watcher = watcher();
        watcher
            .set_enable_raising_events(true)
            .expect("fake cannot fail");
        let paths = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&paths);
        watcher.on_renamed(Box::new(move |event| {
            sink.lock().expect("no panics while holding lock").push((
                event.old_full_path().map(Path::to_path_buf),
                event.full_path().to_path_buf(),
            ));
        }));

        watcher.simulate_renamed("old.txt", "new.txt");

        assert_eq!(
            *paths.lock().expect("no panics while holding lock"),
            vec![(
                Some(PathBuf::from("/w/old.txt")),
                PathBuf::from("/w/new.txt")
            )]
        );
    }

    #[test]
    fn simulated_error_reaches_error_handler() {
        let watcher = watcher();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        watcher.on_error(Box::new(move |error| {
            sink.lock()
                .expect("no panics while holding lock")
                .push(error.to_string());
        }));

        watcher.simulate_error("buffer overflow");

        assert_eq!(
            *seen.lock().expect("no panics while holding lock"),
            vec!["buffer overflow"]
        );
    }

    #[test]
    fn invalid_filter_is_rejected() {
        FakeFileSystemWatcher::new("/w", "[").expect_err("unclosed character class is invalid");
    }

    #[test]
    fn wait_enables_temporarily() {
        with_watchdog(|| {
            let watcher = watcher();
            let simulator = watcher.clone();

            let simulating = thread::spawn(move || {
                while !simulator.enable_raising_events() {
                    thread::yield_now();
                }

                simulator.simulate_deleted("gone");
            });

            let outcome = watcher
                .wait_for_changed(WatcherChangeTypes::DELETED, None)
                .expect("fake cannot fail");

            simulating.join().expect("simulator thread does not panic");

            let WaitOutcome::Changed(event) = outcome else {
                panic!("wait without timeout cannot time out");
            };
            assert_eq!(event.kind(), ChangeKind::Deleted);
            assert_eq!(event.name(), "gone");
            assert!(!watcher.enable_raising_events());
        });
    }

    #[test]
    fn wait_times_out_without_changes() {
        let watcher = watcher();

        let outcome = watcher
            .wait_for_changed(WatcherChangeTypes::ALL, Some(Duration::from_millis(5)))
            .expect("fake cannot fail");

        assert_eq!(outcome, WaitOutcome::TimedOut);
    }
}
