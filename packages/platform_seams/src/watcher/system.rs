use std::fmt::Debug;
use std::path::{Path, PathBuf, absolute};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::watcher::{EventHub, NameFilter, WatchConfig};
use crate::{
    ChangeEvent, ChangeHandler, ChangeKind, ErrorHandler, FileSystemWatcher, NotifyFilters,
    SubscriptionId, WaitOutcome, WatchError, WatcherChangeTypes,
};

/// Watches a directory using the change notification mechanism of the operating system
/// (inotify, FSEvents, `ReadDirectoryChangesW`, ...).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use platform_seams::{FileSystemWatcher, SystemFileSystemWatcher, WatcherChangeTypes};
///
/// let directory = std::env::temp_dir();
/// let watcher = SystemFileSystemWatcher::new(&directory, "*.log").unwrap();
///
/// let outcome = watcher
///     .wait_for_changed(WatcherChangeTypes::CREATED, Some(Duration::from_millis(10)))
///     .unwrap();
/// println!("{outcome:?}");
/// ```
pub struct SystemFileSystemWatcher {
    hub: Arc<EventHub>,

    /// The platform watch. `None` while raising events is disabled.
    armed: Mutex<Option<RecommendedWatcher>>,
}

impl SystemFileSystemWatcher {
    /// Creates a disabled watcher for the directory at `path`, delivering changes to names
    /// matching the wildcard pattern `filter`.
    ///
    /// # Errors
    ///
    /// Fails if `filter` is not a valid wildcard pattern.
    pub fn new(path: impl Into<PathBuf>, filter: &str) -> Result<Self, WatchError> {
        Ok(Self {
            hub: Arc::new(EventHub::new(WatchConfig::new(path.into(), filter)?)),
            armed: Mutex::new(None),
        })
    }

    fn armed(&self) -> MutexGuard<'_, Option<RecommendedWatcher>> {
        self.armed
            .lock()
            .expect("platform watch lock poisoned - cannot continue execution")
    }

    /// Establishes a platform watch for the current configuration.
    fn arm(&self) -> Result<RecommendedWatcher, WatchError> {
        let (path, recursive) = {
            let mut config = self.hub.config();
            config.platform_path = Some(platform_path(&config.path)?);
            (config.path.clone(), config.include_subdirectories)
        };

        let hub = Arc::clone(&self.hub);
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) => publish_platform_event(&hub, event),
                Err(error) => hub.publish_error(&WatchError::from(error)),
            })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        watcher.watch(&path, mode)?;

        debug!(path = %path.display(), recursive, "armed file system watch");

        Ok(watcher)
    }

    /// Replaces the platform watch after a configuration change, if raising events is enabled.
    fn rearm_if_enabled(&self) -> Result<(), WatchError> {
        // Checked under the lock so a concurrent disable cannot be undone by a stale re-arm.
        let mut armed = self.armed();

        if !self.hub.is_enabled() {
            return Ok(());
        }

        *armed = None;

        match self.arm() {
            Ok(watcher) => {
                *armed = Some(watcher);
                Ok(())
            }
            Err(error) => {
                self.hub.set_enabled(false);
                Err(error)
            }
        }
    }
}

/// The watched path as the platform reports it in notifications: absolute, and on macOS also
/// with symbolic links resolved (e.g. `/private/var` for `/var`).
fn platform_path(path: &Path) -> Result<PathBuf, WatchError> {
    let resolved = absolute(path).map_err(notify::Error::io)?;

    #[cfg(target_os = "macos")]
    let resolved = resolved.canonicalize().unwrap_or(resolved);

    Ok(resolved)
}

/// Translates a platform notification into changes, gated by the notify filter the way the
/// operating system gates them when it supports such filtering natively.
fn publish_platform_event(hub: &EventHub, event: Event) {
    let (notify_filter, changes) = {
        let config = hub.config();
        (config.notify_filter, translate(&config, event))
    };

    for (required, change) in changes {
        if notify_filter.intersects(required) {
            hub.publish(&change);
        }
    }
}

fn translate(config: &WatchConfig, event: Event) -> Vec<(NotifyFilters, ChangeEvent)> {
    let name_filters = NotifyFilters::FILE_NAME | NotifyFilters::DIRECTORY_NAME;

    let single = |kind: ChangeKind,
                  required: NotifyFilters,
                  paths: Vec<PathBuf>|
     -> Vec<(NotifyFilters, ChangeEvent)> {
        paths
            .into_iter()
            .map(|path| {
                let name = config.relative_name(&path);
                (required, ChangeEvent::new(kind, path, name))
            })
            .collect()
    };

    match event.kind {
        EventKind::Create(kind) => {
            let required = match kind {
                CreateKind::File => NotifyFilters::FILE_NAME,
                CreateKind::Folder => NotifyFilters::DIRECTORY_NAME,
                CreateKind::Any | CreateKind::Other => name_filters,
            };

            single(ChangeKind::Created, required, event.paths)
        }
        EventKind::Remove(kind) => {
            let required = match kind {
                RemoveKind::File => NotifyFilters::FILE_NAME,
                RemoveKind::Folder => NotifyFilters::DIRECTORY_NAME,
                RemoveKind::Any | RemoveKind::Other => name_filters,
            };

            single(ChangeKind::Deleted, required, event.paths)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();

            match (paths.next(), paths.next()) {
                (Some(from), Some(to)) => {
                    let old_name = config.relative_name(&from);
                    let name = config.relative_name(&to);

                    vec![(
                        name_filters,
                        ChangeEvent::renamed(from, old_name, to, name),
                    )]
                }
                _ => Vec::new(),
            }
        }
        // Halves of a rename are reported once paired, as `RenameMode::Both`.
        EventKind::Modify(ModifyKind::Name(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => single(
            ChangeKind::Changed,
            NotifyFilters::SIZE | NotifyFilters::LAST_WRITE,
            event.paths,
        ),
        EventKind::Modify(ModifyKind::Metadata(kind)) => {
            let required = match kind {
                MetadataKind::AccessTime => NotifyFilters::LAST_ACCESS,
                MetadataKind::WriteTime => NotifyFilters::LAST_WRITE,
                MetadataKind::Permissions | MetadataKind::Ownership => {
                    NotifyFilters::SECURITY | NotifyFilters::ATTRIBUTES
                }
                MetadataKind::Extended => NotifyFilters::ATTRIBUTES,
                MetadataKind::Any | MetadataKind::Other => {
                    NotifyFilters::ATTRIBUTES
                        | NotifyFilters::CREATION_TIME
                        | NotifyFilters::LAST_ACCESS
                        | NotifyFilters::LAST_WRITE
                        | NotifyFilters::SECURITY
                }
            };

            single(ChangeKind::Changed, required, event.paths)
        }
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

impl FileSystemWatcher for SystemFileSystemWatcher {
    fn path(&self) -> PathBuf {
        self.hub.config().path.clone()
    }

    fn set_path(&self, path: &Path) -> Result<(), WatchError> {
        self.hub.config().path = path.to_path_buf();
        self.rearm_if_enabled()
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
        self.rearm_if_enabled()
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
        let mut armed = self.armed();

        if enable {
            if armed.is_none() {
                *armed = Some(self.arm()?);
            }

            self.hub.set_enabled(true);
        } else {
            self.hub.set_enabled(false);

            if armed.take().is_some() {
                debug!(path = %self.hub.config().path.display(), "disarmed file system watch");
            }
        }

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
            self.set_enable_raising_events(enable)
        })
    }
}

impl Debug for SystemFileSystemWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemFileSystemWatcher")
            .field("hub", &self.hub)
            .field("armed", &self.armed().is_some())
            .finish()
    }
}
