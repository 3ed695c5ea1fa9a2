use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, mpsc};
use std::time::Duration;

use tracing::warn;

use crate::watcher::NameFilter;
use crate::{
    ChangeEvent, ChangeHandler, ChangeKind, ErrorHandler, NotifyFilters, SubscriptionId,
    WaitOutcome, WatchError, WatcherChangeTypes,
};

/// Size reported for the internal buffer until changed.
pub(crate) const DEFAULT_INTERNAL_BUFFER_SIZE: u32 = 8192;

/// Watch configuration. Shared between the watcher and the thread delivering notifications.
#[derive(Clone, Debug)]
pub(crate) struct WatchConfig {
    pub(crate) path: PathBuf,

    /// The watched path in the form the platform reports it in, once a platform watch is armed.
    pub(crate) platform_path: Option<PathBuf>,
    pub(crate) filter: NameFilter,
    pub(crate) include_subdirectories: bool,
    pub(crate) internal_buffer_size: u32,
    pub(crate) notify_filter: NotifyFilters,
}

impl WatchConfig {
    pub(crate) fn new(path: PathBuf, filter: &str) -> Result<Self, WatchError> {
        Ok(Self {
            path,
            platform_path: None,
            filter: NameFilter::new(filter)?,
            include_subdirectories: false,
            internal_buffer_size: DEFAULT_INTERNAL_BUFFER_SIZE,
            notify_filter: NotifyFilters::default(),
        })
    }

    /// Whether an event passes the name filter and the subdirectory setting.
    pub(crate) fn admits(&self, event: &ChangeEvent) -> bool {
        let names_match = self.filter.matches(event.name())
            || event.old_name().is_some_and(|old| self.filter.matches(old));

        names_match && (self.include_subdirectories || !is_nested(event.name()))
    }

    /// Name of `full_path` relative to the watched path.
    pub(crate) fn relative_name(&self, full_path: &Path) -> String {
        self.platform_path
            .as_deref()
            .and_then(|root| full_path.strip_prefix(root).ok())
            .or_else(|| full_path.strip_prefix(&self.path).ok())
            .unwrap_or(full_path)
            .to_string_lossy()
            .into_owned()
    }
}

fn is_nested(name: &str) -> bool {
    Path::new(name)
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .nth(1)
        .is_some()
}

type SharedChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
type SharedErrorHandler = Arc<dyn Fn(&WatchError) + Send + Sync>;

struct Waiter {
    id: SubscriptionId,
    change_types: WatcherChangeTypes,
    sender: mpsc::Sender<ChangeEvent>,
}

#[derive(Default)]
struct Subscribers {
    changes: Vec<(SubscriptionId, ChangeKind, SharedChangeHandler)>,
    errors: Vec<(SubscriptionId, SharedErrorHandler)>,
    waiters: Vec<Waiter>,
}

/// Routes changes to subscribers and waiters, applying the enabled flag and the filters.
///
/// Handlers are invoked on the thread that publishes the change, with no internal lock held,
/// so a handler may subscribe or unsubscribe.
pub(crate) struct EventHub {
    config: Mutex<WatchConfig>,
    subscribers: Mutex<Subscribers>,
    enabled: AtomicBool,
    next_id: AtomicU64,
}

impl EventHub {
    pub(crate) fn new(config: WatchConfig) -> Self {
        Self {
            config: Mutex::new(config),
            subscribers: Mutex::new(Subscribers::default()),
            enabled: AtomicBool::new(false),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn config(&self) -> MutexGuard<'_, WatchConfig> {
        self.config
            .lock()
            .expect("watch configuration lock poisoned - cannot continue execution")
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned - cannot continue execution")
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sets the enabled flag, returning the previous value.
    pub(crate) fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn subscribe(&self, kind: ChangeKind, handler: ChangeHandler) -> SubscriptionId {
        let id = self.next_id();
        self.subscribers()
            .changes
            .push((id, kind, Arc::from(handler)));
        id
    }

    pub(crate) fn subscribe_error(&self, handler: ErrorHandler) -> SubscriptionId {
        let id = self.next_id();
        self.subscribers().errors.push((id, Arc::from(handler)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers();

        let before = subscribers
            .changes
            .len()
            .saturating_add(subscribers.errors.len());

        subscribers
            .changes
            .retain(|(candidate, _, _)| *candidate != id);
        subscribers.errors.retain(|(candidate, _)| *candidate != id);

        let after = subscribers
            .changes
            .len()
            .saturating_add(subscribers.errors.len());

        after < before
    }

    /// Delivers a change to waiters and subscribers, unless raising events is disabled or the
    /// change does not pass the configured filters.
    pub(crate) fn publish(&self, event: &ChangeEvent) {
        if !self.is_enabled() || !self.config().admits(event) {
            return;
        }

        let kind = event.kind();

        let handlers: Vec<SharedChangeHandler> = {
            let mut subscribers = self.subscribers();

            // Each waiter receives at most one change.
            subscribers.waiters.retain(|waiter| {
                if waiter.change_types.contains(kind.as_change_types()) {
                    drop(waiter.sender.send(event.clone()));
                    false
                } else {
                    true
                }
            });

            subscribers
                .changes
                .iter()
                .filter(|(_, handler_kind, _)| *handler_kind == kind)
                .map(|(_, _, handler)| Arc::clone(handler))
                .collect()
        };

        for handler in handlers {
            handler(event);
        }
    }

    pub(crate) fn publish_error(&self, error: &WatchError) {
        let handlers: Vec<SharedErrorHandler> = self
            .subscribers()
            .errors
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        if handlers.is_empty() {
            warn!(%error, "file system watcher error with no error subscriber");
            return;
        }

        for handler in handlers {
            handler(error);
        }
    }

    /// Blocks until a change matching `change_types` is published or the timeout elapses.
    ///
    /// If raising events is disabled, `set_enabled` is used to enable it for the duration of
    /// the wait and to disable it again afterwards.
    pub(crate) fn wait_for_changed(
        &self,
        change_types: WatcherChangeTypes,
        timeout: Option<Duration>,
        mut set_enabled: impl FnMut(bool) -> Result<(), WatchError>,
    ) -> Result<WaitOutcome, WatchError> {
        let (sender, receiver) = mpsc::channel();
        let id = self.next_id();

        self.subscribers().waiters.push(Waiter {
            id,
            change_types,
            sender,
        });

        let was_enabled = self.is_enabled();

        if !was_enabled {
            if let Err(error) = set_enabled(true) {
                self.remove_waiter(id);
                return Err(error);
            }
        }

        let received = match timeout {
            Some(timeout) => receiver.recv_timeout(timeout).ok(),
            None => receiver.recv().ok(),
        };

        self.remove_waiter(id);

        if !was_enabled {
            set_enabled(false)?;
        }

        Ok(received.map_or(WaitOutcome::TimedOut, WaitOutcome::Changed))
    }

    fn remove_waiter(&self, id: SubscriptionId) {
        self.subscribers().waiters.retain(|waiter| waiter.id != id);
    }
}

impl Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("config", &*self.config())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
