use std::path::{Path, PathBuf};

bitflags::bitflags! {
    /// Which changes to a file or directory to be notified about.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub struct NotifyFilters: u32 {
        /// A file was created, deleted or renamed.
        const FILE_NAME = 1;

        /// A directory was created, deleted or renamed.
        const DIRECTORY_NAME = 2;

        /// Attributes of a file or directory changed.
        const ATTRIBUTES = 4;

        /// The size of a file changed.
        const SIZE = 8;

        /// The last write time of a file or directory changed.
        const LAST_WRITE = 16;

        /// The last access time of a file or directory changed.
        const LAST_ACCESS = 32;

        /// The creation time of a file or directory changed.
        const CREATION_TIME = 64;

        /// The security settings (permissions, ownership) of a file or directory changed.
        const SECURITY = 256;
    }
}

impl Default for NotifyFilters {
    fn default() -> Self {
        Self::FILE_NAME | Self::DIRECTORY_NAME | Self::LAST_WRITE
    }
}

bitflags::bitflags! {
    /// A set of change kinds, used to select which changes
    /// [`wait_for_changed()`][crate::FileSystemWatcher::wait_for_changed] waits for.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub struct WatcherChangeTypes: u32 {
        /// A file or directory was created.
        const CREATED = 1;

        /// A file or directory was deleted.
        const DELETED = 2;

        /// A file or directory was changed.
        const CHANGED = 4;

        /// A file or directory was renamed.
        const RENAMED = 8;

        /// Any change.
        const ALL = Self::CREATED.bits() | Self::DELETED.bits() | Self::CHANGED.bits() | Self::RENAMED.bits();
    }
}

/// The kind of a single observed change.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "mirroring the four change kinds of platform notification APIs"
)]
pub enum ChangeKind {
    /// A file or directory was created.
    Created,

    /// A file or directory was deleted.
    Deleted,

    /// The content or metadata of a file or directory changed.
    Changed,

    /// A file or directory was renamed.
    Renamed,
}

impl ChangeKind {
    /// The single-member [`WatcherChangeTypes`] set matching this kind.
    #[must_use]
    pub const fn as_change_types(self) -> WatcherChangeTypes {
        match self {
            Self::Created => WatcherChangeTypes::CREATED,
            Self::Deleted => WatcherChangeTypes::DELETED,
            Self::Changed => WatcherChangeTypes::CHANGED,
            Self::Renamed => WatcherChangeTypes::RENAMED,
        }
    }
}

/// Describes one change observed by a [`FileSystemWatcher`][crate::FileSystemWatcher].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeEvent {
    kind: ChangeKind,
    full_path: PathBuf,
    name: String,
    old: Option<(PathBuf, String)>,
}

impl ChangeEvent {
    pub(crate) fn new(kind: ChangeKind, full_path: PathBuf, name: String) -> Self {
        Self {
            kind,
            full_path,
            name,
            old: None,
        }
    }

    pub(crate) fn renamed(
        old_full_path: PathBuf,
        old_name: String,
        full_path: PathBuf,
        name: String,
    ) -> Self {
        Self {
            kind: ChangeKind::Renamed,
            full_path,
            name,
            old: Some((old_full_path, old_name)),
        }
    }

    /// What happened.
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Full path of the affected file or directory. For renames, the new path.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Path of the affected file or directory relative to the watched directory.
    /// For renames, the new name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// For renames, the full path before the rename.
    #[must_use]
    pub fn old_full_path(&self) -> Option<&Path> {
        self.old.as_ref().map(|(path, _)| path.as_path())
    }

    /// For renames, the name relative to the watched directory before the rename.
    #[must_use]
    pub fn old_name(&self) -> Option<&str> {
        self.old.as_ref().map(|(_, name)| name.as_str())
    }
}

/// How a [`wait_for_changed()`][crate::FileSystemWatcher::wait_for_changed] call ended.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a wait either observes a change or times out, nothing else"
)]
pub enum WaitOutcome {
    /// A matching change was observed.
    Changed(ChangeEvent),

    /// The timeout elapsed before any matching change was observed.
    TimedOut,
}

impl WaitOutcome {
    /// Whether the wait ended because the timeout elapsed.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Identifies an event handler registered with a [`FileSystemWatcher`][crate::FileSystemWatcher],
/// for later removal via [`unsubscribe()`][crate::FileSystemWatcher::unsubscribe].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubscriptionId(pub(crate) u64);
