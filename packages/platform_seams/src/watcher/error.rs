use thiserror::Error;

/// Errors reported by a [`FileSystemWatcher`][crate::FileSystemWatcher].
///
/// Each variant carries the error of the underlying platform component unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// The operating system notification mechanism reported an error.
    #[error(transparent)]
    Notify(#[from] notify::Error),

    /// The filter is not a valid wildcard pattern.
    #[error(transparent)]
    InvalidFilter(#[from] globset::Error),

    /// A simulated error raised through a fake watcher.
    #[error("{0}")]
    Simulated(String),
}
