use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// A directory in the file system, identified by its path.
///
/// Nothing is cached: [`exists()`][Self::exists] asks the file system every time.
pub trait Directory: Debug + Send + Sync {
    /// The full path of the directory.
    fn full_name(&self) -> &Path;

    /// The last component of the path. For a root directory, this is the full path.
    fn name(&self) -> String;

    /// Whether a directory currently exists at this path.
    fn exists(&self) -> bool;

    /// The containing directory, or `None` for a root directory.
    fn parent(&self) -> Option<Self>
    where
        Self: Sized;

    /// The root directory of the path.
    fn root(&self) -> Self
    where
        Self: Sized;
}

/// A directory in the real file system.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SystemDirectory {
    path: PathBuf,
}

impl SystemDirectory {
    /// Creates a handle to the directory at `path`. The directory does not need to exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Directory for SystemDirectory {
    fn full_name(&self) -> &Path {
        &self.path
    }

    fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    fn exists(&self) -> bool {
        self.path.is_dir()
    }

    fn parent(&self) -> Option<Self> {
        self.path.parent().map(Self::new)
    }

    fn root(&self) -> Self {
        Self::new(self.path.ancestors().last().unwrap_or(&self.path))
    }
}
