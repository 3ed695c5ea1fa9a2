use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Directory, Drive, DriveFactory, DriveType};

/// A [`Directory`] that exists only as a path.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FakeDirectory {
    path: PathBuf,
    exists: bool,
}

impl FakeDirectory {
    /// Creates an existing directory at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exists: true,
        }
    }

    /// Sets whether [`exists()`][Directory::exists] reports the directory as present.
    #[must_use]
    pub fn with_exists(mut self, exists: bool) -> Self {
        self.exists = exists;
        self
    }
}

impl Directory for FakeDirectory {
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
        self.exists
    }

    fn parent(&self) -> Option<Self> {
        self.path.parent().map(Self::new)
    }

    fn root(&self) -> Self {
        Self::new(self.path.ancestors().last().unwrap_or(&self.path))
    }
}

#[derive(Debug)]
struct DriveState {
    name: String,
    format: String,
    drive_type: DriveType,
    ready: bool,
    total_size: u64,
    total_free_space: u64,
    available_free_space: u64,
    label: String,
}

/// A [`Drive`] whose properties are set by the test.
///
/// Clones share the same state, so a test can eject a drive (via
/// [`set_ready(false)`][Self::set_ready]) that the code under test already holds.
#[derive(Clone, Debug)]
pub struct FakeDrive {
    state: Arc<Mutex<DriveState>>,
}

impl FakeDrive {
    /// Creates a ready, fixed `ext4` drive with no capacity and an empty label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DriveState {
                name: name.into(),
                format: "ext4".to_owned(),
                drive_type: DriveType::Fixed,
                ready: true,
                total_size: 0,
                total_free_space: 0,
                available_free_space: 0,
                label: String::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, DriveState> {
        self.state
            .lock()
            .expect("fake drive lock poisoned - cannot continue execution")
    }

    /// Sets the file system type.
    #[must_use]
    pub fn with_format(self, format: impl Into<String>) -> Self {
        self.state().format = format.into();
        self
    }

    /// Sets the kind of storage.
    #[must_use]
    pub fn with_drive_type(self, drive_type: DriveType) -> Self {
        self.state().drive_type = drive_type;
        self
    }

    /// Sets the capacity figures, in bytes.
    #[must_use]
    pub fn with_space(
        self,
        total_size: u64,
        total_free_space: u64,
        available_free_space: u64,
    ) -> Self {
        {
            let mut state = self.state();
            state.total_size = total_size;
            state.total_free_space = total_free_space;
            state.available_free_space = available_free_space;
        }

        self
    }

    /// Sets the volume label.
    #[must_use]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.state().label = label.into();
        self
    }

    /// Sets whether the drive can be queried. Capacity and label queries on a drive that is not
    /// ready fail with [`io::ErrorKind::NotFound`].
    pub fn set_ready(&self, ready: bool) {
        self.state().ready = ready;
    }

    fn when_ready<T>(&self, read: impl FnOnce(&DriveState) -> T) -> io::Result<T> {
        let state = self.state();

        if state.ready {
            Ok(read(&state))
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("drive {} is not ready", state.name),
            ))
        }
    }
}

impl Drive for FakeDrive {
    type Directory = FakeDirectory;

    fn name(&self) -> String {
        self.state().name.clone()
    }

    fn drive_format(&self) -> String {
        self.state().format.clone()
    }

    fn drive_type(&self) -> DriveType {
        self.state().drive_type
    }

    fn is_ready(&self) -> bool {
        self.state().ready
    }

    fn total_size(&self) -> io::Result<u64> {
        self.when_ready(|state| state.total_size)
    }

    fn total_free_space(&self) -> io::Result<u64> {
        self.when_ready(|state| state.total_free_space)
    }

    fn available_free_space(&self) -> io::Result<u64> {
        self.when_ready(|state| state.available_free_space)
    }

    fn root_directory(&self) -> FakeDirectory {
        FakeDirectory::new(self.name())
    }

    fn volume_label(&self) -> io::Result<String> {
        self.when_ready(|state| state.label.clone())
    }

    fn set_volume_label(&self, label: &str) -> io::Result<()> {
        self.when_ready(|_| ())?;
        self.state().label = label.to_owned();
        Ok(())
    }
}

/// A [`DriveFactory`] that reports the drives the test mounted.
///
/// # Example
///
/// ```
/// use platform_seams::fake::{FakeDrive, FakeDriveFactory};
/// use platform_seams::{Drive, DriveFactory};
///
/// fn free_gigabytes(factory: &impl DriveFactory) -> u64 {
///     factory
///         .drives()
///         .iter()
///         .filter_map(|drive| drive.available_free_space().ok())
///         .sum::<u64>()
///         / 1_000_000_000
/// }
///
/// let factory = FakeDriveFactory::new();
/// factory.mount(FakeDrive::new("/").with_space(100_000_000_000, 7_000_000_000, 5_000_000_000));
/// factory.mount(FakeDrive::new("/mnt/usb").with_space(0, 0, 2_000_000_000));
///
/// assert_eq!(free_gigabytes(&factory), 7);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FakeDriveFactory {
    drives: Arc<Mutex<Vec<FakeDrive>>>,
}

impl FakeDriveFactory {
    /// Creates a factory with no drives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn mounted(&self) -> MutexGuard<'_, Vec<FakeDrive>> {
        self.drives
            .lock()
            .expect("fake drive list lock poisoned - cannot continue execution")
    }

    /// Adds a drive after the ones already mounted.
    pub fn mount(&self, drive: FakeDrive) {
        self.mounted().push(drive);
    }

    /// Removes every drive with this name. Returns `false` if there was none.
    pub fn unmount(&self, name: &str) -> bool {
        let mut drives = self.mounted();
        let before = drives.len();

        drives.retain(|drive| drive.name() != name);

        drives.len() < before
    }
}

impl DriveFactory for FakeDriveFactory {
    type Drive = FakeDrive;

    fn drives(&self) -> Vec<FakeDrive> {
        self.mounted().clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(FakeDirectory: Send, Sync, Clone);
    assert_impl_all!(FakeDrive: Send, Sync, Clone);
    assert_impl_all!(FakeDriveFactory: Send, Sync, Clone);

    #[test]
    fn drives_are_reported_in_mount_order() {
        let factory = FakeDriveFactory::new();
        factory.mount(FakeDrive::new("/"));
        factory.mount(FakeDrive::new("/boot").with_format("vfat"));
        factory.mount(FakeDrive::new("/mnt/nas").with_drive_type(DriveType::Network));

        let names: Vec<_> = factory.drives().iter().map(Drive::name).collect();

        assert_eq!(names, ["/", "/boot", "/mnt/nas"]);
    }

    #[test]
    fn unmount_removes_drive() {
        let factory = FakeDriveFactory::new();
        factory.mount(FakeDrive::new("/"));
        factory.mount(FakeDrive::new("/mnt/usb"));

        assert!(factory.unmount("/mnt/usb"));
        assert!(!factory.unmount("/mnt/usb"));
        assert_eq!(factory.drives().len(), 1);
    }

    #[test]
    fn ejected_drive_fails_queries() {
        let drive = FakeDrive::new("/mnt/usb")
            .with_drive_type(DriveType::Removable)
            .with_space(64, 32, 16);
        let held_by_code_under_test = drive.clone();

        assert_eq!(held_by_code_under_test.available_free_space().expect("ready"), 16);

        drive.set_ready(false);

        assert!(!held_by_code_under_test.is_ready());
        assert_eq!(
            held_by_code_under_test
                .total_size()
                .expect_err("not ready")
                .kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(held_by_code_under_test.drive_type(), DriveType::Removable);
    }

    #[test]
    fn label_can_be_changed() {
        let drive = FakeDrive::new("/").with_label("SYSTEM");

        drive.set_volume_label("BACKUP").expect("drive is ready");

        assert_eq!(drive.volume_label().expect("drive is ready"), "BACKUP");
    }

    #[test]
    fn root_directory_is_named_after_drive() {
        let drive = FakeDrive::new("/mnt/data");

        let root = drive.root_directory();

        assert_eq!(root.full_name(), Path::new("/mnt/data"));
        assert_eq!(root.name(), "data");
        assert!(root.exists());
    }

    #[test]
    fn directory_navigation() {
        let directory = FakeDirectory::new("/srv/app/logs").with_exists(false);

        assert!(!directory.exists());
        assert_eq!(
            directory.parent().expect("not a root").full_name(),
            Path::new("/srv/app")
        );
        assert_eq!(directory.root().full_name(), Path::new("/"));
    }
}
