use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

use crate::pal::{Bindings, BindingsFacade};
use crate::{Directory, SystemDirectory};

/// The kind of storage behind a drive.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum DriveType {
    /// The kind of storage could not be determined.
    Unknown,

    /// No volume is mounted at the root directory of the drive (any more).
    NoRootDirectory,

    /// Removable storage such as a USB flash drive.
    Removable,

    /// Storage permanently attached to the machine.
    Fixed,

    /// Storage accessed over the network.
    Network,

    /// Optical media.
    CdRom,

    /// Storage backed by memory.
    Ram,
}

/// A mounted storage volume.
///
/// Every accessor queries the operating system again. Nothing is cached, so a drive that is
/// ejected between two calls reports that from the second call on.
pub trait Drive: Debug + Send + Sync {
    /// The directory type returned by [`root_directory()`][Self::root_directory].
    type Directory: Directory;

    /// The name of the drive, which is the path of its root directory.
    fn name(&self) -> String;

    /// The file system type, e.g. `ext4` or `NTFS`. Empty if the drive is no longer mounted.
    fn drive_format(&self) -> String;

    /// The kind of storage behind the drive. [`DriveType::NoRootDirectory`] if the drive is no
    /// longer mounted.
    fn drive_type(&self) -> DriveType;

    /// Whether the drive can currently be queried for its capacity.
    fn is_ready(&self) -> bool;

    /// Total capacity in bytes.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error if the drive is not ready.
    fn total_size(&self) -> io::Result<u64>;

    /// Free space in bytes, including space that only privileged users may use.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error if the drive is not ready.
    fn total_free_space(&self) -> io::Result<u64>;

    /// Free space in bytes that the current user may use.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error if the drive is not ready.
    fn available_free_space(&self) -> io::Result<u64>;

    /// The root directory of the drive.
    fn root_directory(&self) -> Self::Directory;

    /// The volume label.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error if the label cannot be read.
    fn volume_label(&self) -> io::Result<String>;

    /// Changes the volume label.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error if the label cannot be changed. Operating systems
    /// without a volume label API fail with [`io::ErrorKind::Unsupported`].
    fn set_volume_label(&self, label: &str) -> io::Result<()>;
}

/// A volume mounted in the real operating system.
///
/// Obtained from [`SystemDriveFactory`][crate::SystemDriveFactory]. Only the mount point is
/// kept; every other property is looked up again on each access.
#[derive(Debug)]
pub struct SystemDrive {
    mount_point: PathBuf,
    bindings: BindingsFacade,
}

impl SystemDrive {
    pub(crate) fn new(mount_point: PathBuf, bindings: BindingsFacade) -> Self {
        Self {
            mount_point,
            bindings,
        }
    }

    fn unmounted_error(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no volume is mounted at {}", self.mount_point.display()),
        )
    }
}

impl Drive for SystemDrive {
    type Directory = SystemDirectory;

    fn name(&self) -> String {
        self.mount_point.to_string_lossy().into_owned()
    }

    fn drive_format(&self) -> String {
        self.bindings
            .volume(&self.mount_point)
            .map(|volume| volume.file_system)
            .unwrap_or_default()
    }

    fn drive_type(&self) -> DriveType {
        self.bindings
            .volume(&self.mount_point)
            .map_or(DriveType::NoRootDirectory, |volume| volume.drive_type)
    }

    fn is_ready(&self) -> bool {
        self.bindings.volume_space(&self.mount_point).is_ok()
    }

    fn total_size(&self) -> io::Result<u64> {
        Ok(self.bindings.volume_space(&self.mount_point)?.total)
    }

    fn total_free_space(&self) -> io::Result<u64> {
        Ok(self.bindings.volume_space(&self.mount_point)?.free)
    }

    fn available_free_space(&self) -> io::Result<u64> {
        Ok(self.bindings.volume_space(&self.mount_point)?.available)
    }

    fn root_directory(&self) -> SystemDirectory {
        SystemDirectory::new(&self.mount_point)
    }

    fn volume_label(&self) -> io::Result<String> {
        self.bindings
            .volume(&self.mount_point)
            .map(|volume| volume.device_name)
            .ok_or_else(|| self.unmounted_error())
    }

    fn set_volume_label(&self, _label: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "the operating system offers no API for changing volume labels",
        ))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::path::Path;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::{MockBindings, MountedVolume, VolumeSpace};

    assert_impl_all!(SystemDrive: Send, Sync);

    fn data_volume() -> MountedVolume {
        MountedVolume {
            mount_point: PathBuf::from("/mnt/data"),
            device_name: "/dev/sdb1".to_owned(),
            file_system: "xfs".to_owned(),
            drive_type: DriveType::Fixed,
        }
    }

    fn drive_with(bindings: MockBindings) -> SystemDrive {
        SystemDrive::new(PathBuf::from("/mnt/data"), BindingsFacade::from_mock(bindings))
    }

    #[test]
    fn properties_are_queried_on_every_access() {
        let mut bindings = MockBindings::new();
        bindings
            .expect_volume()
            .withf(|mount_point| mount_point.as_os_str() == "/mnt/data")
            .times(3)
            .returning(|_| Some(data_volume()));

        let drive = drive_with(bindings);

        assert_eq!(drive.name(), "/mnt/data");
        assert_eq!(drive.drive_format(), "xfs");
        assert_eq!(drive.drive_type(), DriveType::Fixed);
        assert_eq!(drive.volume_label().expect("label is readable"), "/dev/sdb1");
    }

    #[test]
    fn properties_follow_remount() {
        let mut sequence = mockall::Sequence::new();
        let mut bindings = MockBindings::new();
        bindings
            .expect_volume()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Some(data_volume()));
        bindings
            .expect_volume()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| {
                Some(MountedVolume {
                    file_system: "ext4".to_owned(),
                    ..data_volume()
                })
            });

        let drive = drive_with(bindings);

        assert_eq!(drive.drive_format(), "xfs");
        assert_eq!(drive.drive_format(), "ext4");
    }

    #[test]
    fn unmounted_drive_has_no_root_directory() {
        let mut bindings = MockBindings::new();
        bindings.expect_volume().returning(|_| None);

        let drive = drive_with(bindings);

        assert_eq!(drive.drive_type(), DriveType::NoRootDirectory);
        assert_eq!(drive.drive_format(), "");
        assert_eq!(
            drive.volume_label().expect_err("nothing is mounted").kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn root_directory_wraps_mount_point() {
        let drive = drive_with(MockBindings::new());

        let root = drive.root_directory();

        assert_eq!(root.full_name(), Path::new("/mnt/data"));
        assert_eq!(root.full_name().to_string_lossy(), drive.name());
    }

    #[test]
    fn capacity_is_queried_on_every_access() {
        let mut bindings = MockBindings::new();
        bindings
            .expect_volume_space()
            .withf(|mount_point| mount_point.as_os_str() == "/mnt/data")
            .times(3)
            .returning(|_| {
                Ok(VolumeSpace {
                    total: 1000,
                    free: 400,
                    available: 300,
                })
            });

        let drive = drive_with(bindings);

        assert_eq!(drive.total_size().expect("drive is ready"), 1000);
        assert_eq!(drive.total_free_space().expect("drive is ready"), 400);
        assert_eq!(drive.available_free_space().expect("drive is ready"), 300);
    }

    #[test]
    fn platform_error_propagates_unchanged() {
        let mut bindings = MockBindings::new();
        bindings
            .expect_volume_space()
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let drive = drive_with(bindings);

        assert!(!drive.is_ready());
        assert_eq!(
            drive.total_size().expect_err("drive is not ready").kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn setting_label_is_unsupported() {
        let drive = drive_with(MockBindings::new());

        let error = drive.set_volume_label("BACKUP").expect_err("no label API");

        assert_eq!(error.kind(), io::ErrorKind::Unsupported);
    }
}
