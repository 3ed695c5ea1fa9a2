use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use crate::DriveType;

/// A volume as reported by the operating system volume enumeration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MountedVolume {
    /// Where the volume is mounted. This is also the name of the drive.
    pub(crate) mount_point: PathBuf,

    /// Device or label reported for the volume (e.g. `/dev/nvme0n1p2` on Linux).
    pub(crate) device_name: String,

    /// File system type (e.g. `ext4`, `NTFS`).
    pub(crate) file_system: String,

    pub(crate) drive_type: DriveType,
}

/// Capacity figures of a mounted volume, in bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct VolumeSpace {
    pub(crate) total: u64,

    /// Free space including space reserved for privileged users.
    pub(crate) free: u64,

    /// Free space usable by the current user.
    pub(crate) available: u64,
}

/// Bindings to the operating system storage APIs.
///
/// Every call goes to the operating system. Nothing is cached between calls.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    /// Enumerates the currently mounted volumes in the order reported by the operating system.
    fn mounted_volumes(&self) -> Vec<MountedVolume>;

    /// Looks up the volume currently mounted at `mount_point`, if any.
    fn volume(&self, mount_point: &Path) -> Option<MountedVolume>;

    /// Queries the capacity of the volume mounted at `mount_point`.
    ///
    /// Fails if the volume is not ready (e.g. ejected media or unreachable network share).
    fn volume_space(&self, mount_point: &Path) -> io::Result<VolumeSpace>;
}
