use std::fmt::Debug;
use std::io;
use std::path::Path;

use sysinfo::{Disk, Disks};

use crate::DriveType;
use crate::pal::{Bindings, MountedVolume, VolumeSpace};

/// The storage bindings for the real operating system that the build is targeting.
///
/// You would only use different bindings in unit tests that need to use mock bindings.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

// Real bindings are excluded from coverage measurement because the volumes present (and their
// types) depend entirely on the machine running the tests.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Bindings for BuildTargetBindings {
    fn mounted_volumes(&self) -> Vec<MountedVolume> {
        let disks = Disks::new_with_refreshed_list();

        disks.list().iter().map(mounted_volume).collect()
    }

    fn volume(&self, mount_point: &Path) -> Option<MountedVolume> {
        let disks = Disks::new_with_refreshed_list();

        disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == mount_point)
            .map(mounted_volume)
    }

    #[cfg(unix)]
    fn volume_space(&self, mount_point: &Path) -> io::Result<VolumeSpace> {
        use std::ffi::CString;
        use std::mem::MaybeUninit;
        use std::os::unix::ffi::OsStrExt;

        let path = CString::new(mount_point.as_os_str().as_bytes())?;
        let mut stats = MaybeUninit::<libc::statvfs>::uninit();

        // SAFETY: `path` is NUL-terminated and outlives the call, `stats` is valid for writes
        // of one `statvfs`. No other requirements exist.
        let result = unsafe { libc::statvfs(path.as_ptr(), stats.as_mut_ptr()) };

        if result != 0 {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: A successful `statvfs` call fills in the entire structure.
        let stats = unsafe { stats.assume_init() };

        #[allow(
            clippy::useless_conversion,
            reason = "field widths differ between Unix flavors"
        )]
        let (fragment_size, blocks, blocks_free, blocks_available) = (
            u64::from(stats.f_frsize),
            u64::from(stats.f_blocks),
            u64::from(stats.f_bfree),
            u64::from(stats.f_bavail),
        );

        Ok(VolumeSpace {
            total: blocks.saturating_mul(fragment_size),
            free: blocks_free.saturating_mul(fragment_size),
            available: blocks_available.saturating_mul(fragment_size),
        })
    }

    #[cfg(not(unix))]
    fn volume_space(&self, mount_point: &Path) -> io::Result<VolumeSpace> {
        let disks = Disks::new_with_refreshed_list();

        let disk = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == mount_point)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no volume is mounted at {}", mount_point.display()),
                )
            })?;

        // The platform reports only the space available to the current user.
        Ok(VolumeSpace {
            total: disk.total_space(),
            free: disk.available_space(),
            available: disk.available_space(),
        })
    }
}

fn mounted_volume(disk: &Disk) -> MountedVolume {
    let file_system = disk.file_system().to_string_lossy().into_owned();
    let drive_type = classify_drive_type(&file_system, disk.is_removable());

    MountedVolume {
        mount_point: disk.mount_point().to_path_buf(),
        device_name: disk.name().to_string_lossy().into_owned(),
        file_system,
        drive_type,
    }
}

/// Maps the file system type and removability reported by the operating system to the kind of
/// drive it represents.
fn classify_drive_type(file_system: &str, is_removable: bool) -> DriveType {
    match file_system.to_ascii_lowercase().as_str() {
        "nfs" | "nfs4" | "cifs" | "smbfs" | "smb3" | "sshfs" | "fuse.sshfs" | "afpfs" | "9p"
        | "webdav" | "davfs" => DriveType::Network,
        "iso9660" | "udf" | "cdfs" => DriveType::CdRom,
        "tmpfs" | "ramfs" => DriveType::Ram,
        "" => DriveType::Unknown,
        _ if is_removable => DriveType::Removable,
        _ => DriveType::Fixed,
    }
}
