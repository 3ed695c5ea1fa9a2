use std::fmt::Debug;

use tracing::debug;

use crate::pal::{Bindings, BindingsFacade};
use crate::{Drive, SystemDrive};

/// Enumerates mounted storage volumes.
pub trait DriveFactory: Debug + Send + Sync {
    /// The drive type produced by [`drives()`][Self::drives].
    type Drive: Drive;

    /// Enumerates all currently mounted volumes.
    ///
    /// Every call asks the operating system afresh. Volumes are returned in the order the
    /// operating system reports them, without filtering.
    fn drives(&self) -> Vec<Self::Drive>;
}

/// Enumerates the volumes mounted in the real operating system.
///
/// # Example
///
/// ```rust
/// use platform_seams::{Drive, DriveFactory, SystemDriveFactory};
///
/// for drive in SystemDriveFactory::new().drives() {
///     println!("{} ({}, {:?})", drive.name(), drive.drive_format(), drive.drive_type());
/// }
/// ```
#[derive(Clone, Debug)]
pub struct SystemDriveFactory {
    bindings: BindingsFacade,
}

impl SystemDriveFactory {
    /// Creates a factory that enumerates the volumes of the real operating system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bindings: BindingsFacade::target(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_bindings(bindings: BindingsFacade) -> Self {
        Self { bindings }
    }
}

impl Default for SystemDriveFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveFactory for SystemDriveFactory {
    type Drive = SystemDrive;

    fn drives(&self) -> Vec<SystemDrive> {
        let volumes = self.bindings.mounted_volumes();

        debug!(count = volumes.len(), "enumerated mounted volumes");

        volumes
            .into_iter()
            .map(|volume| SystemDrive::new(volume.mount_point, self.bindings.clone()))
            .collect()
    }
}
