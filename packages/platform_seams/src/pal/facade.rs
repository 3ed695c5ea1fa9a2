use std::fmt::Debug;
use std::io;
use std::path::Path;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::MockBindings;
use crate::pal::{BuildTargetBindings, Bindings, MountedVolume, VolumeSpace};

/// Enum to hide the different storage bindings behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum BindingsFacade {
    Target(&'static BuildTargetBindings),

    #[cfg(test)]
    Mock(Arc<MockBindings>),
}

impl BindingsFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BuildTargetBindings)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockBindings) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Bindings for BindingsFacade {
    fn mounted_volumes(&self) -> Vec<MountedVolume> {
        match self {
            Self::Target(bindings) => bindings.mounted_volumes(),
            #[cfg(test)]
            Self::Mock(mock) => mock.mounted_volumes(),
        }
    }

    fn volume(&self, mount_point: &Path) -> Option<MountedVolume> {
        match self {
            Self::Target(bindings) => bindings.volume(mount_point),
            #[cfg(test)]
            Self::Mock(mock) => mock.volume(mount_point),
        }
    }

    fn volume_space(&self, mount_point: &Path) -> io::Result<VolumeSpace> {
        match self {
            Self::Target(bindings) => bindings.volume_space(mount_point),
            #[cfg(test)]
            Self::Mock(mock) => mock.volume_space(mount_point),
        }
    }
}

impl Debug for BindingsFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
