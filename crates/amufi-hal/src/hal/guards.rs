use crate::MountOps;
use std::path::{Path, PathBuf};

/// RAII guard that unmounts a scratch mount point when dropped.
///
/// The provisioning run owns the mount point exclusively for the duration of
/// the mount-stamp-unmount sequence; the guard releases it on every exit
/// path. An unmount failure is reported as a warning, never an error: the
/// file rewrites already committed are durable on media regardless of mount
/// state.
#[derive(Debug)]
pub struct MountGuard<'a, H: MountOps + ?Sized> {
    hal: &'a H,
    target: PathBuf,
    remove_dir: bool,
    active: bool,
}

impl<'a, H: MountOps + ?Sized> MountGuard<'a, H> {
    pub fn new(hal: &'a H, target: impl Into<PathBuf>, remove_dir: bool) -> Self {
        Self {
            hal,
            target: target.into(),
            remove_dir,
            active: true,
        }
    }

    /// Prevent automatic unmounting and return the target path.
    pub fn release(mut self) -> PathBuf {
        self.active = false;
        self.target.clone()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl<'a, H: MountOps + ?Sized> Drop for MountGuard<'a, H> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.hal.unmount(&self.target) {
            log::warn!(
                "mount guard failed to unmount {}: {}",
                self.target.display(),
                err
            );
            return;
        }
        if self.remove_dir {
            if let Err(err) = std::fs::remove_dir(&self.target) {
                log::warn!(
                    "mount guard failed to remove {}: {}",
                    self.target.display(),
                    err
                );
            }
        }
    }
}
