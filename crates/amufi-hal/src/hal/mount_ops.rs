//! Mount operations trait.

use crate::HalResult;
use std::path::Path;

/// Trait for mounting and unmounting filesystems.
pub trait MountOps {
    /// Mount a device to a target path.
    ///
    /// Mounting a device that is already mounted is treated as success: the
    /// stamping stage only needs the filesystem reachable at `target`.
    ///
    /// # Arguments
    /// * `device` - Partition device path (e.g., `/dev/sdb1`)
    /// * `target` - Mount point path
    /// * `fstype` - Optional filesystem type (e.g., `"ext4"`)
    fn mount_device(&self, device: &Path, target: &Path, fstype: Option<&str>) -> HalResult<()>;

    /// Unmount a filesystem.
    fn unmount(&self, target: &Path) -> HalResult<()>;

    /// Check if a path is currently mounted.
    fn is_mounted(&self, path: &Path) -> HalResult<bool>;
}
