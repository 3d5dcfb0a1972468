//! Device probing operations (blkid/lsblk).

use crate::HalResult;
use std::path::Path;

/// Probing operations trait. Side-effect free.
pub trait ProbeOps {
    /// Return the filesystem label for a partition node, or an empty string
    /// when the partition carries no label.
    fn blkid_label(&self, device: &Path) -> HalResult<String>;

    /// Return a human-readable lsblk table for diagnostics.
    fn lsblk_table(&self, disk: &Path) -> HalResult<String>;
}
