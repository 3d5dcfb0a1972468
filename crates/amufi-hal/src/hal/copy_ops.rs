//! Block-level image copy operations trait.

use crate::HalResult;
use std::path::Path;

/// Trait for copying a disk image onto a block device.
pub trait CopyOps {
    /// Copy `image` linearly onto `target`, starting at offset 0, moving
    /// `block_size` bytes per transfer. Returns the number of bytes written.
    ///
    /// No read-back verification is performed; callers wanting integrity
    /// checks layer a checksum comparison on top.
    fn copy_image(
        &self,
        image: &Path,
        target: &Path,
        block_size: usize,
        confirmed: bool,
    ) -> HalResult<u64>;
}
