//! Kernel-facing system operations.

use crate::HalResult;
use std::path::Path;

pub trait SystemOps {
    /// Ask the running kernel to reread the partition table of `disk`.
    fn partprobe(&self, disk: &Path) -> HalResult<()>;

    /// Flush filesystem buffers.
    fn sync(&self) -> HalResult<()>;
}
