//! Block-level image copy onto the system partition.

use amufi_hal::CopyOps;
use log::info;
use std::path::Path;

use crate::errors::FlashResult;

/// Transfer block size for the linear copy (the fleet's historical `bs=4M`).
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Copy `image` onto `partition`, starting at offset 0. Returns the number
/// of bytes written. The copy is not read back and verified; callers wanting
/// integrity checks add a checksum comparison as a post-step.
pub fn write(hal: &dyn CopyOps, image: &Path, partition: &Path) -> FlashResult<u64> {
    info!(
        "💾 Flashing {} with image {}",
        partition.display(),
        image.display()
    );
    let written = hal.copy_image(image, partition, BLOCK_SIZE, true)?;
    info!("Flashing done ({} bytes written).", written);
    Ok(written)
}
