//! Device probing. Read-only: nothing here mutates the device.

use amufi_hal::{path::partition_path, PartitionNaming, ProbeOps};
use std::fs;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use crate::errors::FlashResult;

/// True iff the device node is present.
pub fn exists(dev: &Path) -> bool {
    dev.exists()
}

/// Raw size of the device in bytes: open read-only, seek to the end.
///
/// stat() lies about block devices, a seek does not.
pub fn raw_size(dev: &Path) -> FlashResult<u64> {
    let mut file = fs::File::open(dev)?;
    let size = file.seek(SeekFrom::End(0))?;
    Ok(size)
}

/// Heuristic: a path ending in a digit names a partition (`/dev/sdb1`),
/// not a whole disk (`/dev/sdb`).
pub fn looks_like_partition(dev: &Path) -> bool {
    dev.to_string_lossy()
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Scan partition nodes upward from index 1 until one is missing and report
/// each node's filesystem label (empty string when unlabeled).
pub fn existing_labels(
    hal: &dyn ProbeOps,
    dev: &Path,
    naming: PartitionNaming,
) -> FlashResult<Vec<(u32, String)>> {
    let mut labels = Vec::new();
    for index in 1u32.. {
        let node = partition_path(dev, index, naming);
        if !node.exists() {
            break;
        }
        labels.push((index, hal.blkid_label(&node)?));
    }
    Ok(labels)
}
