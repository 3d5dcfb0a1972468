use std::path::{Path, PathBuf};

/// Naming convention for partition device nodes.
///
/// USB-attached readers expose `/dev/sdX1`; card-reader slots expose
/// `/dev/mmcblk0p1`. `Auto` guesses from the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionNaming {
    #[default]
    Auto,
    /// Append the index directly (`/dev/sdb` -> `/dev/sdb1`).
    Plain,
    /// Insert a `p` before the index (`/dev/mmcblk0` -> `/dev/mmcblk0p1`).
    Prefixed,
}

/// Partition path helper for block devices. Handles nvme/mmcblk postfixing.
pub fn partition_path(disk: &Path, num: u32, naming: PartitionNaming) -> PathBuf {
    let disk_str = disk.to_string_lossy();
    let prefixed = match naming {
        PartitionNaming::Plain => false,
        PartitionNaming::Prefixed => true,
        PartitionNaming::Auto => disk_str.contains("nvme") || disk_str.contains("mmcblk"),
    };
    if prefixed {
        PathBuf::from(format!("{}p{}", disk_str, num))
    } else {
        PathBuf::from(format!("{}{}", disk_str, num))
    }
}
