//! Two-region partition layout and the planner that applies it.

use amufi_hal::{path::partition_path, PartedOp, PartitionNaming, ProvisionerHal};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::{
    ProvisioningConfig, DATA_PARTITION_INDEX, LEGACY_DATA_PARTITION_INDEX, SYSTEM_PARTITION_INDEX,
};
use crate::errors::{FlashError, FlashResult};
use crate::probe;

/// First partition starts at 4 MiB for alignment on flash media.
const SYSTEM_START_MIB: u64 = 4;

/// Target partitioning scheme: system region of configured size at index 1,
/// data region covering the remainder. The data size is never stored; it is
/// re-derived from the live device every run.
#[derive(Debug, Clone)]
pub struct PartitionLayout {
    pub system_mib: u64,
    pub data_index: u32,
    pub naming: PartitionNaming,
}

impl PartitionLayout {
    pub fn from_config(config: &ProvisioningConfig, naming: PartitionNaming) -> Self {
        Self {
            system_mib: config.system_partition_mib,
            data_index: config.data_partition_index,
            naming,
        }
    }

    /// Data region size for a device of `device_bytes`: the remainder after
    /// the system region. Rejects devices that cannot hold the system region
    /// plus at least one byte of data.
    pub fn data_size_bytes(&self, device_bytes: u64) -> FlashResult<u64> {
        let system_bytes = self.system_mib * 1024 * 1024;
        if device_bytes <= system_bytes {
            return Err(FlashError::Validation(format!(
                "device too small: {} bytes cannot hold a {} MiB system region",
                device_bytes, self.system_mib
            )));
        }
        Ok(device_bytes - system_bytes)
    }

    pub fn system_partition(&self, disk: &Path) -> PathBuf {
        partition_path(disk, SYSTEM_PARTITION_INDEX, self.naming)
    }

    pub fn data_partition(&self, disk: &Path) -> PathBuf {
        partition_path(disk, self.data_index, self.naming)
    }

    /// Whether this layout owns the system region's filesystem. Legacy cards
    /// bring partitions 1..=2 with the image; only the appended data region
    /// gets formatted.
    pub fn formats_system(&self) -> bool {
        self.data_index == DATA_PARTITION_INDEX
    }

    fn system_end(&self) -> String {
        format!("{}MiB", SYSTEM_START_MIB + self.system_mib)
    }
}

/// Write the partition table, then make the kernel reread it before any later
/// stage opens the new partition nodes.
pub fn apply(hal: &dyn ProvisionerHal, disk: &Path, layout: &PartitionLayout) -> FlashResult<()> {
    let device_bytes = probe::raw_size(disk)?;
    let data_bytes = layout.data_size_bytes(device_bytes)?;
    info!(
        "🔪 Partitioning {}: {} MiB system region, {} bytes data region",
        disk.display(),
        layout.system_mib,
        data_bytes
    );

    if layout.data_index == LEGACY_DATA_PARTITION_INDEX {
        // Fleet-already-partitioned card: claim only the unused remainder,
        // leaving the image's own table entries alone.
        hal.parted(
            disk,
            PartedOp::MkPart {
                part_type: "primary".to_string(),
                fs_type: "ext4".to_string(),
                start: layout.system_end(),
                end: "100%".to_string(),
            },
            true,
        )?;
    } else {
        hal.parted(
            disk,
            PartedOp::MkLabel {
                label: "msdos".to_string(),
            },
            true,
        )?;
        hal.parted(
            disk,
            PartedOp::MkPart {
                part_type: "primary".to_string(),
                fs_type: "ext4".to_string(),
                start: format!("{}MiB", SYSTEM_START_MIB),
                end: layout.system_end(),
            },
            true,
        )?;
        hal.parted(
            disk,
            PartedOp::MkPart {
                part_type: "primary".to_string(),
                fs_type: "ext4".to_string(),
                start: layout.system_end(),
                end: "100%".to_string(),
            },
            true,
        )?;
    }

    if let Err(err) = hal.partprobe(disk) {
        // A failed refresh is survivable only if the kernel already exposes
        // the new partition nodes.
        let system = layout.system_partition(disk);
        let data = layout.data_partition(disk);
        if system.exists() && data.exists() {
            warn!(
                "partition table refresh failed ({}); partition nodes are present, continuing",
                err
            );
        } else {
            return Err(err.into());
        }
    }

    info!("Partitioning done.");
    Ok(())
}
