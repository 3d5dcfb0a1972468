//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real hardware.

use super::{CopyOps, FormatOps, MountOps, PartedOp, PartitionOps, ProbeOps, SystemOps};
use crate::{HalError, HalResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Operation records for testing and verification.
#[derive(Debug, Clone)]
pub enum Operation {
    Mount {
        device: PathBuf,
        target: PathBuf,
        fstype: Option<String>,
    },
    Unmount {
        target: PathBuf,
    },
    FormatExt4 {
        device: PathBuf,
        label: String,
    },
    CopyImage {
        image: PathBuf,
        target: PathBuf,
        block_size: usize,
    },
    Parted {
        disk: PathBuf,
        op: String,
    },
    BlkidLabel {
        device: PathBuf,
    },
    LsblkTable {
        disk: PathBuf,
    },
    Partprobe {
        disk: PathBuf,
    },
    Sync,
}

impl Operation {
    /// True for operations that would change on-media state.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Operation::FormatExt4 { .. } | Operation::CopyImage { .. } | Operation::Parted { .. }
        )
    }
}

/// Shared state for FakeHal operations.
#[derive(Debug, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    mounted_paths: HashSet<PathBuf>,
    labels: HashMap<PathBuf, String>,
}

/// Fake HAL implementation that records operations without executing them.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHalState::default())),
        }
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Number of recorded operations that would change on-media state.
    pub fn destructive_operation_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| op.is_destructive())
            .count()
    }

    /// Configure the filesystem label `blkid_label` reports for a node.
    pub fn set_label(&self, device: impl Into<PathBuf>, label: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .labels
            .insert(device.into(), label.into());
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.operations.clear();
        state.mounted_paths.clear();
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }
}

impl MountOps for FakeHal {
    fn mount_device(&self, device: &Path, target: &Path, fstype: Option<&str>) -> HalResult<()> {
        log::info!(
            "FAKE HAL: mount {} -> {} (type: {:?})",
            device.display(),
            target.display(),
            fstype
        );

        self.record_operation(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
            fstype: fstype.map(String::from),
        });
        self.state
            .lock()
            .unwrap()
            .mounted_paths
            .insert(target.to_path_buf());

        Ok(())
    }

    fn unmount(&self, target: &Path) -> HalResult<()> {
        log::info!("FAKE HAL: unmount {}", target.display());

        self.record_operation(Operation::Unmount {
            target: target.to_path_buf(),
        });
        self.state.lock().unwrap().mounted_paths.remove(target);

        Ok(())
    }

    fn is_mounted(&self, path: &Path) -> HalResult<bool> {
        Ok(self.state.lock().unwrap().mounted_paths.contains(path))
    }
}

impl FormatOps for FakeHal {
    fn format_ext4(&self, device: &Path, label: &str, confirmed: bool) -> HalResult<()> {
        if !confirmed {
            return Err(HalError::SafetyLock);
        }

        log::info!("FAKE HAL: mkfs.ext4 -L {} {}", label, device.display());

        self.record_operation(Operation::FormatExt4 {
            device: device.to_path_buf(),
            label: label.to_string(),
        });

        Ok(())
    }
}

impl CopyOps for FakeHal {
    fn copy_image(
        &self,
        image: &Path,
        target: &Path,
        block_size: usize,
        confirmed: bool,
    ) -> HalResult<u64> {
        if !confirmed {
            return Err(HalError::SafetyLock);
        }

        log::info!(
            "FAKE HAL: copy {} -> {}",
            image.display(),
            target.display()
        );

        self.record_operation(Operation::CopyImage {
            image: image.to_path_buf(),
            target: target.to_path_buf(),
            block_size,
        });

        // Report the source length so callers see a plausible byte count.
        Ok(std::fs::metadata(image).map(|m| m.len()).unwrap_or(0))
    }
}

impl PartitionOps for FakeHal {
    fn parted(&self, disk: &Path, op: PartedOp, confirmed: bool) -> HalResult<String> {
        if !confirmed {
            return Err(HalError::SafetyLock);
        }
        self.record_operation(Operation::Parted {
            disk: disk.to_path_buf(),
            op: format!("{:?}", op),
        });
        Ok(String::new())
    }
}

impl ProbeOps for FakeHal {
    fn blkid_label(&self, device: &Path) -> HalResult<String> {
        self.record_operation(Operation::BlkidLabel {
            device: device.to_path_buf(),
        });
        let state = self.state.lock().unwrap();
        Ok(state.labels.get(device).cloned().unwrap_or_default())
    }

    fn lsblk_table(&self, disk: &Path) -> HalResult<String> {
        self.record_operation(Operation::LsblkTable {
            disk: disk.to_path_buf(),
        });
        Ok(String::new())
    }
}

impl SystemOps for FakeHal {
    fn partprobe(&self, disk: &Path) -> HalResult<()> {
        self.record_operation(Operation::Partprobe {
            disk: disk.to_path_buf(),
        });
        Ok(())
    }

    fn sync(&self) -> HalResult<()> {
        self.record_operation(Operation::Sync);
        Ok(())
    }
}
