//! Static provisioning configuration, loaded once and immutable for the run.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Index of the system partition. Fixed: the bootable image always lands
/// first on the card.
pub const SYSTEM_PARTITION_INDEX: u32 = 1;

/// Index of the data partition in the two-region layout.
pub const DATA_PARTITION_INDEX: u32 = 2;

/// Data partition index on legacy fleet cards whose image already carries a
/// two-entry table; the data region is appended as a third partition.
pub const LEGACY_DATA_PARTITION_INDEX: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Expected raw size of the fleet's SD cards, in bytes. A mismatch is a
    /// strong sign the operator pointed the tool at the wrong device.
    pub expected_device_size: u64,

    /// Size of the system region, in MiB. The data region takes the rest.
    pub system_partition_mib: u64,

    /// Default image flashed onto the system region.
    pub image: PathBuf,

    /// Filesystem labels for the two regions.
    pub system_label: String,
    pub data_label: String,

    /// Scratch mount point used while stamping identity. Concurrent runs
    /// against different devices must not share this path.
    pub mountpoint: PathBuf,

    /// Identity artifacts, relative to the mounted system root.
    pub hostname_path: PathBuf,
    pub hosts_path: PathBuf,
    pub interfaces_path: PathBuf,

    /// Leading token of the hosts line rewritten with the new hostname.
    pub loopback_alias: String,

    /// Leading token of the interfaces line rewritten with the new address.
    pub address_directive: String,

    /// Hostname prefix when no agent type is given on the command line.
    pub hostname_prefix: String,

    /// Subnet prefix the fleet number is appended to verbatim.
    pub subnet_prefix: String,

    /// Index of the data partition (2, or 3 on legacy fleet cards).
    pub data_partition_index: u32,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            expected_device_size: 15_728_640_000,
            system_partition_mib: 4096,
            image: PathBuf::from("amufi.img"),
            system_label: "system".to_string(),
            data_label: "data".to_string(),
            mountpoint: PathBuf::from("/tmp/amufi-mnt"),
            hostname_path: PathBuf::from("etc/hostname"),
            hosts_path: PathBuf::from("etc/hosts"),
            interfaces_path: PathBuf::from("etc/network/interfaces"),
            loopback_alias: "127.0.1.1".to_string(),
            address_directive: "address".to_string(),
            hostname_prefix: "aMussel".to_string(),
            subnet_prefix: "10.0.200.".to_string(),
            data_partition_index: DATA_PARTITION_INDEX,
        }
    }
}

impl ProvisioningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.system_partition_mib == 0 {
            bail!("system_partition_mib must be non-zero");
        }
        if self.data_partition_index != DATA_PARTITION_INDEX
            && self.data_partition_index != LEGACY_DATA_PARTITION_INDEX
        {
            bail!(
                "data_partition_index must be {} or {} (got {})",
                DATA_PARTITION_INDEX,
                LEGACY_DATA_PARTITION_INDEX,
                self.data_partition_index
            );
        }
        Ok(())
    }
}

/// Load the config file, or fall back to the fleet's stock values when no
/// path is given.
pub fn load(path: Option<&Path>) -> Result<ProvisioningConfig> {
    let config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Unable to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Unable to parse config file {}", path.display()))?
        }
        None => ProvisioningConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
