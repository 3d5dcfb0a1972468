//! Filesystem creation on the freshly partitioned regions.

use amufi_hal::{FormatOps, ProvisionerHal};
use log::info;
use std::path::Path;

use crate::config::ProvisioningConfig;
use crate::errors::FlashResult;
use crate::partition::PartitionLayout;

/// Create an ext4 filesystem with `label` on a single partition. The tool's
/// own prompts are suppressed; the safety gate has already authorized the
/// run.
pub fn format(hal: &dyn FormatOps, partition: &Path, label: &str) -> FlashResult<()> {
    info!("✨ Formatting {} to ext4 ('{}')", partition.display(), label);
    hal.format_ext4(partition, label, true)?;
    Ok(())
}

/// Format every partition the layout owns a filesystem for.
pub fn run(
    hal: &dyn ProvisionerHal,
    disk: &Path,
    layout: &PartitionLayout,
    config: &ProvisioningConfig,
) -> FlashResult<()> {
    if layout.formats_system() {
        format(hal, &layout.system_partition(disk), &config.system_label)?;
    }
    format(hal, &layout.data_partition(disk), &config.data_label)?;
    info!("Formatting done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amufi_hal::{FakeHal, Operation, PartitionNaming};
    use crate::config::LEGACY_DATA_PARTITION_INDEX;

    #[test]
    fn fresh_layout_formats_both_regions() {
        let hal = FakeHal::new();
        let config = ProvisioningConfig::default();
        let layout = PartitionLayout::from_config(&config, PartitionNaming::Auto);

        run(&hal, Path::new("/dev/sdz"), &layout, &config).unwrap();

        let formatted: Vec<(String, String)> = hal
            .operations()
            .iter()
            .filter_map(|op| match op {
                Operation::FormatExt4 { device, label } => {
                    Some((device.display().to_string(), label.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            formatted,
            vec![
                ("/dev/sdz1".to_string(), "system".to_string()),
                ("/dev/sdz2".to_string(), "data".to_string()),
            ]
        );
    }

    #[test]
    fn legacy_layout_formats_only_the_data_region() {
        let hal = FakeHal::new();
        let mut config = ProvisioningConfig::default();
        config.data_partition_index = LEGACY_DATA_PARTITION_INDEX;
        let layout = PartitionLayout::from_config(&config, PartitionNaming::Auto);

        run(&hal, Path::new("/dev/sdz"), &layout, &config).unwrap();

        let formatted: Vec<String> = hal
            .operations()
            .iter()
            .filter_map(|op| match op {
                Operation::FormatExt4 { device, .. } => Some(device.display().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(formatted, vec!["/dev/sdz3".to_string()]);
    }
}
