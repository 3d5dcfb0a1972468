//! Top-level provisioning pipeline.
//!
//! Step order is fixed: safety gate, partition, format, image copy, identity
//! stamp. Selected steps never reorder. The pipeline is fail-fast: the first
//! error aborts the run with no rollback.

use amufi_hal::{PartitionNaming, ProvisionerHal};
use log::info;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::ProvisioningConfig;
use crate::errors::{FlashError, FlashResult};
use crate::partition::PartitionLayout;
use crate::preflight::{self, GateOptions, SafetyVerdict};
use crate::{flash, format, identity, partition};

/// Run the selected steps against `cli.dev`. A `PassWithWarning` verdict is
/// resolved through `confirm`; declining aborts before any destructive call.
pub fn run(
    hal: &dyn ProvisionerHal,
    cli: &Cli,
    config: &ProvisioningConfig,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> FlashResult<()> {
    let naming = if cli.cardreader {
        PartitionNaming::Prefixed
    } else {
        PartitionNaming::Auto
    };
    let image: PathBuf = cli.image.clone().unwrap_or_else(|| config.image.clone());

    if cli.force {
        info!("--force, no safety checks!");
    }
    let opts = GateOptions {
        force: cli.force,
        copy_requested: cli.copy_image,
        image: &image,
        naming,
    };
    match preflight::evaluate(hal, &cli.dev, config, &opts)? {
        SafetyVerdict::Pass => {}
        SafetyVerdict::PassWithWarning(reason) => {
            log::warn!("{}", reason);
            if !confirm(&reason) {
                return Err(FlashError::ConfirmationDeclined);
            }
        }
        SafetyVerdict::Fail(reason) => return Err(FlashError::Validation(reason)),
    }

    let layout = PartitionLayout::from_config(config, naming);

    if cli.partition || cli.format || cli.copy_image {
        // One last look at what is about to be overwritten.
        if let Ok(table) = hal.lsblk_table(&cli.dev) {
            info!("Current layout of {}:\n{}", cli.dev.display(), table);
        }
    }

    if cli.partition {
        partition::apply(hal, &cli.dev, &layout)?;
    }

    if cli.format {
        format::run(hal, &cli.dev, &layout, config)?;
    }

    if cli.copy_image {
        flash::write(hal, &image, &layout.system_partition(&cli.dev))?;
        if let Err(err) = hal.sync() {
            log::warn!("sync after image copy failed: {}", err);
        }
    }

    if let Some(number) = &cli.number {
        let prefix = cli
            .agent
            .map(|kind| kind.hostname_prefix())
            .unwrap_or(config.hostname_prefix.as_str());
        let fleet = identity::FleetIdentity::new(prefix, &config.subnet_prefix, number);
        identity::stamp(hal, &layout.system_partition(&cli.dev), &fleet, config)?;
    }

    info!("Provisioning run complete.");
    Ok(())
}
