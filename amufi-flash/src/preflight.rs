//! Safety gate: go/no-go evaluation before any destructive step.
//!
//! The gate only produces a verdict; prompting the operator is the caller's
//! business. That split keeps the checks testable without a terminal.

use amufi_hal::{PartitionNaming, ProbeOps};
use std::path::Path;

use crate::config::ProvisioningConfig;
use crate::errors::FlashResult;
use crate::probe;

/// Outcome of the pre-flight checks.
///
/// `PassWithWarning` requires an explicit operator confirmation before the
/// run may continue; declining is equivalent to `Fail`. `Fail` aborts
/// unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Pass,
    PassWithWarning(String),
    Fail(String),
}

pub struct GateOptions<'a> {
    /// Operator override: skip every check without touching the device.
    pub force: bool,
    /// Whether an image copy is part of this run.
    pub copy_requested: bool,
    /// Resolved image path (command-line override or configured default).
    pub image: &'a Path,
    pub naming: PartitionNaming,
}

/// Run the checks in order. Hard failures return immediately; soft
/// mismatches accumulate so the operator confirms once with the full
/// picture.
pub fn evaluate(
    hal: &dyn ProbeOps,
    dev: &Path,
    config: &ProvisioningConfig,
    opts: &GateOptions<'_>,
) -> FlashResult<SafetyVerdict> {
    if opts.force {
        return Ok(SafetyVerdict::Pass);
    }

    if !probe::exists(dev) {
        return Ok(SafetyVerdict::Fail(format!(
            "device '{}' does not exist",
            dev.display()
        )));
    }

    if probe::looks_like_partition(dev) {
        return Ok(SafetyVerdict::Fail(format!(
            "'{}' looks like a partition, not a whole disk",
            dev.display()
        )));
    }

    let mut warnings = Vec::new();

    let labels = probe::existing_labels(hal, dev, opts.naming)?;
    let label_at = |index: u32| {
        labels
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, label)| label.as_str())
    };
    if label_at(1) == Some(config.system_label.as_str())
        && label_at(2) == Some(config.data_label.as_str())
    {
        warnings.push(format!(
            "device already looks provisioned (partitions labeled '{}'/'{}')",
            config.system_label, config.data_label
        ));
    }

    let expected_partitions = config.data_partition_index as usize;
    if labels.len() > expected_partitions {
        warnings.push(format!(
            "unexpected partition count: found {}, layout expects at most {}",
            labels.len(),
            expected_partitions
        ));
    }

    let size = probe::raw_size(dev)?;
    if size != config.expected_device_size {
        warnings.push(format!(
            "size mismatch: specified {} bytes, detected {} bytes",
            config.expected_device_size, size
        ));
    }

    if opts.copy_requested && !opts.image.exists() {
        return Ok(SafetyVerdict::Fail(format!(
            "image '{}' does not exist",
            opts.image.display()
        )));
    }

    if warnings.is_empty() {
        Ok(SafetyVerdict::Pass)
    } else {
        Ok(SafetyVerdict::PassWithWarning(warnings.join("; ")))
    }
}
