//! Per-unit identity stamping inside the freshly written system image.
//!
//! All rewrites go through the mounted filesystem, never the raw partition
//! bytes. The scratch mount point is owned exclusively by this run and is
//! released on every exit path.

use amufi_hal::{MountGuard, MountOps};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ProvisioningConfig;
use crate::errors::FlashResult;

/// Identity derived from the fleet-assigned agent number. The number is
/// opaque text substituted verbatim; "07" stays "07".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetIdentity {
    pub hostname: String,
    pub address: String,
}

impl FleetIdentity {
    pub fn new(hostname_prefix: &str, subnet_prefix: &str, number: &str) -> Self {
        Self {
            hostname: format!("{}{}", hostname_prefix, number),
            address: format!("{}{}", subnet_prefix, number),
        }
    }
}

/// Mount the system partition, rewrite the three identity artifacts, and
/// unmount. A mount failure is fatal; an unmount failure is only a warning,
/// since the rewrites are already durable on media.
pub fn stamp(
    hal: &dyn MountOps,
    system_partition: &Path,
    identity: &FleetIdentity,
    config: &ProvisioningConfig,
) -> FlashResult<()> {
    let mountpoint = &config.mountpoint;
    if !mountpoint.exists() {
        fs::create_dir_all(mountpoint)?;
    }

    hal.mount_device(system_partition, mountpoint, Some("ext4"))?;
    let _guard = MountGuard::new(hal, mountpoint.clone(), true);

    let hostname_file = mountpoint.join(&config.hostname_path);
    info!(
        "Setting hostname in {} to {}",
        hostname_file.display(),
        identity.hostname
    );
    fs::write(&hostname_file, format!("{}\n", identity.hostname))?;

    let hosts_file = mountpoint.join(&config.hosts_path);
    info!(
        "Setting hostname in {} to {}",
        hosts_file.display(),
        identity.hostname
    );
    replace_after_token(
        &hosts_file,
        &config.loopback_alias,
        &format!("{}   {}", config.loopback_alias, identity.hostname),
    )?;

    let interfaces_file = mountpoint.join(&config.interfaces_path);
    info!(
        "Setting address in {} to {}",
        interfaces_file.display(),
        identity.address
    );
    replace_after_token(
        &interfaces_file,
        &config.address_directive,
        &format!("{} {}", config.address_directive, identity.address),
    )?;

    info!("Numbering done.");
    Ok(())
}

/// Replace every line whose leading token is `token` with `new_line`,
/// leaving all other lines byte-identical. The pre-rewrite contents are kept
/// at `<path>.bak`. Re-running with the same identity changes nothing
/// further.
fn replace_after_token(path: &Path, token: &str, new_line: &str) -> FlashResult<()> {
    let original = fs::read_to_string(path)?;
    fs::write(backup_path(path), &original)?;

    let mut rewritten = original
        .lines()
        .map(|line| {
            if line.split_whitespace().next() == Some(token) {
                new_line
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if original.ends_with('\n') {
        rewritten.push('\n');
    }
    fs::write(path, rewritten)?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
