//! Linux HAL implementation using real system calls.

use super::{CopyOps, FormatOps, MountOps, PartedOp, PartitionOps, ProbeOps, SystemOps};
use crate::{HalError, HalResult};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal;

impl LinuxHal {
    pub fn new() -> Self {
        Self
    }
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const FORMAT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const PARTED_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const PARTPROBE_TIMEOUT: Duration = Duration::from_secs(60);
const SYNC_TIMEOUT: Duration = Duration::from_secs(60);

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    log::debug!("exec: {:?}", cmd);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

fn status_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<()> {
    let output = output_with_timeout(program, cmd, timeout)?;
    if !output.status.success() {
        return Err(output_failed(program, &output));
    }
    Ok(())
}

fn map_nix_err(err: nix::errno::Errno) -> HalError {
    use nix::errno::Errno;
    match err {
        Errno::EBUSY => HalError::DeviceBusy,
        Errno::EACCES | Errno::EPERM => HalError::PermissionDenied,
        other => HalError::Nix(other),
    }
}

impl MountOps for LinuxHal {
    fn mount_device(&self, device: &Path, target: &Path, fstype: Option<&str>) -> HalResult<()> {
        let flags = nix::mount::MsFlags::empty();
        match nix::mount::mount(Some(device), target, fstype, flags, None::<&str>) {
            Ok(()) => Ok(()),
            // EBUSY here means the partition is already mounted at the target,
            // the same condition the historical tooling accepted as exit 32.
            Err(nix::errno::Errno::EBUSY) => {
                log::debug!("{} already mounted", device.display());
                Ok(())
            }
            Err(err) => Err(map_nix_err(err)),
        }
    }

    fn unmount(&self, target: &Path) -> HalResult<()> {
        nix::mount::umount2(target, nix::mount::MntFlags::empty()).map_err(map_nix_err)?;
        Ok(())
    }

    fn is_mounted(&self, path: &Path) -> HalResult<bool> {
        let content = fs::read_to_string("/proc/self/mountinfo")?;
        Ok(mountinfo_contains(&content, path))
    }
}

/// Mountinfo field 5 is the mount point.
fn mountinfo_contains(mountinfo: &str, path: &Path) -> bool {
    let wanted = path.to_string_lossy();
    mountinfo
        .lines()
        .filter_map(|line| line.split_whitespace().nth(4))
        .any(|mp| mp == wanted)
}

impl FormatOps for LinuxHal {
    fn format_ext4(&self, device: &Path, label: &str, confirmed: bool) -> HalResult<()> {
        if !confirmed {
            return Err(HalError::SafetyLock);
        }

        let cmdline = format!("mkfs.ext4 -L {} -F {}", label, device.display());
        let mut cmd = Command::new("mkfs.ext4");
        cmd.args(["-L", label, "-F"]).arg(device);
        let output = output_with_timeout(&cmdline, &mut cmd, FORMAT_TIMEOUT)?;

        if !output.status.success() {
            return Err(output_failed(&cmdline, &output));
        }

        Ok(())
    }
}

impl CopyOps for LinuxHal {
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

        let mut reader = fs::File::open(image)?;
        let mut out = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(target)?;

        let mut buffer = vec![0u8; block_size];
        let mut written = 0u64;
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            out.write_all(&buffer[..read])?;
            written += read as u64;
        }

        // Best-effort flush (block devices may ignore).
        out.sync_all().ok();

        Ok(written)
    }
}

impl PartitionOps for LinuxHal {
    fn parted(&self, disk: &Path, op: PartedOp, confirmed: bool) -> HalResult<String> {
        if !confirmed {
            return Err(HalError::SafetyLock);
        }

        let mut args: Vec<String> = vec!["-s".to_string(), disk.display().to_string()];
        match op {
            PartedOp::MkLabel { label } => {
                args.push("mklabel".to_string());
                args.push(label);
            }
            PartedOp::MkPart {
                part_type,
                fs_type,
                start,
                end,
            } => {
                args.push("-a".to_string());
                args.push("optimal".to_string());
                args.push("mkpart".to_string());
                args.push(part_type);
                args.push(fs_type);
                args.push(start);
                args.push(end);
            }
            PartedOp::Print => {
                args.push("print".to_string());
            }
        }

        let cmdline = format!("parted {}", args.join(" "));
        let mut cmd = Command::new("parted");
        cmd.args(&args);
        let output = output_with_timeout(&cmdline, &mut cmd, PARTED_TIMEOUT)?;
        if !output.status.success() {
            return Err(output_failed(&cmdline, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl ProbeOps for LinuxHal {
    fn blkid_label(&self, device: &Path) -> HalResult<String> {
        let mut cmd = Command::new("blkid");
        cmd.args(["-s", "LABEL", "-o", "value"]).arg(device);
        let output = output_with_timeout("blkid", &mut cmd, PROBE_TIMEOUT)?;

        // blkid exits 2 when the device exists but carries no label.
        if !output.status.success() {
            if output.status.code() == Some(2) {
                return Ok(String::new());
            }
            return Err(output_failed("blkid", &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn lsblk_table(&self, disk: &Path) -> HalResult<String> {
        let mut cmd = Command::new("lsblk");
        cmd.args(["-o", "NAME,SIZE,TYPE,FSTYPE,LABEL,MOUNTPOINTS"])
            .arg(disk);
        let output = output_with_timeout("lsblk", &mut cmd, PROBE_TIMEOUT)?;

        if !output.status.success() {
            return Err(output_failed("lsblk", &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl SystemOps for LinuxHal {
    fn partprobe(&self, disk: &Path) -> HalResult<()> {
        let cmdline = format!("partprobe {}", disk.display());
        let mut cmd = Command::new("partprobe");
        cmd.arg(disk);
        status_with_timeout(&cmdline, &mut cmd, PARTPROBE_TIMEOUT)
    }

    fn sync(&self) -> HalResult<()> {
        let mut cmd = Command::new("sync");
        status_with_timeout("sync", &mut cmd, SYNC_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn format_ext4_requires_authorization() {
        let hal = LinuxHal::new();
        let err = hal
            .format_ext4(Path::new("/dev/null"), "data", false)
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));
    }

    #[test]
    fn copy_image_requires_authorization() {
        let hal = LinuxHal::new();
        let err = hal
            .copy_image(Path::new("/tmp/none.img"), Path::new("/dev/null"), 4096, false)
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));
    }

    #[test]
    fn copy_image_writes_to_file_and_counts_bytes() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("test.img");
        let target = dir.path().join("target.img");

        fs::write(&image, b"system image content").unwrap();

        let hal = LinuxHal::new();
        let written = hal.copy_image(&image, &target, 8, true).unwrap();

        assert_eq!(written, 20);
        assert_eq!(fs::read(&target).unwrap(), b"system image content");
    }

    #[test]
    fn mountinfo_matches_exact_mount_point() {
        let info = "29 0 8:1 / / rw,relatime - ext4 /dev/root rw\n\
                    45 29 8:17 / /mnt/amufi rw,relatime - ext4 /dev/sdb1 rw\n";
        assert!(mountinfo_contains(info, Path::new("/mnt/amufi")));
        assert!(!mountinfo_contains(info, Path::new("/mnt/other")));
    }
}
