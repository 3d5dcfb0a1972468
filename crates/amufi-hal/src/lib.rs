//! Capability layer for amufi-flash.
//!
//! Every external tool the provisioner drives (parted, mkfs.ext4, partprobe,
//! blkid, mount/umount, the raw block copy) sits behind a trait here, with a
//! real Linux implementation and a recording fake for CI-safe tests.

pub mod error;
pub mod hal;
pub mod path;

pub use error::{HalError, HalResult};
pub use hal::fake_hal::{FakeHal, Operation};
pub use hal::guards::MountGuard;
pub use hal::linux_hal::LinuxHal;
pub use hal::{
    CopyOps, FormatOps, MountOps, PartedOp, PartitionOps, ProbeOps, ProvisionerHal, SystemOps,
};
pub use path::PartitionNaming;
