//! Filesystem formatting operations trait.

use crate::HalResult;
use std::path::Path;

/// Trait for formatting block devices.
pub trait FormatOps {
    /// Format a partition with an ext4 filesystem carrying `label`.
    ///
    /// The underlying tool runs with its own prompts suppressed; `confirmed`
    /// must be true, signalling that the safety gate already authorized the
    /// destructive operation.
    fn format_ext4(&self, device: &Path, label: &str, confirmed: bool) -> HalResult<()>;
}
