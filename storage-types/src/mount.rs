//! Mount point listings

use serde::{Deserialize, Serialize};

/// Mount points of one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountReport {
    /// Device path
    pub device: String,

    /// Whether the device is currently mounted (or an active swap)
    pub mounted: bool,

    /// Current mount points (an empty string stands for swap)
    pub mount_points: Vec<String>,

    /// Mount points configured in fstab
    pub fstab_mount_points: Vec<String>,
}
