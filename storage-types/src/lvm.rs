//! LVM (Logical Volume Manager) types
//!
//! Summary of one physical volume as reported to clients.

use serde::{Deserialize, Serialize};

/// Physical volume report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvReport {
    /// Physical volume device path
    pub path: String,

    /// Whether the lvm tool is available at all
    pub supported: bool,

    /// Volume group the PV belongs to (empty if none)
    pub vg_name: String,

    /// Free space in bytes, if known
    pub free_bytes: Option<u64>,

    /// Whether any logical volume in the volume group is active
    pub has_active_lvs: bool,

    /// Whether the volume group is exported
    pub vg_exported: bool,

    /// Unused sectors computed from the free space
    pub sectors_unused: Option<u64>,

    /// Diagnostics for this PV
    pub messages: Vec<String>,
}

impl PvReport {
    /// Whether the PV has been added to a volume group
    pub fn in_volume_group(&self) -> bool {
        !self.vg_name.is_empty()
    }

    /// Whether it is unsafe to modify the PV
    pub fn is_busy(&self) -> bool {
        self.has_active_lvs || !self.messages.is_empty()
    }
}
