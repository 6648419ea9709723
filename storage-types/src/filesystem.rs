//! Filesystem support descriptors
//!
//! Every filesystem handler reports which operations it can perform on a
//! partition and how each one is carried out.

use serde::{Deserialize, Serialize};

/// Filesystem or volume content type known to the partition editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsType {
    Unknown,
    Ext4,
    Xfs,
    Btrfs,
    Vfat,
    LinuxSwap,
    Luks,
    Lvm2Pv,
}

impl FsType {
    /// Display name as shown in partition listings
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Ext4 => "ext4",
            Self::Xfs => "xfs",
            Self::Btrfs => "btrfs",
            Self::Vfat => "fat32",
            Self::LinuxSwap => "linux-swap",
            Self::Luks => "luks",
            Self::Lvm2Pv => "lvm2 pv",
        }
    }
}

/// How a filesystem operation is carried out, if at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportKind {
    /// Operation not available
    #[default]
    None,

    /// Implemented inside the partition editor itself
    Internal,

    /// Implemented by the partition table library
    Library,

    /// Implemented by invoking an external command-line tool
    External,
}

impl SupportKind {
    pub fn is_supported(self) -> bool {
        self != Self::None
    }
}

/// Capabilities a filesystem handler offers for one filesystem type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSupport {
    /// Filesystem type described by this entry
    pub filesystem: FsType,

    /// Reading usage (used/unused sectors)
    pub read: SupportKind,

    pub read_label: SupportKind,
    pub write_label: SupportKind,
    pub read_uuid: SupportKind,
    pub write_uuid: SupportKind,

    /// Creating a new filesystem
    pub create: SupportKind,

    pub grow: SupportKind,
    pub shrink: SupportKind,

    /// Moving the partition start
    pub move_: SupportKind,

    pub copy: SupportKind,

    /// Checking and repairing
    pub check: SupportKind,
}

impl FsSupport {
    /// Support entry with every operation unavailable
    pub fn new(filesystem: FsType) -> Self {
        Self {
            filesystem,
            read: SupportKind::None,
            read_label: SupportKind::None,
            write_label: SupportKind::None,
            read_uuid: SupportKind::None,
            write_uuid: SupportKind::None,
            create: SupportKind::None,
            grow: SupportKind::None,
            shrink: SupportKind::None,
            move_: SupportKind::None,
            copy: SupportKind::None,
            check: SupportKind::None,
        }
    }

    /// True when the handler can modify the filesystem in any way
    pub fn is_writable(&self) -> bool {
        [
            self.write_label,
            self.write_uuid,
            self.create,
            self.grow,
            self.shrink,
            self.move_,
            self.copy,
            self.check,
        ]
        .into_iter()
        .any(SupportKind::is_supported)
    }
}
