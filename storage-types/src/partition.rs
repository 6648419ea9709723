//! Partition information as seen by filesystem handlers
//!
//! Handlers only touch the usage figures and the message list; everything
//! else is filled in by the partition table reader.

use serde::{Deserialize, Serialize};

use crate::FsType;

/// Default logical sector size in bytes
pub const DEFAULT_SECTOR_SIZE: u64 = 512;

/// A partition (or whole-disk device) shown by the partition editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Device path (e.g., "/dev/sda1")
    pub path: String,

    /// Content type detected on the partition
    pub filesystem: FsType,

    /// Logical sector size in bytes
    pub sector_size: u64,

    /// Partition length in sectors
    pub length_sectors: u64,

    /// Sectors in use, once known
    pub sectors_used: Option<u64>,

    /// Sectors free, once known
    pub sectors_unused: Option<u64>,

    /// Filesystem label
    pub label: Option<String>,

    /// Filesystem UUID
    pub uuid: Option<String>,

    /// Warnings and errors to show alongside the partition
    pub messages: Vec<String>,
}

impl Partition {
    pub fn new(path: impl Into<String>, filesystem: FsType, sector_size: u64) -> Self {
        Self {
            path: path.into(),
            filesystem,
            sector_size,
            length_sectors: 0,
            sectors_used: None,
            sectors_unused: None,
            label: None,
            uuid: None,
            messages: Vec::new(),
        }
    }

    pub fn with_length(mut self, length_sectors: u64) -> Self {
        self.length_sectors = length_sectors;
        self
    }

    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Record the number of free sectors and derive the used count.
    ///
    /// The used count is only derived when the partition length is known.
    pub fn set_unused(&mut self, sectors_unused: u64) {
        self.sectors_unused = Some(sectors_unused);
        self.sectors_used = if self.length_sectors > 0 {
            Some(self.length_sectors.saturating_sub(sectors_unused))
        } else {
            None
        };
    }

    /// Whether usage figures have been read for this partition
    pub fn has_usage(&self) -> bool {
        self.sectors_unused.is_some()
    }
}
