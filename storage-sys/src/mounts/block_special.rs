// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};

/// A device path together with its block device numbers.
///
/// Different names for the same block device (e.g. `/dev/mapper/vg-lv` and
/// `/dev/dm-3`) compare equal. Paths that are not block devices carry 0:0
/// and compare by name.
#[derive(Debug, Clone)]
pub struct BlockSpecial {
    pub name: String,
    pub major: u32,
    pub minor: u32,
}

/// Identity used to match [`BlockSpecial`] values
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum DeviceKey {
    Number(u32, u32),
    Name(String),
}

impl BlockSpecial {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (major, minor) = fs::metadata(&name)
            .ok()
            .filter(|meta| meta.file_type().is_block_device())
            .map(|meta| split_dev(meta.rdev()))
            .unwrap_or((0, 0));

        Self { name, major, minor }
    }

    pub fn with_numbers(name: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            name: name.into(),
            major,
            minor,
        }
    }

    pub(crate) fn key(&self) -> DeviceKey {
        if self.major == 0 && self.minor == 0 {
            DeviceKey::Name(self.name.clone())
        } else {
            DeviceKey::Number(self.major, self.minor)
        }
    }
}

impl PartialEq for BlockSpecial {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for BlockSpecial {}

// Same encoding as glibc's gnu_dev_major/gnu_dev_minor
fn split_dev(dev: u64) -> (u32, u32) {
    let major = ((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0x0000_0fff);
    let minor = ((dev >> 12) & 0xffff_ff00) | (dev & 0x0000_00ff);
    (major as u32, minor as u32)
}
