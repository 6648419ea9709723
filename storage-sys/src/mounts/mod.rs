// SPDX-License-Identifier: GPL-3.0-only

//! Cache of mounted devices and of mount points configured in fstab
//!
//! Maps each block device to its mount points, e.g.:
//!
//! ```text
//! /dev/sda1 -> ["/boot"]
//! /dev/sda2 -> [""]        (active swap)
//! /dev/sda3 -> ["/"]
//! ```

mod block_special;

pub use block_special::BlockSpecial;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use storage_types::MountReport;
use tracing::debug;

use crate::cmd::{CommandRunner, CommandSpec};
use block_special::DeviceKey;

const PROC_MOUNTS: &str = "/proc/mounts";
const PROC_SWAPS: &str = "/proc/swaps";
const FSTAB: &str = "/etc/fstab";

#[derive(Debug, Clone)]
struct MountEntry {
    name: String,
    mount_points: Vec<String>,
}

type MountMapping = BTreeMap<DeviceKey, MountEntry>;

/// Snapshot of mounted and configured file systems
#[derive(Debug, Clone, Default)]
pub struct MountInfo {
    mounted: MountMapping,
    fstab: MountMapping,
}

impl MountInfo {
    /// Read the host's mount tables.
    ///
    /// `runner` is only used when `/proc/mounts` does not name the root
    /// file system's real device.
    pub fn load(runner: &dyn CommandRunner) -> Self {
        Self::from_sources(
            &read_table(PROC_MOUNTS),
            &read_table(PROC_SWAPS),
            &read_table(FSTAB),
            runner,
        )
    }

    /// Build the cache from the text of `/proc/mounts`, `/proc/swaps` and
    /// `/etc/fstab`.
    pub fn from_sources(
        proc_mounts: &str,
        proc_swaps: &str,
        fstab: &str,
        runner: &dyn CommandRunner,
    ) -> Self {
        let mut info = Self::default();

        add_mntent_table(&mut info.mounted, proc_mounts);
        add_swaps(&mut info.mounted, proc_swaps);

        // Old distributions only list 'rootfs' and '/dev/root' for / in
        // /proc/mounts, which hides the device holding the root file system.
        if !have_rootfs_dev(&info.mounted) {
            debug!("No root device in {}, asking mount", PROC_MOUNTS);
            add_mount_command_output(&mut info.mounted, runner);
        }

        add_mntent_table(&mut info.fstab, fstab);

        for entry in info.mounted.values_mut() {
            entry.mount_points.sort();
            entry.mount_points.dedup();
        }

        debug!(
            "Mount cache: {} mounted devices, {} fstab devices",
            info.mounted.len(),
            info.fstab.len()
        );
        info
    }

    /// Whether the device path, such as /dev/sda3, is mounted
    pub fn is_dev_mounted(&self, path: &str) -> bool {
        self.is_block_mounted(&BlockSpecial::new(path))
    }

    pub fn is_block_mounted(&self, bs: &BlockSpecial) -> bool {
        self.mounted.contains_key(&bs.key())
    }

    pub fn all_mountpoints(&self) -> Vec<String> {
        self.mounted
            .values()
            .flat_map(|entry| entry.mount_points.iter().cloned())
            .collect()
    }

    pub fn mounted_mountpoints(&self, path: &str) -> &[String] {
        find(&self.mounted, path)
    }

    pub fn fstab_mountpoints(&self, path: &str) -> &[String] {
        find(&self.fstab, path)
    }

    pub fn report(&self, path: &str) -> MountReport {
        MountReport {
            device: path.to_string(),
            mounted: self.is_dev_mounted(path),
            mount_points: self.mounted_mountpoints(path).to_vec(),
            fstab_mount_points: self.fstab_mountpoints(path).to_vec(),
        }
    }
}

fn read_table(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| {
        debug!("Skipping {}: {}", path, err);
        String::new()
    })
}

fn find<'a>(map: &'a MountMapping, path: &str) -> &'a [String] {
    map.get(&BlockSpecial::new(path).key())
        .map(|entry| entry.mount_points.as_slice())
        .unwrap_or(&[])
}

fn add_node_and_mountpoint(map: &mut MountMapping, node: &str, mount_point: &str) {
    // Only add node path if mount point exists
    if !Path::new(mount_point).exists() {
        return;
    }
    push_mount_point(map, node, mount_point);
}

fn push_mount_point(map: &mut MountMapping, node: &str, mount_point: &str) {
    let bs = BlockSpecial::new(node);
    map.entry(bs.key())
        .or_insert_with(|| MountEntry {
            name: bs.name.clone(),
            mount_points: Vec::new(),
        })
        .mount_points
        .push(mount_point.to_string());
}

/// Parse an fstab(5) style table (also the format of /proc/mounts)
fn add_mntent_table(map: &mut MountMapping, table: &str) {
    for line in table.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(fsname), Some(dir)) = (fields.next(), fields.next()) else {
            continue;
        };

        let node = resolve_node(&unescape_mount_field(fsname));
        if let Some(node) = node {
            add_node_and_mountpoint(map, &node, &unescape_mount_field(dir));
        }
    }
}

/// Turn `UUID=...` and `LABEL=...` specifications into device paths
fn resolve_node(fsname: &str) -> Option<String> {
    let by_dir = if let Some(uuid) = fsname.strip_prefix("UUID=") {
        Some(("/dev/disk/by-uuid", uuid))
    } else {
        fsname
            .strip_prefix("LABEL=")
            .map(|label| ("/dev/disk/by-label", label))
    };

    match by_dir {
        Some((dir, value)) => canonical_device(&Path::new(dir).join(value)),
        None if fsname.is_empty() => None,
        None => Some(fsname.to_string()),
    }
}

fn canonical_device(link: &Path) -> Option<String> {
    fs::canonicalize(link)
        .ok()
        .map(|path| path.to_string_lossy().to_string())
}

fn add_swaps(map: &mut MountMapping, swaps: &str) {
    for line in swaps.lines() {
        if !line.starts_with('/') {
            continue;
        }
        if let Some(node) = line.split(' ').next() {
            // No mount point for swap
            push_mount_point(map, node, "");
        }
    }
}

/// True when some device other than 'rootfs' or '/dev/root' is mounted at /
fn have_rootfs_dev(map: &MountMapping) -> bool {
    map.values().any(|entry| {
        entry.mount_points.first().map(String::as_str) == Some("/")
            && entry.name != "rootfs"
            && entry.name != "/dev/root"
    })
}

fn add_mount_command_output(map: &mut MountMapping, runner: &dyn CommandRunner) {
    let spec = CommandSpec::new("mount", Vec::<String>::new());
    let output = match runner.run(&spec) {
        Ok(output) if output.success => output,
        Ok(output) => {
            debug!("mount exited with {:?}", output.code);
            return;
        }
        Err(err) => {
            debug!("mount failed: {}", err);
            return;
        }
    };

    for line in output.stdout.lines() {
        // Lines like "/dev/sda3 on / type ext4 (rw)"
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 4 && fields[1] == "on" {
            add_node_and_mountpoint(map, fields[0], fields[2]);
        }
    }
}

/// Decode the `\NNN` octal escapes used for spaces and tabs in mount tables
fn unescape_mount_field(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1].is_ascii_digit()
            && bytes[index + 2].is_ascii_digit()
            && bytes[index + 3].is_ascii_digit()
        {
            let octal = &value[index + 1..index + 4];
            if let Ok(num) = u8::from_str_radix(octal, 8) {
                output.push(num as char);
                index += 4;
                continue;
            }
        }

        let ch = value[index..].chars().next().unwrap_or_default();
        output.push(ch);
        index += ch.len_utf8();
    }

    output
}
