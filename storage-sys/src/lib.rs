// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for storage handlers
//!
//! This crate talks to the host directly rather than through a service:
//! - LVM2 physical volume queries via the `lvm` command
//! - Mounted and configured file systems from the kernel and fstab
//! - External command execution with optional timeouts
//!
//! LVM queries generally need root privileges to see every device.

pub mod cmd;
pub mod config;
pub mod error;
pub mod logical;
pub mod mounts;

pub use cmd::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use config::{Config, LoggingLevel, LvmConfig};
pub use error::{Result, SysError};
pub use logical::Lvm2PvInfo;
pub use mounts::{BlockSpecial, MountInfo};
