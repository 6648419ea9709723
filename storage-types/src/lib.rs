// SPDX-License-Identifier: GPL-3.0-only

//! Shared host data models for partview storage handlers
//!
//! These types describe what the partition editor knows about a partition
//! and what each filesystem handler can do with it:
//!
//! - **storage-sys**: fills [`PvReport`] and [`MountReport`] from system tooling
//! - **storage-fs**: filesystem handlers read and update [`Partition`],
//!   advertise an [`FsSupport`] and log into an [`OperationDetail`]

pub mod filesystem;
pub mod lvm;
pub mod mount;
pub mod operation;
pub mod partition;

// Re-export all public types
pub use filesystem::*;
pub use lvm::*;
pub use mount::*;
pub use operation::*;
pub use partition::*;
