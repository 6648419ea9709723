// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem handlers for the partview partition editor
//!
//! Each supported content type has a handler implementing [`FileSystem`].
//! Handlers report what they can do through [`FsSupport`] and fill usage
//! figures and messages into the host's [`Partition`].

pub mod error;
pub mod filesystem;
pub mod lvm2_pv;

pub use error::{FsError, Result};
pub use filesystem::{FileSystem, Registry};
pub use lvm2_pv::Lvm2Pv;

pub use storage_types::{FsSupport, FsType, OperationDetail, Partition, SupportKind};
