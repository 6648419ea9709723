// SPDX-License-Identifier: GPL-3.0-only

//! Logical volume management tooling

pub mod lvm_tools;

pub use lvm_tools::{Lvm2PvInfo, LOAD_FAILED_MESSAGE, PARTIAL_VG_MESSAGE};
