// SPDX-License-Identifier: GPL-3.0-only

use storage_sys::SysError;
use storage_types::FsType;
use thiserror::Error;

/// Error types for filesystem handler operations
#[derive(Error, Debug)]
pub enum FsError {
    #[error("no handler registered for {}", .0.as_str())]
    NoHandler(FsType),

    #[error(transparent)]
    Sys(#[from] SysError),
}

/// Result type alias for filesystem handler operations
pub type Result<T> = std::result::Result<T, FsError>;
