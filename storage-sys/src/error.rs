// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command failed: {command}; stderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SysError {
    /// Short description without the command line, for reports that
    /// already show the command
    pub fn detail(&self) -> String {
        match self {
            SysError::CommandFailed { stderr, .. } => stderr.clone(),
            SysError::Timeout { seconds, .. } => format!("timed out after {seconds}s"),
            SysError::Io(err) => err.to_string(),
            SysError::Config(message) => message.clone(),
        }
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
