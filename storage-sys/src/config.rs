// SPDX-License-Identifier: GPL-3.0-only

//! Storage handler configuration, read from a TOML file

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SysError};

/// System-wide configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/partview/storage.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// How the `lvm` tool is located and invoked
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct LvmConfig {
    /// Executable probed on the search path and invoked
    pub program: String,

    /// Run `lvm vgscan` before listing physical volumes
    pub rescan: bool,

    /// Seconds before a hung lvm command is killed; 0 waits forever
    pub command_timeout_secs: u64,
}

impl Default for LvmConfig {
    fn default() -> Self {
        Self {
            program: "lvm".to_string(),
            rescan: true,
            command_timeout_secs: 60,
        }
    }
}

impl LvmConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: LoggingLevel,
    pub lvm: LvmConfig,
}

impl Config {
    /// Load configuration from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SysError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| SysError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lvm.program.trim().is_empty() {
            return Err(SysError::Config("lvm.program must not be empty".to_string()));
        }
        Ok(())
    }
}
