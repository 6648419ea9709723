// SPDX-License-Identifier: GPL-3.0-only

//! External command execution
//!
//! Everything that shells out goes through a [`CommandRunner`], so callers
//! can be driven by canned output in tests.

use std::path::PathBuf;
use std::process::Output;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Result, SysError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Command line as a user would type it into a shell
    pub fn render(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            if needs_quoting(arg) {
                rendered.push('"');
                rendered.push_str(arg);
                rendered.push('"');
            } else {
                rendered.push_str(arg);
            }
        }
        rendered
    }
}

fn needs_quoting(arg: &str) -> bool {
    arg.is_empty()
        || !arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./,=:+@%".contains(c))
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl From<&Output> for CommandOutput {
    fn from(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Capability to locate and run external programs
pub trait CommandRunner: Send + Sync {
    /// Full path of `name` if it is found on the search path
    fn find_program(&self, name: &str) -> Option<PathBuf>;

    /// Run a command to completion, capturing its output.
    ///
    /// A non-zero exit status is reported through [`CommandOutput::success`],
    /// not as an error.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs real processes on the host
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn find_program(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running {}", spec.render());

        let expression = duct::cmd(spec.program.as_str(), spec.args.iter())
            .stdin_null()
            .stdout_capture()
            .stderr_capture()
            .unchecked();

        let Some(timeout) = self.timeout else {
            let output = expression.run()?;
            return Ok(CommandOutput::from(&output));
        };

        let handle = expression.start()?;
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(output) = handle.try_wait()? {
                return Ok(CommandOutput::from(output));
            }

            if Instant::now() >= deadline {
                warn!("{} did not finish within {:?}, killing it", spec.program, timeout);
                if let Err(err) = handle.kill() {
                    warn!("Failed to kill {}: {}", spec.program, err);
                }
                return Err(SysError::Timeout {
                    command: spec.render(),
                    seconds: timeout.as_secs(),
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}
