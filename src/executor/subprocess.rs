//! Safe subprocess execution.
//!
//! Provides utilities for running the vendor client tools with:
//! - No shell interpretation (direct exec)
//! - Configurable timeouts
//! - Captured stdout/stderr
//! - Optional stdin redirected from a file
//! - Environment control

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CommandErrorKind, TestDbError};

use super::output::sanitize_output;

/// Maximum number of stderr lines carried into error messages.
const MAX_ERROR_LINES: usize = 10;

/// Result of a subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl SubprocessResult {
    /// Create a SubprocessResult from a std::process::Output.
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// A successful result with the given stdout.
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: exit_code == 0,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a non-zero exit into a `NonZeroExit` command error.
    pub fn check(self, program: &str) -> Result<Self, TestDbError> {
        if self.success {
            return Ok(self);
        }
        Err(TestDbError::Command {
            kind: CommandErrorKind::NonZeroExit {
                program: program.to_string(),
                exit_code: self.exit_code,
                stderr: sanitize_output(self.stderr.trim(), MAX_ERROR_LINES),
            },
        })
    }
}

/// Builder for subprocess execution.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    stdin_file: Option<PathBuf>,
    timeout: Duration,
    /// If true, arguments will not be logged (for commands containing secrets)
    sensitive: bool,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            stdin_file: None,
            timeout: Duration::from_secs(60),
            sensitive: false,
        }
    }

    /// Mark this command as containing sensitive data (e.g., passwords).
    /// When set, command arguments will not be logged.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Feed the contents of a file to the command's stdin.
    pub fn stdin_file(mut self, path: &Path) -> Self {
        self.stdin_file = Some(path.to_path_buf());
        self
    }

    /// Set the timeout for the command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute the command and wait for completion with timeout enforcement.
    ///
    /// If the process exceeds the configured timeout, it will be killed
    /// and a timeout error will be returned.
    pub fn run(self) -> Result<SubprocessResult, TestDbError> {
        if self.sensitive {
            debug!(
                program = %self.program,
                args = "[REDACTED]",
                timeout_secs = self.timeout.as_secs(),
                "Executing subprocess (sensitive)"
            );
        } else {
            debug!(
                program = %self.program,
                args = ?self.args,
                stdin = ?self.stdin_file,
                timeout_secs = self.timeout.as_secs(),
                "Executing subprocess"
            );
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        match &self.stdin_file {
            Some(path) => {
                let file = File::open(path).map_err(|e| TestDbError::Command {
                    kind: CommandErrorKind::ExecutionFailed {
                        message: format!("Failed to open '{}' for {}: {}", path.display(), self.program, e),
                    },
                })?;
                cmd.stdin(Stdio::from(file));
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| TestDbError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: format!("Failed to spawn {}: {}", self.program, e),
            },
        })?;

        // Drain both pipes while polling; a child blocks once a pipe buffer fills
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let start = Instant::now();
        let poll_interval = Duration::from_millis(50);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let output = Output {
                        status,
                        stdout: stdout_reader.join().unwrap_or_default(),
                        stderr: stderr_reader.join().unwrap_or_default(),
                    };
                    let result = SubprocessResult::from_output(output);
                    debug!(
                        program = %self.program,
                        success = result.success,
                        exit_code = ?result.exit_code,
                        duration_ms = start.elapsed().as_millis(),
                        "Subprocess completed"
                    );
                    return Ok(result);
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        warn!(
                            program = %self.program,
                            timeout_secs = self.timeout.as_secs(),
                            "Process timed out, killing"
                        );
                        if let Err(e) = child.kill() {
                            warn!(error = %e, "Failed to kill timed-out process");
                        }
                        // Reap the zombie process; the readers finish once the
                        // pipes close and are not waited for
                        let _ = child.wait();
                        return Err(TestDbError::Command {
                            kind: CommandErrorKind::Timeout {
                                timeout_secs: self.timeout.as_secs(),
                            },
                        });
                    }
                    thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(TestDbError::Command {
                        kind: CommandErrorKind::ExecutionFailed {
                            message: format!("Failed to check process status: {}", e),
                        },
                    });
                }
            }
        }
    }
}

/// Read a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                warn!(error = %e, "Failed to read subprocess output");
            }
        }
        buf
    })
}
