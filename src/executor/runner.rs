//! Process runner abstraction.
//!
//! Engines describe each client tool call as an [`Invocation`] and hand it
//! to a [`ProcessRunner`]. Production code uses [`SystemRunner`]; tests swap
//! in [`ScriptedRunner`] or their own implementation.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::TestDbError;

use super::subprocess::{SubprocessBuilder, SubprocessResult};

/// A single client tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin_file: Option<PathBuf>,
    pub sensitive: bool,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            stdin_file: None,
            sensitive: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }

    /// Arguments or environment carry a password; keep them out of the logs.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// The full command line, program first.
    pub fn command_line(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

/// Executes client tool invocations.
///
/// Implementations return `Ok` for any process that ran to completion,
/// whatever its exit code; callers decide what a non-zero exit means.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, TestDbError>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, TestDbError> {
        let mut builder = SubprocessBuilder::new(&invocation.program)
            .args(&invocation.args)
            .timeout(self.timeout);

        for (key, value) in &invocation.env {
            builder = builder.env(key, value);
        }
        if let Some(path) = &invocation.stdin_file {
            builder = builder.stdin_file(path);
        }
        if invocation.sensitive {
            builder = builder.sensitive();
        }

        builder.run()
    }
}

/// A runner that never spawns anything.
///
/// Every invocation is recorded. Results are replayed from per-program
/// queues in FIFO order; a program with an empty queue succeeds with empty
/// output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<SubprocessResult>>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next call of `program`.
    pub fn respond(&self, program: &str, result: SubprocessResult) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(program.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// All invocations seen so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Invocations of a single program.
    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.program == program)
            .collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, TestDbError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(invocation.clone());

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_mut(&invocation.program)
            .and_then(VecDeque::pop_front);

        Ok(next.unwrap_or_else(|| SubprocessResult::succeeded("")))
    }
}
