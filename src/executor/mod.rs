//! Command executor module.
//!
//! Handles subprocess spawning for the vendor client tools and the
//! runner seam that lets tests replace them.

mod output;
mod runner;
mod subprocess;

pub use output::{output_lines, sanitize_output};
pub use runner::{Invocation, ProcessRunner, ScriptedRunner, SystemRunner};
pub use subprocess::{SubprocessBuilder, SubprocessResult};
