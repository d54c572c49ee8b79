pub mod audiveris;
pub mod types;

use std::process::Command;

pub use audiveris::AudiverisEngine;
pub use types::{EngineArtifact, Job};

/// Builds the child-process invocations for one engine installation.
pub trait Engine {
    fn artifact(&self) -> &EngineArtifact;
    fn convert_command(&self, job: &Job) -> Command;
    fn help_command(&self) -> Command;
}
