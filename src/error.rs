use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before any job can run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("engine not found; searched: {}", display_paths(.searched))]
    EngineNotFound { searched: Vec<PathBuf> },

    #[error("invalid jar pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a single job failed. Never escalated past the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InputNotFound,
    TimeoutExceeded,
    ProcessError,
    SpawnFailed,
    Unexpected,
}
