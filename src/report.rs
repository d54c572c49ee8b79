use crate::{error::FailureKind, inspect::GeneratedFile, util::now_rfc3339};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub succeeded: bool,
    pub exit_message: String,
    pub failure: Option<FailureKind>,
    pub exit_code: Option<i32>,
    pub elapsed_ms: u64,
    pub generated_files: BTreeMap<String, GeneratedFile>,
}

impl RunResult {
    pub fn success(stdout: String) -> Self {
        Self {
            succeeded: true,
            exit_message: stdout,
            failure: None,
            exit_code: Some(0),
            elapsed_ms: 0,
            generated_files: BTreeMap::new(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            exit_message: message.into(),
            failure: Some(kind),
            exit_code: None,
            elapsed_ms: 0,
            generated_files: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub file: String,
    #[serde(flatten)]
    pub result: RunResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    total: usize,
    successful: Vec<FileResult>,
    failed: Vec<FileResult>,
    pub started: String,
    pub finished: Option<String>,
}

impl Default for BatchSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchSummary {
    pub fn new() -> Self {
        Self {
            total: 0,
            successful: Vec::new(),
            failed: Vec::new(),
            started: now_rfc3339(),
            finished: None,
        }
    }

    /// Append one file's outcome. The only way entries get in, so
    /// `total == successful + failed` always holds.
    pub fn record(&mut self, file: impl Into<String>, result: RunResult) {
        let entry = FileResult {
            file: file.into(),
            result,
        };
        if entry.result.succeeded {
            self.successful.push(entry);
        } else {
            self.failed.push(entry);
        }
        self.total += 1;
    }

    pub fn finish(&mut self) {
        self.finished = Some(now_rfc3339());
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn successful(&self) -> &[FileResult] {
        &self.successful
    }

    pub fn failed(&self) -> &[FileResult] {
        &self.failed
    }
}
