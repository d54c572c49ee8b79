use crate::{config, util::normalize_ext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineArtifact {
    /// `audiveris.jar` run through a JVM.
    Jar { jar: PathBuf, home: PathBuf },
    /// Native launcher script/binary that wraps the JVM itself.
    Launcher { path: PathBuf },
}

impl EngineArtifact {
    pub fn path(&self) -> &Path {
        match self {
            EngineArtifact::Jar { jar, .. } => jar.as_path(),
            EngineArtifact::Launcher { path } => path.as_path(),
        }
    }

    pub fn working_dir(&self) -> Option<&Path> {
        match self {
            EngineArtifact::Jar { home, .. } if home.is_dir() => Some(home.as_path()),
            _ => None,
        }
    }
}

/// One conversion request. Built from config defaults, then frozen.
#[derive(Debug, Clone)]
pub struct Job {
    input: PathBuf,
    output_dir: PathBuf,
    export_formats: Vec<String>,
    timeout_seconds: u64,
    memory_hint: String,
}

impl Job {
    pub fn new(cfg: &config::Engine, input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            export_formats: normalize_formats(&cfg.export_formats),
            timeout_seconds: cfg.timeout_seconds,
            memory_hint: cfg.memory_hint.clone(),
        }
    }

    /// Replace the export formats. An empty list keeps the configured defaults.
    pub fn with_formats<S: AsRef<str>>(mut self, formats: &[S]) -> Self {
        let formats = normalize_formats(formats);
        if !formats.is_empty() {
            self.export_formats = formats;
        }
        self
    }

    pub fn with_timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export_formats(&self) -> &[String] {
        &self.export_formats
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// `None` when the timeout is disabled (0).
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn memory_hint(&self) -> &str {
        &self.memory_hint
    }

    pub fn stem(&self) -> String {
        crate::util::file_stem(&self.input)
    }
}

fn normalize_formats<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for f in raw {
        let f = normalize_ext(f.as_ref());
        if !f.is_empty() && !out.contains(&f) {
            out.push(f);
        }
    }
    out
}
