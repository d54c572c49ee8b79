use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub locator: Locator,
    #[serde(default)]
    pub batch: Batch,
    #[serde(default)]
    pub inspect: Inspect,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Engine {
    /// Engine install dir. Empty means "probe the known locations".
    pub home: String,
    pub java_exe: String,
    pub memory_hint: String,
    pub fixed_flags: Vec<String>,
    pub export_formats: Vec<String>,
    pub timeout_seconds: u64,
}
impl Default for Engine {
    fn default() -> Self {
        Self {
            home: "".into(),
            java_exe: "java".into(),
            memory_hint: "-Xmx2g".into(),
            fixed_flags: vec!["-batch".into()],
            export_formats: vec!["xml".into(), "mid".into()],
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Locator {
    pub known_dirs: Vec<String>,
    pub jar_paths: Vec<String>,
    pub launcher_name: String,
    pub search_on_miss: bool,
    pub search_roots: Vec<String>,
    pub jar_pattern: String,
    pub search_timeout_seconds: u64,
    pub help_timeout_seconds: u64,
}
impl Default for Locator {
    fn default() -> Self {
        Self {
            known_dirs: vec![
                "/audiveris".into(),
                "/opt/audiveris".into(),
                "/usr/local/audiveris".into(),
                "/home/audiveris".into(),
                "/app/audiveris".into(),
            ],
            jar_paths: vec!["lib/audiveris.jar".into(), "audiveris.jar".into()],
            launcher_name: "audiveris".into(),
            search_on_miss: false,
            search_roots: vec!["/".into()],
            jar_pattern: "(?i)audiveris.*\\.jar$".into(),
            search_timeout_seconds: 30,
            help_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Batch {
    pub input_extension: String,
}
impl Default for Batch {
    fn default() -> Self {
        Self {
            input_extension: "pdf".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Inspect {
    pub candidate_extensions: Vec<String>,
    pub include_requested: bool,
}
impl Default for Inspect {
    fn default() -> Self {
        Self {
            candidate_extensions: vec!["xml".into(), "mid".into(), "pdf".into(), "omr".into()],
            include_requested: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub write_summary_json: bool,
    pub summary_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_summary_json: true,
            summary_filename: "summary.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
