//! Finding the engine on disk.
//!
//! Absence of any single location is expected and only reported; the caller
//! gets [`SetupError::EngineNotFound`] once every candidate has been tried.

use crate::{config::Config, engine::EngineArtifact, error::SetupError, util::expand_tilde};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const HOME_ENV: &str = "AUDIVERIS_HOME";

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub exists: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReport {
    pub matches: Vec<PathBuf>,
    pub timed_out: bool,
    /// Entries that could not be read (permissions, vanished files).
    pub skipped: usize,
}

/// Install directories in probe order: configured home, `AUDIVERIS_HOME`,
/// then the known locations.
pub fn candidate_dirs(cfg: &Config) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if !cfg.engine.home.trim().is_empty() {
        dirs.push(expand_tilde(cfg.engine.home.trim()));
    }
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.trim().is_empty() {
            dirs.push(expand_tilde(home.trim()));
        }
    }
    dirs.extend(cfg.locator.known_dirs.iter().map(|d| expand_tilde(d)));

    let mut seen = Vec::with_capacity(dirs.len());
    for d in dirs {
        if !seen.contains(&d) {
            seen.push(d);
        }
    }
    seen
}

/// Every `(home, jar)` pair the locator will test, in order.
pub fn candidate_jars(cfg: &Config) -> Vec<(PathBuf, PathBuf)> {
    candidate_dirs(cfg)
        .into_iter()
        .flat_map(|home| {
            cfg.locator
                .jar_paths
                .iter()
                .map(|rel| (home.clone(), home.join(rel)))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn probe_candidates(cfg: &Config) -> Vec<Candidate> {
    candidate_jars(cfg)
        .into_iter()
        .map(|(_, jar)| {
            let exists = jar.is_file();
            Candidate { path: jar, exists }
        })
        .collect()
}

pub fn locate(cfg: &Config) -> Result<EngineArtifact, SetupError> {
    let mut searched = Vec::new();

    for (home, jar) in candidate_jars(cfg) {
        if jar.is_file() {
            return Ok(EngineArtifact::Jar { jar, home });
        }
        debug!("no engine jar at {}", jar.display());
        searched.push(jar);
    }

    match which::which(&cfg.locator.launcher_name) {
        Ok(path) => return Ok(EngineArtifact::Launcher { path }),
        Err(err) => {
            debug!("launcher {} not on PATH: {err}", cfg.locator.launcher_name);
            searched.push(PathBuf::from(&cfg.locator.launcher_name));
        }
    }

    if cfg.locator.search_on_miss {
        let report = jar_search(cfg)?;
        if report.timed_out {
            warn!(
                "jar search stopped after {}s; results may be incomplete",
                cfg.locator.search_timeout_seconds
            );
        }
        if let Some(jar) = report.matches.into_iter().next() {
            let home = home_of(&jar);
            return Ok(EngineArtifact::Jar { jar, home });
        }
        searched.extend(cfg.locator.search_roots.iter().map(|r| expand_tilde(r)));
    }

    Err(SetupError::EngineNotFound { searched })
}

/// Bounded recursive search for engine jars under the configured roots.
pub fn jar_search(cfg: &Config) -> Result<SearchReport, SetupError> {
    let pattern = Regex::new(&cfg.locator.jar_pattern).map_err(|source| {
        SetupError::InvalidPattern {
            pattern: cfg.locator.jar_pattern.clone(),
            source,
        }
    })?;
    let roots: Vec<PathBuf> = cfg.locator.search_roots.iter().map(|r| expand_tilde(r)).collect();
    Ok(search_files(
        &roots,
        &pattern,
        Duration::from_secs(cfg.locator.search_timeout_seconds),
    ))
}

/// Walk `roots` collecting regular files whose name matches `pattern`.
/// Unreadable entries are counted and skipped; the deadline truncates the
/// walk instead of failing it.
pub fn search_files(roots: &[PathBuf], pattern: &Regex, timeout: Duration) -> SearchReport {
    let deadline = Instant::now() + timeout;
    let mut report = SearchReport::default();

    'roots: for root in roots {
        for entry in WalkDir::new(root).follow_links(false) {
            if Instant::now() > deadline {
                report.timed_out = true;
                break 'roots;
            }
            match entry {
                Ok(e) => {
                    if e.file_type().is_file() && pattern.is_match(&e.file_name().to_string_lossy()) {
                        report.matches.push(e.into_path());
                    }
                }
                Err(err) => {
                    debug!("search skipped entry: {err}");
                    report.skipped += 1;
                }
            }
        }
    }

    report
}

fn home_of(jar: &Path) -> PathBuf {
    let parent = jar.parent().unwrap_or_else(|| Path::new("."));
    if parent.file_name().is_some_and(|n| n == "lib") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}
