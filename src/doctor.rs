use crate::{
    config::Config,
    engine::{AudiverisEngine, Engine, EngineArtifact},
    locator::{self, Candidate, SearchReport},
    process::{self, Completion},
    util::{expand_tilde, preview},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::{info, warn};

const ENV_VARS: [&str; 3] = ["JAVA_HOME", "PATH", locator::HOME_ENV];
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub candidates: Vec<Candidate>,
    pub located: Option<EngineArtifact>,
    pub locate_error: Option<String>,
    pub jar_search: Option<SearchReport>,
    pub jar_search_error: Option<String>,
    pub commands: Vec<CommandCheck>,
    pub env: BTreeMap<String, String>,
    /// Help runs in probe order, ending at the first that worked.
    pub help_probes: Vec<HelpProbe>,
}

impl Diagnosis {
    pub fn engine_works(&self) -> bool {
        self.help_probes.iter().any(|p| p.ok)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandCheck {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelpProbe {
    pub artifact: EngineArtifact,
    pub ok: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub preview: String,
}

/// Probe the host for the engine without failing on anything missing.
pub fn diagnose(cfg: &Config) -> Diagnosis {
    let candidates = locator::probe_candidates(cfg);
    for c in &candidates {
        info!("{} {}", if c.exists { "found" } else { "missing" }, c.path.display());
    }

    let (located, locate_error) = match locator::locate(cfg) {
        Ok(a) => (Some(a), None),
        Err(e) => {
            warn!("{e}");
            (None, Some(e.to_string()))
        }
    };

    info!(
        "searching {:?} for jars (timeout {}s)",
        cfg.locator.search_roots, cfg.locator.search_timeout_seconds
    );
    let (jar_search, jar_search_error) = match locator::jar_search(cfg) {
        Ok(r) => (Some(r), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let commands = vec![
        check_command(cfg, &cfg.engine.java_exe, true),
        check_command(cfg, &cfg.locator.launcher_name, false),
    ];

    let env = ENV_VARS
        .iter()
        .map(|k| {
            let v = std::env::var(k).unwrap_or_else(|_| "Not set".to_string());
            (k.to_string(), v)
        })
        .collect();

    let timeout = Duration::from_secs(cfg.locator.help_timeout_seconds);
    let mut help_probes = Vec::new();
    for artifact in probe_targets(cfg, located.as_ref()) {
        let probe = help_probe(&AudiverisEngine::new(cfg, artifact), timeout);
        info!(
            "help probe {}: {}",
            probe.artifact.path().display(),
            if probe.ok { "ok" } else { "failed" }
        );
        let ok = probe.ok;
        help_probes.push(probe);
        if ok {
            break;
        }
    }

    Diagnosis {
        candidates,
        located,
        locate_error,
        jar_search,
        jar_search_error,
        commands,
        env,
        help_probes,
    }
}

/// Every existing candidate jar, the located artifact, then the PATH
/// launcher; duplicates dropped.
fn probe_targets(cfg: &Config, located: Option<&EngineArtifact>) -> Vec<EngineArtifact> {
    let mut targets: Vec<EngineArtifact> = locator::candidate_jars(cfg)
        .into_iter()
        .filter(|(_, jar)| jar.is_file())
        .map(|(home, jar)| EngineArtifact::Jar { jar, home })
        .collect();
    targets.extend(located.cloned());
    if let Ok(path) = which::which(expand_tilde(&cfg.locator.launcher_name)) {
        targets.push(EngineArtifact::Launcher { path });
    }

    let mut unique = Vec::with_capacity(targets.len());
    for t in targets {
        if !unique.contains(&t) {
            unique.push(t);
        }
    }
    unique
}

fn check_command(cfg: &Config, name: &str, is_java: bool) -> CommandCheck {
    let path = which::which(expand_tilde(name)).ok();
    let version = match (&path, is_java) {
        (Some(p), true) => java_version(p, Duration::from_secs(cfg.locator.help_timeout_seconds)),
        _ => None,
    };
    CommandCheck {
        name: name.to_string(),
        path,
        version,
    }
}

/// First line of `java -version`, which the JVM prints on stderr.
fn java_version(java: &std::path::Path, timeout: Duration) -> Option<String> {
    let mut cmd = Command::new(java);
    cmd.arg("-version");
    let captured = process::run_captured(&mut cmd, Some(timeout)).ok()?;
    match captured.completion {
        Completion::Exited(status) if status.success() => captured
            .stderr
            .lines()
            .chain(captured.stdout.lines())
            .next()
            .map(|l| l.trim().to_string()),
        _ => None,
    }
}

pub fn help_probe<E: Engine>(engine: &E, timeout: Duration) -> HelpProbe {
    let artifact = engine.artifact().clone();
    let mut cmd = engine.help_command();
    match process::run_captured(&mut cmd, Some(timeout)) {
        Ok(captured) => match captured.completion {
            Completion::Exited(status) => {
                let text = if status.success() { &captured.stdout } else { &captured.stderr };
                HelpProbe {
                    artifact,
                    ok: status.success(),
                    exit_code: status.code(),
                    timed_out: false,
                    preview: preview(text, PREVIEW_CHARS),
                }
            }
            Completion::TimedOut(_) => HelpProbe {
                artifact,
                ok: false,
                exit_code: None,
                timed_out: true,
                preview: preview(&captured.stderr, PREVIEW_CHARS),
            },
        },
        Err(e) => HelpProbe {
            artifact,
            ok: false,
            exit_code: None,
            timed_out: false,
            preview: e.to_string(),
        },
    }
}
