#![cfg(unix)]

mod common;

use common::write_stub;
use score_batch::{
    config::Config,
    doctor::{diagnose, help_probe},
    engine::{AudiverisEngine, EngineArtifact},
};
use std::path::Path;
use std::time::Duration;

const MISSING_JAVA: &str = "score-batch-test-no-such-java";

fn broken_jar_config(home: &Path) -> Config {
    std::fs::create_dir_all(home.join("lib")).unwrap();
    std::fs::write(home.join("lib/audiveris.jar"), b"PK").unwrap();

    let mut cfg = Config::default();
    cfg.locator.known_dirs = vec![home.display().to_string()];
    cfg.locator.launcher_name = "score-batch-test-no-such-launcher".into();
    cfg.locator.search_roots = vec![home.display().to_string()];
    cfg.engine.java_exe = MISSING_JAVA.into();
    cfg
}

#[test]
fn diagnosis_survives_a_broken_install() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = broken_jar_config(tmp.path());

    let diag = diagnose(&cfg);

    assert!(diag.candidates.iter().any(|c| c.exists));
    assert!(matches!(diag.located, Some(EngineArtifact::Jar { .. })));
    assert_eq!(diag.jar_search.as_ref().unwrap().matches.len(), 1);
    assert!(diag.commands.iter().all(|c| c.path.is_none()));
    assert!(diag.env.contains_key("JAVA_HOME"));
    assert!(diag.env.contains_key("AUDIVERIS_HOME"));

    assert_eq!(diag.help_probes.len(), 1);
    let probe = &diag.help_probes[0];
    assert!(!probe.ok);
    assert!(probe.preview.contains("failed to start"));
    assert!(!diag.engine_works());

    let json = serde_json::to_value(&diag).unwrap();
    assert_eq!(json["located"]["kind"], "jar");
    assert_eq!(json["help_probes"][0]["artifact"]["kind"], "jar");
}

#[test]
fn broken_jar_falls_through_to_working_launcher() {
    let tmp = tempfile::tempdir().unwrap();
    let stub_dir = tmp.path().join("bin");
    std::fs::create_dir_all(&stub_dir).unwrap();
    let stub = write_stub(&stub_dir);

    let mut cfg = broken_jar_config(&tmp.path().join("install"));
    cfg.locator.launcher_name = stub.display().to_string();

    let diag = diagnose(&cfg);

    assert!(diag.engine_works());
    assert_eq!(diag.help_probes.len(), 2);
    assert!(matches!(diag.help_probes[0].artifact, EngineArtifact::Jar { .. }));
    assert!(!diag.help_probes[0].ok);
    let EngineArtifact::Launcher { path } = &diag.help_probes[1].artifact else {
        panic!("expected launcher, got {:?}", diag.help_probes[1].artifact);
    };
    assert!(path.ends_with(stub.file_name().unwrap()));
    assert!(diag.help_probes[1].ok);
}

#[test]
fn help_probe_runs_the_launcher() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path());
    let engine = AudiverisEngine::new(
        &Config::default(),
        EngineArtifact::Launcher { path: stub.clone() },
    );

    let probe = help_probe(&engine, Duration::from_secs(10));
    assert!(probe.ok, "{}", probe.preview);
    assert_eq!(probe.exit_code, Some(0));
    assert!(probe.preview.starts_with("exported"));
    assert_eq!(probe.artifact, EngineArtifact::Launcher { path: stub });
}
