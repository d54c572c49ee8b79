#![cfg(unix)]

mod common;

use common::{stub_runner, touch, write_stub};
use score_batch::{
    batch::{list_inputs, run_batch},
    config::Config,
    error::FailureKind,
};

#[test]
fn counts_successes_and_failures_without_stopping() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path());
    let input_dir = tmp.path().join("in");
    std::fs::create_dir_all(input_dir.join("nested")).unwrap();
    for name in ["a.pdf", "b_fail.pdf", "c.PDF", "d_fail.pdf", "notes.txt", "nested/e.pdf"] {
        touch(&input_dir.join(name));
    }
    let out = tmp.path().join("out");

    let runner = stub_runner(&Config::default(), &stub);
    let summary = run_batch(&runner, &input_dir, &out).unwrap();

    assert_eq!(summary.total(), 4);
    assert_eq!(summary.successful().len(), 2);
    assert_eq!(summary.failed().len(), 2);
    assert_eq!(
        summary.total(),
        summary.successful().len() + summary.failed().len()
    );

    let failed: Vec<_> = summary.failed().iter().map(|f| f.file.as_str()).collect();
    assert_eq!(failed, vec!["b_fail.pdf", "d_fail.pdf"]);
    for f in summary.failed() {
        assert_eq!(f.result.failure, Some(FailureKind::ProcessError));
    }

    assert!(out.join("a").join("a.xml").is_file());
    assert!(out.join("a").join("a.mid").is_file());
    assert!(out.join("c").join("c.xml").is_file());
    assert!(!out.join("e").exists());
    assert!(summary.finished.is_some());
}

#[test]
fn writes_summary_json() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path());
    let input_dir = tmp.path().join("in");
    std::fs::create_dir_all(&input_dir).unwrap();
    touch(&input_dir.join("one.pdf"));
    let out = tmp.path().join("out");

    let runner = stub_runner(&Config::default(), &stub);
    run_batch(&runner, &input_dir, &out).unwrap();

    let raw = std::fs::read_to_string(out.join("summary.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["successful"][0]["file"], "one.pdf");
    assert_eq!(json["successful"][0]["succeeded"], true);
    assert!(json["failed"].as_array().unwrap().is_empty());
}

#[test]
fn empty_directory_yields_empty_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path());
    let input_dir = tmp.path().join("in");
    std::fs::create_dir_all(&input_dir).unwrap();

    let mut cfg = Config::default();
    cfg.output.write_summary_json = false;
    let runner = stub_runner(&cfg, &stub);
    let summary = run_batch(&runner, &input_dir, &tmp.path().join("out")).unwrap();

    assert_eq!(summary.total(), 0);
    assert!(summary.successful().is_empty());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn missing_input_dir_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(list_inputs(&tmp.path().join("absent"), "pdf").is_err());
}

#[test]
fn list_inputs_filters_by_extension() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["b.pdf", "a.png", "c.pdf"] {
        touch(&tmp.path().join(name));
    }
    let files = list_inputs(tmp.path(), ".pdf").unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["b.pdf", "c.pdf"]);
}
