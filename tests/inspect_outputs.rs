use score_batch::inspect::{candidate_set, inspect_outputs};

#[test]
fn reports_only_existing_files_with_exact_size() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("score.xml"), b"<score/>").unwrap();
    std::fs::write(dir.path().join("score.omr"), vec![0u8; 1234]).unwrap();
    std::fs::write(dir.path().join("other.mid"), b"MThd").unwrap();

    let files = inspect_outputs(dir.path(), "score", &["xml", "mid", "pdf", "omr"]);

    assert_eq!(files.keys().collect::<Vec<_>>(), vec!["omr", "xml"]);
    assert_eq!(files["xml"].size, 8);
    assert_eq!(files["omr"].size, 1234);
    assert!(files["xml"].path.is_absolute());
    assert!(files["xml"].path.ends_with("score.xml"));
}

#[test]
fn directories_and_missing_dirs_are_not_outputs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("score.pdf")).unwrap();

    let files = inspect_outputs(dir.path(), "score", &[".pdf"]);
    assert!(files.is_empty());

    let files = inspect_outputs(&dir.path().join("nope"), "score", &["xml"]);
    assert!(files.is_empty());
}

#[test]
fn candidate_set_unions_requested_formats() {
    let fixed = vec!["xml".to_string(), ".mid".to_string()];
    let requested = vec!["mid".to_string(), "mxl".to_string()];

    assert_eq!(candidate_set(&fixed, &requested, true), vec!["xml", "mid", "mxl"]);
    assert_eq!(candidate_set(&fixed, &requested, false), vec!["xml", "mid"]);
}

#[test]
fn relative_output_dir_yields_absolute_paths() {
    let dir = tempfile::tempdir_in(".").unwrap();
    let rel = std::path::Path::new(".").join(dir.path().file_name().unwrap());
    assert!(rel.is_relative());
    std::fs::write(rel.join("waltz.mid"), b"MThd").unwrap();

    let files = inspect_outputs(&rel, "waltz", &["mid"]);
    assert!(files["mid"].path.is_absolute());
    assert_eq!(files["mid"].size, 4);
}
