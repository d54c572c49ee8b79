use crate::{
    engine::Engine,
    report::BatchSummary,
    runner::Runner,
    util::{ensure_dir, file_stem, normalize_ext},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Regular files directly under `dir` with extension `ext` (case-insensitive),
/// sorted by name.
pub fn list_inputs(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let want = normalize_ext(ext);
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading input dir: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&want));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Run every matching input in `input_dir` one after another, each into
/// `<output_dir>/<stem>`. Per-file failures are recorded, never fatal.
pub fn run_batch<E: Engine>(runner: &Runner<E>, input_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
    let cfg = runner.config();
    let inputs = list_inputs(input_dir, &cfg.batch.input_extension)?;
    info!(
        "found {} {} files to process in {}",
        inputs.len(),
        cfg.batch.input_extension,
        input_dir.display()
    );

    let mut summary = BatchSummary::new();
    for (i, input) in inputs.iter().enumerate() {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("[{}/{}] processing: {name}", i + 1, inputs.len());

        let job = runner.job(input, &output_dir.join(file_stem(input)));
        let result = runner.run(&job);
        summary.record(name, result);
    }
    summary.finish();

    info!(
        "batch done: total={} successful={} failed={}",
        summary.total(),
        summary.successful().len(),
        summary.failed().len()
    );

    if cfg.output.write_summary_json {
        ensure_dir(output_dir)?;
        let path = output_dir.join(&cfg.output.summary_filename);
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("writing summary: {}", path.display()))?;
    }

    Ok(summary)
}
