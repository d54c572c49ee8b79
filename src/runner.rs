use crate::{
    config::Config,
    engine::{Engine, Job},
    error::FailureKind,
    inspect::{candidate_set, inspect_outputs, GeneratedFile},
    process::{self, Captured, Completion, ProcessError},
    report::RunResult,
    util::ensure_dir,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, info_span, warn};

pub struct Runner<E: Engine> {
    cfg: Config,
    engine: E,
}

impl<E: Engine> Runner<E> {
    pub fn new(cfg: &Config, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// A job for `input` carrying this runner's configured defaults.
    pub fn job(&self, input: &Path, output_dir: &Path) -> Job {
        Job::new(&self.cfg.engine, input, output_dir)
    }

    /// Run one job to completion. Every failure is folded into the result.
    pub fn run(&self, job: &Job) -> RunResult {
        let span = info_span!("job", input = %job.input().display());
        let _enter = span.enter();
        let started = Instant::now();

        if !job.input().exists() {
            let msg = format!("Input not found: {}", job.input().display());
            warn!("{msg}");
            return RunResult::failure(FailureKind::InputNotFound, msg);
        }

        if let Err(err) = ensure_dir(job.output_dir()) {
            let msg = format!("Processing error: {err:#}");
            error!("{msg}");
            let mut result = RunResult::failure(FailureKind::Unexpected, msg);
            result.elapsed_ms = started.elapsed().as_millis() as u64;
            return result;
        }

        info!(
            "processing formats={:?} timeout={}s out={}",
            job.export_formats(),
            job.timeout_seconds(),
            job.output_dir().display()
        );

        let mut cmd = self.engine.convert_command(job);
        let mut result = match process::run_captured(&mut cmd, job.timeout()) {
            Ok(captured) => classify(captured),
            Err(err @ ProcessError::Spawn { .. }) => {
                let msg = format!("Processing error: {err}");
                error!("{msg}");
                let mut result = RunResult::failure(FailureKind::SpawnFailed, msg);
                result.elapsed_ms = started.elapsed().as_millis() as u64;
                return result;
            }
            Err(err) => RunResult::failure(FailureKind::Unexpected, format!("Processing error: {err}")),
        };

        // The engine ran, even if it failed or was killed: report whatever it left.
        result.generated_files = self.inspect(job);
        result.elapsed_ms = started.elapsed().as_millis() as u64;

        if result.succeeded {
            info!(
                "processed {} in {}ms; generated: {:?}",
                job.input().display(),
                result.elapsed_ms,
                result.generated_files.keys().collect::<Vec<_>>()
            );
            for fmt in job.export_formats() {
                if !result.generated_files.contains_key(fmt) {
                    warn!("requested format {fmt} was not produced");
                }
            }
        } else {
            error!(
                "failed to process {}: {}",
                job.input().display(),
                result.exit_message.trim()
            );
        }

        result
    }

    fn inspect(&self, job: &Job) -> BTreeMap<String, GeneratedFile> {
        let candidates = candidate_set(
            &self.cfg.inspect.candidate_extensions,
            job.export_formats(),
            self.cfg.inspect.include_requested,
        );
        inspect_outputs(job.output_dir(), &job.stem(), &candidates)
    }
}

fn classify(captured: Captured) -> RunResult {
    match captured.completion {
        Completion::Exited(status) if status.success() => RunResult::success(captured.stdout),
        Completion::Exited(status) => {
            let mut result = RunResult::failure(FailureKind::ProcessError, captured.stderr);
            result.exit_code = status.code();
            result
        }
        Completion::TimedOut(limit) => RunResult::failure(
            FailureKind::TimeoutExceeded,
            format!("Processing timeout ({}s exceeded)", limit.as_secs()),
        ),
    }
}
