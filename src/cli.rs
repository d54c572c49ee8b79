use crate::{
    batch::run_batch,
    config::Config,
    doctor,
    engine::AudiverisEngine,
    report::BatchSummary,
    runner::Runner,
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "score-batch")]
#[command(about = "Process sheet music PDFs with Audiveris")]
pub struct Args {
    /// Input PDF file, or directory with --batch.
    #[arg(required_unless_present = "doctor")]
    pub input: Option<PathBuf>,

    /// Output directory.
    #[arg(required_unless_present = "doctor")]
    pub output: Option<PathBuf>,

    /// Process every matching file in the input directory.
    #[arg(long)]
    pub batch: bool,

    /// Report where the engine is (or isn't) and exit.
    #[arg(long, conflicts_with = "batch")]
    pub doctor: bool,

    /// Path to config TOML. If omitted, uses ./score-batch.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override engine.home.
    #[arg(long)]
    pub engine_home: Option<PathBuf>,

    /// Override engine.timeout_seconds (0 disables).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Export format; repeat for several. Defaults to engine.export_formats.
    #[arg(long = "format")]
    pub formats: Vec<String>,
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    apply_overrides(&args, &mut cfg);

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    if args.doctor {
        return run_doctor(&cfg);
    }

    let (Some(input), Some(output)) = (args.input.as_deref(), args.output.as_deref()) else {
        return Err(anyhow!("input and output are required"));
    };

    let engine = AudiverisEngine::locate(&cfg)?;
    let runner = Runner::new(&cfg, engine);

    if args.batch {
        let summary = run_batch(&runner, input, output)?;
        print_batch(&summary);
    } else {
        run_single(&runner, input, output);
    }
    Ok(())
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("score-batch.toml");
    default.exists().then_some(default)
}

fn apply_overrides(args: &Args, cfg: &mut Config) {
    if let Some(home) = &args.engine_home {
        cfg.engine.home = home.display().to_string();
    }
    if let Some(secs) = args.timeout {
        cfg.engine.timeout_seconds = secs;
    }
    if !args.formats.is_empty() {
        cfg.engine.export_formats = args.formats.clone();
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the human summary; logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("score-batch.log"))
}

fn run_doctor(cfg: &Config) -> Result<()> {
    let diag = doctor::diagnose(cfg);
    println!("{}", serde_json::to_string_pretty(&diag)?);
    if diag.engine_works() {
        info!("engine appears to be working");
    } else {
        info!("could not get the engine working");
    }
    Ok(())
}

fn run_single(runner: &Runner<AudiverisEngine>, input: &Path, output: &Path) {
    let job = runner.job(input, output);
    let result = runner.run(&job);
    println!("Success: {}", result.succeeded);
    println!("Message: {}", result.exit_message);
    println!(
        "Generated files: {:?}",
        result.generated_files.keys().collect::<Vec<_>>()
    );
}

fn print_batch(summary: &BatchSummary) {
    println!();
    println!("Batch processing complete:");
    println!("Total files: {}", summary.total());
    println!("Successful: {}", summary.successful().len());
    println!("Failed: {}", summary.failed().len());

    if !summary.failed().is_empty() {
        println!();
        println!("Failed files:");
        for failed in summary.failed() {
            println!("  - {}: {}", failed.file, failed.result.exit_message.trim());
        }
    }
}
