use super::{Engine, EngineArtifact, Job};
use crate::{config::Config, error::SetupError, locator, util::expand_tilde};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

pub struct AudiverisEngine {
    artifact: EngineArtifact,
    java_exe: PathBuf,
    fixed_flags: Vec<String>,
}

impl AudiverisEngine {
    pub fn new(cfg: &Config, artifact: EngineArtifact) -> Self {
        Self {
            artifact,
            java_exe: expand_tilde(&cfg.engine.java_exe),
            fixed_flags: cfg.engine.fixed_flags.clone(),
        }
    }

    /// Locate the engine on disk and wrap it.
    pub fn locate(cfg: &Config) -> Result<Self, SetupError> {
        let artifact = locator::locate(cfg)?;
        info!("engine found at: {}", artifact.path().display());
        Ok(Self::new(cfg, artifact))
    }

    fn base_command(&self) -> Command {
        match &self.artifact {
            EngineArtifact::Jar { .. } => Command::new(&self.java_exe),
            EngineArtifact::Launcher { path } => Command::new(path),
        }
    }

    /// Full argument vector for `job`, excluding the program itself.
    pub fn convert_args(&self, job: &Job) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let EngineArtifact::Jar { jar, .. } = &self.artifact {
            if !job.memory_hint().is_empty() {
                args.push(job.memory_hint().into());
            }
            args.push("-jar".into());
            args.push(jar.into());
        }
        args.extend(self.fixed_flags.iter().map(OsString::from));
        for fmt in job.export_formats() {
            args.push("-export".into());
            args.push(fmt.into());
        }
        args.push("-output".into());
        args.push(job.output_dir().into());
        args.push(job.input().into());
        args
    }
}

impl Engine for AudiverisEngine {
    fn artifact(&self) -> &EngineArtifact {
        &self.artifact
    }

    fn convert_command(&self, job: &Job) -> Command {
        let mut cmd = self.base_command();
        let args = self.convert_args(job);
        cmd.args(&args);
        // The launcher starts its own JVM and reads extra options from JAVA_OPTS.
        if matches!(self.artifact, EngineArtifact::Launcher { .. }) && !job.memory_hint().is_empty() {
            cmd.env("JAVA_OPTS", job.memory_hint());
        }
        if let Some(dir) = self.artifact.working_dir() {
            cmd.current_dir(dir);
        }
        debug!("engine command: {:?} {:?}", cmd.get_program(), args);
        cmd
    }

    fn help_command(&self) -> Command {
        let mut cmd = self.base_command();
        if let EngineArtifact::Jar { jar, .. } = &self.artifact {
            cmd.arg("-jar").arg(jar);
        }
        cmd.arg("-help");
        if let Some(dir) = self.artifact.working_dir() {
            cmd.current_dir(dir);
        }
        cmd
    }
}
