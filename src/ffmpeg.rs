//! Assembling the GIF with the `ffmpeg` command-line tool

use crate::assemble::{Assembled, Assembler};
use crate::error::*;
use crate::Config;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Find `program` the way a shell would.
///
/// Names with a directory part are checked as-is, bare names are searched for in `PATH`.
pub fn find_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| dunce::canonicalize(program).ok()).flatten();
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| candidates(&dir, program))
        .find(|p| is_executable(p))
        .and_then(|p| dunce::canonicalize(p).ok())
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    let plain = dir.join(program);
    vec![plain.with_extension("exe"), plain]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// One thing the external assembler does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Delete a file left from an earlier run. It's fine if it doesn't exist.
    Remove(PathBuf),
    /// Run the tool with these arguments
    Run(Vec<OsString>),
}

/// Generates a palette from the composited frames first, then encodes them with it
pub struct FfmpegAssembler {
    program: PathBuf,
}

impl FfmpegAssembler {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// The steps, in the order they must run
    pub fn plan(config: &Config) -> Vec<Step> {
        let pattern = config.intermediates_dir.join("%d.png");
        let palette = config.palette_path();
        vec![
            Step::Remove(config.output.clone()),
            Step::Remove(palette.clone()),
            Step::Run(vec![
                "-i".into(), pattern.clone().into(),
                "-vf".into(), "palettegen=reserve_transparent=1".into(),
                palette.clone().into(),
            ]),
            Step::Run(vec![
                "-framerate".into(), config.fps.to_string().into(),
                "-i".into(), pattern.into(),
                "-i".into(), palette.into(),
                "-lavfi".into(), format!("paletteuse=alpha_threshold={}", config.alpha_threshold).into(),
                "-gifflags".into(), "-offsetting".into(),
                config.output.clone().into(),
            ]),
        ]
    }

    fn run_step(&self, step: &Step) -> ParrotResult<()> {
        match step {
            Step::Remove(path) => match fs::remove_file(path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => {
                    Err(Error::Write(format!("Can't delete previous {}: {}", path.display(), err)))
                },
                _ => Ok(()),
            },
            Step::Run(args) => self.run(args),
        }
    }

    fn run(&self, args: &[OsString]) -> ParrotResult<()> {
        debug!(program = %self.program.display(), ?args, "running");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| Error::ExternalTool(format!("Can't run {}: {}", self.program.display(), err)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr.lines().rev().take(5).collect::<Vec<_>>();
            let tail = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
            return Err(Error::ExternalTool(format!("{} failed ({}):\n{}", self.program.display(), output.status, tail)));
        }
        Ok(())
    }
}

impl Assembler for FfmpegAssembler {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn stops_at_gap(&self) -> bool {
        true
    }

    fn assemble(&mut self, config: &Config) -> ParrotResult<Assembled> {
        if let Some(parent) = config.output.parent() {
            fs::create_dir_all(parent)?;
        }
        for step in Self::plan(config) {
            self.run_step(&step)?;
        }
        info!("wrote {}", config.output.display());
        Ok(Assembled {
            output: config.output.clone(),
            skipped: Vec::new(),
            frames: None,
        })
    }
}
