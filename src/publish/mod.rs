//! Publish the rendered report to a hosting branch.
//!
//! The working tree switches to the publish branch, receives a copy of the
//! rendered directory, and the result is committed and pushed.

use chrono::Utc;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const DEFAULT_BRANCH: &str = "gh-pages";

/// Exit status and captured stderr of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external commands inside a working directory.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput>;
}

/// Runs commands with [`std::process::Command`].
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
        log::debug!("running {} {}", program, args.join(" "));
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Repository working tree to publish from
    pub workdir: PathBuf,
    /// Rendered report directory, relative to `workdir` unless absolute
    pub source: PathBuf,
    pub branch: String,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            source: PathBuf::from("docs"),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

fn run_checked<R: CommandRunner + ?Sized>(runner: &R, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    let output = runner.run("git", args, cwd)?;
    if !output.success() {
        return Err(Error::Command {
            command: format!("git {}", args.join(" ")),
            code: output.code,
            stderr: output.stderr,
        });
    }
    Ok(output)
}

/// Publish `options.source` to `options.branch` and push it to `origin`.
///
/// Safe to re-run: switching to the branch it is already on and committing
/// an unchanged tree are both tolerated.
pub fn deploy<R: CommandRunner + ?Sized>(options: &DeployOptions, runner: &R) -> Result<()> {
    let workdir = options.workdir.as_path();
    let branch = options.branch.as_str();

    run_checked(runner, &["fetch"], workdir)?;

    let switched = runner.run("git", &["switch", branch], workdir)?;
    if !switched.success() && !switched.stderr.to_lowercase().contains("already on") {
        run_checked(runner, &["switch", "-c", branch], workdir)?;
    }

    let source = if options.source.is_absolute() {
        options.source.clone()
    } else {
        workdir.join(&options.source)
    };
    sync_directory(&source, workdir)?;

    run_checked(runner, &["add", "."], workdir)?;

    let message = format!("braggard: {}", Utc::now().date_naive());
    let committed = runner.run("git", &["commit", "-m", &message], workdir)?;
    if !committed.success() {
        log::info!("nothing new to commit on {}", branch);
    }

    run_checked(runner, &["push", "origin", branch], workdir)?;
    log::info!("published {} to {}", source.display(), branch);
    Ok(())
}

fn relative_entries(root: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if let Ok(relative) = entry.path().strip_prefix(root) {
            entries.push((relative.to_path_buf(), entry.file_type().is_dir()));
        }
    }
    Ok(entries)
}

/// Mirror `src` into `dst`, then delete whatever `dst` holds that `src` does
/// not. `.git` and, when `src` lives directly in `dst`, the source directory
/// itself are left alone.
pub fn sync_directory(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    let wanted = relative_entries(src)?;
    for (relative, is_dir) in &wanted {
        let target = dst.join(relative);
        if *is_dir {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(src.join(relative), &target)?;
        }
    }

    let wanted: BTreeSet<PathBuf> = wanted.into_iter().map(|(relative, _)| relative).collect();
    let source_name = src.file_name().map(PathBuf::from);

    for (relative, is_dir) in relative_entries(dst)? {
        let protected = relative.components().next().is_some_and(|first| {
            let first = Path::new(first.as_os_str());
            first == Path::new(".git") || Some(first.to_path_buf()) == source_name
        });
        if protected || wanted.contains(&relative) {
            continue;
        }

        let stale = dst.join(&relative);
        // A parent directory may already have taken it
        if !stale.exists() {
            continue;
        }
        if is_dir {
            fs::remove_dir_all(&stale)?;
        } else {
            fs::remove_file(&stale)?;
        }
    }

    Ok(())
}
