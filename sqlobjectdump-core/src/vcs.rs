//! Git integration around an export run.
//!
//! Git is driven through the `git` binary, one blocking child process at a
//! time, always with the export root as working directory. [`GitOps`] keeps
//! the lifecycle testable without a real repository.

use crate::{Result, error::DumpError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info, warn};

/// Commit message used for every export.
pub const COMMIT_MESSAGE: &str = "sqlobjectexport updated SQL objects";

/// Individual git invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitStep {
    Clone,
    Pull,
    Add,
    Commit,
    Push,
}

impl std::fmt::Display for GitStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Clone => "clone",
            Self::Pull => "pull",
            Self::Add => "add",
            Self::Commit => "commit",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// Git operations used by the lifecycle. Each call blocks until git exits.
pub trait GitOps {
    /// `git clone <remote> ./`
    fn clone_into(&self, dir: &Path, remote: &str) -> Result<()>;
    /// `git pull`
    fn pull(&self, dir: &Path) -> Result<()>;
    /// `git add .`
    fn add_all(&self, dir: &Path) -> Result<()>;
    /// `git commit -m <message>`
    fn commit(&self, dir: &Path, message: &str) -> Result<()>;
    /// `git push`
    fn push(&self, dir: &Path) -> Result<()>;
}

/// [`GitOps`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl SystemGit {
    fn run(step: GitStep, dir: &Path, args: &[&str]) -> Result<()> {
        debug!("Running git {} in {}", args.join(" "), dir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DumpError::version_control(step.to_string(), "git not installed or not in PATH")
                } else {
                    DumpError::version_control(step.to_string(), e.to_string())
                }
            })?;
        check_output(step, &output)
    }
}

fn check_output(step: GitStep, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = match (stdout.trim(), stderr.trim()) {
        ("", "") => format!("exit status {}", output.status),
        (out, "") => out.to_string(),
        ("", err) => err.to_string(),
        (out, err) => format!("{out}\n{err}"),
    };
    Err(DumpError::version_control(step.to_string(), combined))
}

impl GitOps for SystemGit {
    fn clone_into(&self, dir: &Path, remote: &str) -> Result<()> {
        Self::run(GitStep::Clone, dir, &["clone", remote, "./"])
    }

    fn pull(&self, dir: &Path) -> Result<()> {
        Self::run(GitStep::Pull, dir, &["pull"])
    }

    fn add_all(&self, dir: &Path) -> Result<()> {
        Self::run(GitStep::Add, dir, &["add", "."])
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        Self::run(GitStep::Commit, dir, &["commit", "-m", message])
    }

    fn push(&self, dir: &Path) -> Result<()> {
        Self::run(GitStep::Push, dir, &["push"])
    }
}

/// Lifecycle state of the export working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsState {
    NotInitialized,
    Initialized,
    Committed,
    Failed(GitStep),
}

/// Clone-or-pull before the export, add/commit/push after it.
pub struct VersionControl<'a> {
    git: &'a dyn GitOps,
    dir: PathBuf,
    remote: Option<String>,
    state: VcsState,
}

impl<'a> VersionControl<'a> {
    /// Creates the lifecycle for `dir`, cloning from `remote` if given.
    pub fn new(git: &'a dyn GitOps, dir: impl Into<PathBuf>, remote: Option<String>) -> Self {
        Self {
            git,
            dir: dir.into(),
            remote: remote.filter(|r| !r.trim().is_empty()),
            state: VcsState::NotInitialized,
        }
    }

    pub const fn state(&self) -> VcsState {
        self.state
    }

    /// Prepares the working copy. Every failure here is logged and ignored:
    /// the export proceeds either way.
    ///
    /// With a remote configured, the remote is cloned into the export root;
    /// if that fails (typically because the root already is a working copy)
    /// a pull is attempted instead.
    pub fn prepare(&mut self) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("Failed to create {}: {}", self.dir.display(), e);
        }

        if let Some(remote) = self.remote.as_deref() {
            match self.git.clone_into(&self.dir, remote) {
                Ok(()) => info!("Cloned repository into {}", self.dir.display()),
                Err(clone_err) => {
                    debug!("{clone_err}; trying pull instead");
                    match self.git.pull(&self.dir) {
                        Ok(()) => info!("Pulled latest changes into {}", self.dir.display()),
                        Err(pull_err) => {
                            warn!("{clone_err}");
                            warn!("{pull_err}");
                        }
                    }
                }
            }
        }

        self.state = VcsState::Initialized;
    }

    /// Stages, commits and pushes the export.
    ///
    /// The first failing step ends the sequence; later steps are skipped.
    ///
    /// # Errors
    /// Returns the failing step's error, or a configuration error when the
    /// working copy was never prepared or was already committed.
    pub fn commit_and_push(&mut self) -> Result<()> {
        if self.state != VcsState::Initialized {
            return Err(DumpError::configuration(format!(
                "cannot commit from version control state {:?}",
                self.state
            )));
        }

        let outcome = self
            .git
            .add_all(&self.dir)
            .map_err(|e| (GitStep::Add, e))
            .and_then(|()| {
                self.git
                    .commit(&self.dir, COMMIT_MESSAGE)
                    .map_err(|e| (GitStep::Commit, e))
            })
            .and_then(|()| self.git.push(&self.dir).map_err(|e| (GitStep::Push, e)));

        match outcome {
            Ok(()) => {
                info!("Committed and pushed {}", self.dir.display());
                self.state = VcsState::Committed;
                Ok(())
            }
            Err((step, e)) => {
                self.state = VcsState::Failed(step);
                Err(e)
            }
        }
    }
}
