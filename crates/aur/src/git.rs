//! Thin git wrapper for AUR package repositories

use pkgsmith_errors::{AurError, Error};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// A local git repository checkout
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the path is a git repository.
    pub async fn is_repo(&self) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .arg("status")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Run `git pull` in this repository.
    ///
    /// Returns `true` when the pull brought in new commits, `false` when
    /// the checkout was already up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be spawned or the pull fails.
    pub async fn pull(&self) -> Result<bool, Error> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(["pull", "--ff-only"])
            .output()
            .await
            .map_err(|e| AurError::PullFailed {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AurError::PullFailed {
                path: self.path.display().to_string(),
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(!stdout.contains("Already up to date"))
    }

    /// Clone a repository to `dest` as a shallow checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if `dest` already exists or the clone fails.
    pub async fn clone(url: &str, dest: &Path) -> Result<(), Error> {
        if dest.exists() {
            return Err(AurError::CloneFailed {
                url: url.to_string(),
                message: format!("destination already exists: {}", dest.display()),
            }
            .into());
        }

        let output = Command::new("git")
            .args(["clone", "--depth=1", url])
            .arg(dest)
            .output()
            .await
            .map_err(|e| AurError::CloneFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AurError::CloneFailed {
                url: url.to_string(),
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        Ok(())
    }
}
