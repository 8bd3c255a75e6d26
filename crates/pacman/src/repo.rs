//! Local pacman repository management
//!
//! A local repository is a directory holding package files and a
//! `<name>.db.tar*` database maintained by `repo-add`. Repositories may be
//! referenced by absolute path or by the name of a `file://` repository
//! declared in pacman's configuration.

use pkgsmith_errors::{Error, RepoError};
use pkgsmith_events::{AppEvent, EventEmitter, EventSender, RepoEvent};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// A local pacman repository directory with its database file
#[derive(Debug, Clone)]
pub struct LocalRepo {
    pub name: String,
    pub path: PathBuf,
    pub db: PathBuf,
    event_sender: Option<EventSender>,
}

impl EventEmitter for LocalRepo {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl LocalRepo {
    /// Open a repository by name or path.
    ///
    /// An absolute path is used directly (the repository name defaults to
    /// the final path component). A bare name is resolved through
    /// `pacman-conf -r <name>`, which must declare a `file://` server.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] when pacman-conf does not know the
    /// repository, [`RepoError::NotLocal`] when it has no `file://` server,
    /// and [`RepoError::DatabaseNotFound`] when the directory lacks a
    /// database file.
    pub async fn open(
        name_or_path: &str,
        pacman_conf: Option<&Path>,
        event_sender: Option<EventSender>,
    ) -> Result<Self, Error> {
        let path = Path::new(name_or_path);
        if path.is_absolute() {
            return Self::at_path(path.to_path_buf(), None, event_sender).await;
        }
        Self::from_conf(name_or_path, pacman_conf, event_sender).await
    }

    /// Open a repository directly from its directory path.
    async fn at_path(
        path: PathBuf,
        name: Option<String>,
        event_sender: Option<EventSender>,
    ) -> Result<Self, Error> {
        let name = name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let db = find_db(&path, &name).await?;
        Ok(Self {
            name,
            path,
            db,
            event_sender,
        })
    }

    /// Resolve a repository name through pacman's configuration.
    async fn from_conf(
        name: &str,
        pacman_conf: Option<&Path>,
        event_sender: Option<EventSender>,
    ) -> Result<Self, Error> {
        let mut cmd = Command::new("pacman-conf");
        if let Some(conf) = pacman_conf {
            cmd.arg("--config").arg(conf);
        }
        cmd.arg("-r").arg(name);

        let output = cmd.output().await.map_err(|e| Error::internal(format!(
            "failed to run pacman-conf: {e}"
        )))?;
        if !output.status.success() {
            return Err(RepoError::NotFound {
                name: name.to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix("Server = file://"))
            .map(str::trim)
            .next()
            .ok_or_else(|| RepoError::NotLocal {
                name: name.to_string(),
            })?;

        Self::at_path(
            PathBuf::from(path),
            Some(name.to_string()),
            event_sender,
        )
        .await
    }

    /// Copy package files into the repository directory and register them
    /// with `repo-add`.
    ///
    /// # Errors
    ///
    /// Returns an error if a package cannot be copied or `repo-add` fails.
    pub async fn add<P: AsRef<Path>>(&self, packages: &[P]) -> Result<(), Error> {
        if packages.is_empty() {
            return Ok(());
        }

        let mut added = Vec::with_capacity(packages.len());
        for package in packages {
            let package = package.as_ref();
            let Some(file_name) = package.file_name() else {
                continue;
            };
            let dest = self.path.join(file_name);
            tokio::fs::copy(package, &dest)
                .await
                .map_err(|e| Error::io_with_path(&e, package))?;
            added.push(dest);
        }

        let status = Command::new("repo-add")
            .arg(&self.db)
            .args(&added)
            .status()
            .await
            .map_err(|e| Error::internal(format!("failed to run repo-add: {e}")))?;

        if !status.success() {
            return Err(RepoError::AddFailed {
                name: self.name.clone(),
            }
            .into());
        }

        self.emit(AppEvent::Repo(RepoEvent::Added {
            repo: self.name.clone(),
            packages: added.len(),
        }));
        Ok(())
    }
}

/// Find the `<name>.db.tar*` database file in a repository directory,
/// ignoring `.old` backups.
async fn find_db(path: &Path, name: &str) -> Result<PathBuf, Error> {
    let missing = || RepoError::DatabaseNotFound {
        name: name.to_string(),
        path: path.display().to_string(),
    };

    if !path.exists() {
        return Err(missing().into());
    }

    let prefix = format!("{name}.db.tar");
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, path))?
    {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name.starts_with(&prefix) && !file_name.ends_with(".old") {
            return Ok(entry.path());
        }
    }

    Err(missing().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn find_db_skips_old_backups() {
        let temp = tempdir().unwrap();
        tokio::fs::write(temp.path().join("custom.db.tar.gz.old"), b"")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join("custom.db.tar.gz"), b"")
            .await
            .unwrap();

        let db = find_db(temp.path(), "custom").await.unwrap();
        assert_eq!(db, temp.path().join("custom.db.tar.gz"));
    }

    #[tokio::test]
    async fn find_db_reports_missing_database() {
        let temp = tempdir().unwrap();
        let err = find_db(temp.path(), "custom").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Repo(RepoError::DatabaseNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn open_by_absolute_path_uses_directory_name() {
        let temp = tempdir().unwrap();
        let repo_dir = temp.path().join("myrepo");
        tokio::fs::create_dir(&repo_dir).await.unwrap();
        tokio::fs::write(repo_dir.join("myrepo.db.tar.zst"), b"")
            .await
            .unwrap();

        let repo = LocalRepo::open(&repo_dir.display().to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(repo.name, "myrepo");
        assert_eq!(repo.db, repo_dir.join("myrepo.db.tar.zst"));
    }
}
