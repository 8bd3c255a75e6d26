#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build manifest handling for pkgsmith
//!
//! The manifest records what a build produced: the package files built
//! directly, plus the files contributed by runtime and build-only
//! dependency builds. It is persisted as `build.json` in the package build
//! directory and re-verified on later runs to short-circuit rebuilds.

use chrono::{DateTime, Utc};
use pkgsmith_errors::Error;
use pkgsmith_pacman::{LocalRepo, Pacman};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Manifest file name inside a package build directory
pub const MANIFEST_FILE: &str = "build.json";

/// The persisted record of one package build
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Name of the built package
    pub name: String,
    file_path: PathBuf,
    packages: BTreeSet<PathBuf>,
    depends: BTreeSet<PathBuf>,
    makedepends: BTreeSet<PathBuf>,
}

/// On-disk shape of `build.json`.
///
/// Every field is required; a file missing any of them is treated as
/// absent by [`Manifest::load`], never as an error.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    name: String,
    timestamp: DateTime<Utc>,
    packages: Vec<PathBuf>,
    depends: Vec<PathBuf>,
    makedepends: Vec<PathBuf>,
}

impl Manifest {
    /// Create an empty manifest scoped to a package build directory.
    #[must_use]
    pub fn new(name: impl Into<String>, build_dir: &Path) -> Self {
        Self {
            name: name.into(),
            file_path: build_dir.join(MANIFEST_FILE),
            packages: BTreeSet::new(),
            depends: BTreeSet::new(),
            makedepends: BTreeSet::new(),
        }
    }

    /// Check if the manifest file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Package files built directly by this package.
    #[must_use]
    pub fn packages(&self) -> &BTreeSet<PathBuf> {
        &self.packages
    }

    /// Runtime dependency package files.
    #[must_use]
    pub fn depends(&self) -> &BTreeSet<PathBuf> {
        &self.depends
    }

    /// Build-only dependency package files.
    #[must_use]
    pub fn makedepends(&self) -> &BTreeSet<PathBuf> {
        &self.makedepends
    }

    /// All built package files, dependencies included.
    #[must_use]
    pub fn all_packages(&self) -> BTreeSet<PathBuf> {
        let mut all = self.packages.clone();
        all.extend(self.depends.iter().cloned());
        all.extend(self.makedepends.iter().cloned());
        all
    }

    /// Built packages plus runtime dependencies.
    #[must_use]
    pub fn runtime_packages(&self) -> BTreeSet<PathBuf> {
        let mut set = self.packages.clone();
        set.extend(self.depends.iter().cloned());
        set
    }

    /// Everything required inside the build environment: runtime and
    /// build-only dependencies.
    #[must_use]
    pub fn build_depends(&self) -> BTreeSet<PathBuf> {
        let mut set = self.depends.clone();
        set.extend(self.makedepends.iter().cloned());
        set
    }

    /// Add package files built directly by this package.
    pub fn add_packages<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        self.packages.extend(paths);
    }

    /// Add runtime dependency package files.
    pub fn add_depends<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        self.depends.extend(paths);
    }

    /// Add build-only dependency package files.
    pub fn add_makedepends<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        self.makedepends.extend(paths);
    }

    /// Verify that recorded package files exist on disk.
    ///
    /// Checks the given paths, or the runtime set when `paths` is `None`.
    /// Pure existence check; no side effects.
    #[must_use]
    pub fn verify(&self, paths: Option<&BTreeSet<PathBuf>>) -> bool {
        let default;
        let paths = match paths {
            Some(paths) => paths,
            None => {
                default = self.runtime_packages();
                &default
            }
        };
        paths.iter().all(|p| p.exists())
    }

    /// Save the manifest file with a fresh timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub async fn save(&self) -> Result<(), Error> {
        let file = ManifestFile {
            name: self.name.clone(),
            timestamp: Utc::now(),
            packages: self.packages.iter().cloned().collect(),
            depends: self.depends.iter().cloned().collect(),
            makedepends: self.makedepends.iter().cloned().collect(),
        };
        let content = serde_json::to_string(&file)?;
        tokio::fs::write(&self.file_path, content)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.file_path))?;
        Ok(())
    }

    /// Load the manifest file, populating the tracked sets.
    ///
    /// Returns `false` when the file is missing or malformed; a malformed
    /// file is logged and treated exactly like a missing one, so callers
    /// reset and rebuild in both cases.
    pub async fn load(&mut self) -> bool {
        let Ok(content) = tokio::fs::read_to_string(&self.file_path).await else {
            return false;
        };

        match serde_json::from_str::<ManifestFile>(&content) {
            Ok(file) => {
                self.name = file.name;
                self.packages = file.packages.into_iter().collect();
                self.depends = file.depends.into_iter().collect();
                self.makedepends = file.makedepends.into_iter().collect();
                true
            }
            Err(e) => {
                warn!("found malformed manifest at {}: {e}", self.file_path.display());
                false
            }
        }
    }

    /// Remove all packages and dependencies from the manifest.
    pub fn reset(&mut self) {
        self.packages.clear();
        self.depends.clear();
        self.makedepends.clear();
    }

    /// Install the packages recorded in the manifest.
    ///
    /// Runtime dependencies are installed first in one batch, marked as
    /// dependency-installed, then the package's own files in a second
    /// batch. `reinstall` drops pacman's `--needed` so already-installed
    /// packages are reinstalled.
    ///
    /// # Errors
    ///
    /// Returns an error if either pacman invocation fails.
    pub async fn install(&self, pacman: &Pacman, reinstall: bool) -> Result<(), Error> {
        let needed = !reinstall;

        let depends: Vec<&PathBuf> = self.depends.iter().collect();
        pacman.install_files(&depends, true, needed).await?;

        let packages: Vec<&PathBuf> = self.packages.iter().collect();
        pacman.install_files(&packages, false, needed).await?;

        Ok(())
    }

    /// Add the runtime packages described by the manifest to a local
    /// repository.
    ///
    /// # Errors
    ///
    /// Returns an error if copying a package or `repo-add` fails.
    pub async fn add_to_repo(&self, repo: &LocalRepo) -> Result<(), Error> {
        let packages: Vec<PathBuf> = self.runtime_packages().into_iter().collect();
        repo.add(&packages).await
    }
}
