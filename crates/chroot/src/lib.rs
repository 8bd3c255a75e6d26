#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Chroot build environment for pkgsmith
//!
//! Wraps mkarchroot, arch-nspawn, and makechrootpkg. The chroot builds a
//! package from a prepared build directory, with pre-built dependency
//! package files injected via makechrootpkg's `-I` flag. Build output is
//! captured line by line and mirrored to the event channel.

mod exec;
mod mirrorlist;

pub use exec::{run_logged, CommandOutput};
pub use mirrorlist::Mirrorlist;

use pkgsmith_errors::{BuildError, Error};
use pkgsmith_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// An mkarchroot-based chroot capable of building packages
#[derive(Debug, Clone)]
pub struct Chroot {
    working_dir: PathBuf,
    event_sender: Option<EventSender>,
}

impl EventEmitter for Chroot {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Chroot {
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>, event_sender: Option<EventSender>) -> Self {
        Self {
            working_dir: working_dir.into(),
            event_sender,
        }
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The chroot's root filesystem.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.working_dir.join("root")
    }

    /// Check if the chroot exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.root().exists()
    }

    /// Make the chroot using mkarchroot.
    ///
    /// # Errors
    ///
    /// Returns an error if mkarchroot cannot be run or fails.
    pub async fn make(&self) -> Result<(), Error> {
        if !self.working_dir.exists() {
            tokio::fs::create_dir_all(&self.working_dir)
                .await
                .map_err(|e| Error::io_with_path(&e, &self.working_dir))?;
        }

        self.emit(AppEvent::Build(BuildEvent::ChrootCreating {
            path: self.root(),
        }));

        let mut cmd = Command::new("mkarchroot");
        cmd.arg(self.root()).args(["base-devel", "devtools"]);
        let output = run_logged(cmd, "mkarchroot", self.event_sender()).await?;
        if !output.success() {
            return Err(BuildError::ChrootCreateFailed {
                message: format!("mkarchroot exited with status {}", output.code),
            }
            .into());
        }
        Ok(())
    }

    /// Run pacman inside the chroot with the given flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be run or exits non-zero.
    pub async fn pacman(&self, flags: &str) -> Result<(), Error> {
        let mut cmd = Command::new("arch-nspawn");
        cmd.arg(self.root()).arg("pacman").arg(flags);
        let output = run_logged(cmd, "arch-nspawn", self.event_sender()).await?;
        if !output.success() {
            return Err(BuildError::CommandFailed {
                command: format!("arch-nspawn pacman {flags}"),
                code: output.code,
            }
            .into());
        }
        Ok(())
    }

    /// Refresh the chroot's pacman databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails.
    pub async fn refresh(&self) -> Result<(), Error> {
        self.pacman("-Syy").await
    }

    /// Update the chroot, creating it first if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if creation or the upgrade fails.
    pub async fn update(&self) -> Result<(), Error> {
        if self.exists() {
            self.pacman("-Syuu").await
        } else {
            self.make().await
        }
    }

    /// Remove the chroot.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub async fn remove(&self) -> Result<(), Error> {
        if self.exists() {
            tokio::fs::remove_dir_all(&self.working_dir)
                .await
                .map_err(|e| Error::io_with_path(&e, &self.working_dir))?;
        }
        Ok(())
    }

    /// Build a package in the chroot using makechrootpkg.
    ///
    /// `deps` are pre-built dependency package files installed into the
    /// chroot for the build. The exit code and captured output are
    /// returned as-is; on failure the stdout lines carry pacman's
    /// `error: target not found: <name>` reports, which the caller parses
    /// for dependency discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the chroot cannot be created or the command
    /// cannot be spawned; a failing build is a normal `CommandOutput`.
    pub async fn makepkg(
        &self,
        build_dir: &Path,
        deps: &BTreeSet<PathBuf>,
    ) -> Result<CommandOutput, Error> {
        if !self.exists() {
            self.make().await?;
        }

        let mut cmd = Command::new("makechrootpkg");
        cmd.arg("-cr").arg(&self.working_dir);
        for dep in deps {
            cmd.arg("-I").arg(dep);
        }
        cmd.args(["--", "-s"]);
        cmd.current_dir(build_dir);

        run_logged(cmd, "makechrootpkg", self.event_sender()).await
    }

    /// The chroot's mirrorlist.
    #[must_use]
    pub fn mirrorlist(&self) -> Mirrorlist<'_> {
        Mirrorlist::new(self)
    }
}
