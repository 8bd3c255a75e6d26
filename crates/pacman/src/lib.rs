#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Pacman wrapper for pkgsmith
//!
//! Installs built package files with `pacman -U`, bypassing interactive
//! prompts by feeding affirmative answers on standard input, and manages
//! local package repositories via `repo-add`.

mod repo;

pub use repo::LocalRepo;

use pkgsmith_errors::{Error, InstallError};
use pkgsmith_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Options shared by every pacman invocation
#[derive(Debug, Clone, Default)]
pub struct Pacman {
    /// Alternative pacman configuration file (`--config`)
    pub pacman_conf: Option<PathBuf>,
    /// Alternative system root (`--sysroot`)
    pub sysroot: Option<PathBuf>,
    /// Allow interactive prompts instead of auto-answering them
    pub confirm: bool,
    event_sender: Option<EventSender>,
}

impl EventEmitter for Pacman {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Pacman {
    #[must_use]
    pub fn new(pacman_conf: Option<PathBuf>) -> Self {
        Self {
            pacman_conf,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sysroot(mut self, sysroot: Option<PathBuf>) -> Self {
        self.sysroot = sysroot;
        self
    }

    #[must_use]
    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    #[must_use]
    pub fn with_events(mut self, sender: Option<EventSender>) -> Self {
        self.event_sender = sender;
        self
    }

    /// Install built package files with `pacman -U`.
    ///
    /// All paths go into a single invocation. `as_deps` marks the packages
    /// as dependency-installed (`--asdeps`); `needed` skips packages that
    /// are already installed at the same version.
    ///
    /// # Errors
    ///
    /// Returns an error if pacman cannot be spawned or exits non-zero.
    pub async fn install_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        as_deps: bool,
        needed: bool,
    ) -> Result<(), Error> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut args = vec!["-U".to_string()];
        if needed {
            args.push("--needed".to_string());
        }
        if as_deps {
            args.push("--asdeps".to_string());
        }
        self.push_common_args(&mut args);
        for path in paths {
            args.push(path.as_ref().display().to_string());
        }

        self.emit(AppEvent::Install(InstallEvent::Installing {
            packages: paths.len(),
            as_deps,
        }));
        self.run(&args).await?;
        self.emit(AppEvent::Install(InstallEvent::Installed {
            packages: paths.len(),
        }));
        Ok(())
    }

    /// Refresh databases and install a package by name (`pacman -Sy`).
    ///
    /// Used after adding built packages to a local repository.
    ///
    /// # Errors
    ///
    /// Returns an error if pacman cannot be spawned or exits non-zero.
    pub async fn sync_install(&self, name: &str) -> Result<(), Error> {
        let mut args = vec!["-Sy".to_string()];
        self.push_common_args(&mut args);
        args.push(name.to_string());
        self.run(&args).await
    }

    fn push_common_args(&self, args: &mut Vec<String>) {
        if let Some(conf) = &self.pacman_conf {
            args.push("--config".to_string());
            args.push(conf.display().to_string());
        }
        if let Some(sysroot) = &self.sysroot {
            args.push("--sysroot".to_string());
            args.push(sysroot.display().to_string());
        }
    }

    /// Run `sudo pacman` with the given arguments.
    ///
    /// Unless `confirm` is set, prompts are bypassed by feeding `y` lines
    /// on standard input until pacman stops reading.
    async fn run(&self, args: &[String]) -> Result<(), Error> {
        let mut cmd = Command::new("sudo");
        cmd.arg("pacman").args(args);
        if self.confirm {
            cmd.stdin(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|e| InstallError::PacmanSpawn {
            message: e.to_string(),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Broken pipe just means pacman stopped asking.
            while stdin.write_all(b"y\n").await.is_ok() {}
        }

        let status = child.wait().await.map_err(|e| InstallError::PacmanSpawn {
            message: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(InstallError::PacmanFailed {
                code: status.code().unwrap_or(-1),
            }
            .into())
        }
    }
}
