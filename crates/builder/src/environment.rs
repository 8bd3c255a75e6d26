//! The isolated build environment seam

use pkgsmith_chroot::{Chroot, CommandOutput};
use pkgsmith_errors::Error;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// An isolated environment that builds a prepared package directory.
///
/// Implementations receive the package's build directory and the paths
/// of pre-built dependency package files to make available inside the
/// environment. On failure, the returned stdout lines must carry one
/// `error: target not found: <name>` line per missing dependency - that
/// textual contract is the only signal dependency discovery has.
#[allow(async_fn_in_trait)]
pub trait BuildEnvironment {
    /// Attempt to build the package prepared in `build_dir`.
    ///
    /// A failing build is a normal result carrying its exit code and
    /// output; only being unable to drive the environment is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be set up or invoked.
    async fn build(
        &self,
        build_dir: &Path,
        deps: &BTreeSet<PathBuf>,
    ) -> Result<CommandOutput, Error>;
}

impl BuildEnvironment for Chroot {
    async fn build(
        &self,
        build_dir: &Path,
        deps: &BTreeSet<PathBuf>,
    ) -> Result<CommandOutput, Error> {
        self.makepkg(build_dir, deps).await
    }
}
