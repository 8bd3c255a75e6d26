//! Domain-driven event definitions

use pkgsmith_types::DepKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level event type, grouped by functional domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    General(GeneralEvent),
    Build(BuildEvent),
    Resolver(ResolverEvent),
    Acquisition(AcquisitionEvent),
    Install(InstallEvent),
    Repo(RepoEvent),
}

/// General-purpose events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GeneralEvent {
    Debug { message: String },
    Operation { message: String },
    Warning { message: String },
    Error { message: String },
}

/// Chroot build lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BuildEvent {
    /// A build pass is starting for a package.
    Started { package: String, pass: u32 },
    /// The package was already built and verified; no chroot invocation.
    CacheHit { package: String },
    /// The package will be rebuilt even though artifacts exist.
    Rebuilding { package: String },
    /// A captured line of build tool output, mirrored as it arrives.
    Output { line: String },
    /// A missing dependency was discovered from build tool output.
    MissingDependency {
        package: String,
        dependency: String,
        kind: DepKind,
    },
    /// The build completed and its manifest was saved.
    Succeeded { package: String, artifacts: usize },
    /// The build failed terminally.
    Failed { package: String, passes: u32 },
    /// The chroot is being created.
    ChrootCreating { path: PathBuf },
    /// A package build directory is being removed.
    RemovingBuildDir { package: String, path: PathBuf },
}

/// Source resolution events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolverEvent {
    /// Resolution started for a name.
    Resolving { name: String },
    /// A name resolved to a concrete source.
    Resolved { name: String, source: String },
    /// The local PKGBUILD tree was scanned into the provider index.
    TreeScanned { root: PathBuf, providers: usize },
}

/// Source acquisition events (AUR downloads, clones, tree sync)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AcquisitionEvent {
    DownloadStarted { name: String, url: String },
    DownloadCompleted { name: String },
    Cloning { name: String, url: String },
    Pulling { name: String, path: PathBuf },
    Synced { name: String, path: PathBuf },
}

/// Package installation events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InstallEvent {
    /// A pacman invocation is starting.
    Installing { packages: usize, as_deps: bool },
    /// The pacman invocation finished.
    Installed { packages: usize },
}

/// Local repository events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RepoEvent {
    /// Packages were added to a local repository database.
    Added { repo: String, packages: usize },
}
