#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Recursive package builder for pkgsmith
//!
//! The builder drives build attempts against an isolated build
//! environment. There is no upfront dependency graph: missing
//! dependencies are discovered from the failing build's output
//! (`error: target not found: <name>`), resolved, built recursively, and
//! the parent build is retried once with their package files available.
//! Every successful build persists a manifest that short-circuits later
//! runs.

mod environment;

pub use environment::BuildEnvironment;

use pkgsmith_aur::AurClient;
use pkgsmith_chroot::CommandOutput;
use pkgsmith_errors::{BuildError, Error};
use pkgsmith_events::{
    AppEvent, BuildEvent, EventEmitter, EventSender, ResolverEvent,
};
use pkgsmith_manifest::Manifest;
use pkgsmith_pacman::{LocalRepo, Pacman};
use pkgsmith_source::{LocalTree, Pkgbuild};
use pkgsmith_types::{parse_restriction, DepKind, Restriction, SourcePreference};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

/// How much of a previously built tree to rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rebuild {
    /// Reuse verified manifests wherever possible.
    #[default]
    No,
    /// Rebuild the requested package, reusing built dependencies.
    Package,
    /// Rebuild the requested package and every dependency.
    Tree,
}

impl Rebuild {
    fn is_rebuild(self) -> bool {
        self != Self::No
    }

    /// What child builders inherit.
    fn child(self) -> Self {
        if self == Self::Tree {
            Self::Tree
        } else {
            Self::No
        }
    }
}

/// Shared settings for a build run
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Root of per-package build directories
    pub build_root: PathBuf,
    /// pacman configuration file, if not the system default
    pub pacman_conf: Option<PathBuf>,
    /// makepkg configuration file, if not the system default
    pub makepkg_conf: Option<PathBuf>,
    /// Directory of local PKGBUILDs, if any
    pub local_root: Option<PathBuf>,
    /// Which source kinds resolution may use
    pub preference: SourcePreference,
}

/// A recursive package builder
///
/// One builder owns one resolved PKGBUILD and the manifest of its build
/// directory. Child builders for discovered dependencies are created by
/// the recursion and dropped with it; only their produced package paths
/// are merged back, by value.
#[derive(Debug)]
pub struct Builder<E: BuildEnvironment> {
    name: String,
    manifest: Manifest,
    pkgbuild: Arc<Pkgbuild>,
    tree: Arc<LocalTree>,
    env: Arc<E>,
    aur: Arc<AurClient>,
    ctx: BuildContext,
    event_sender: Option<EventSender>,
}

impl<E: BuildEnvironment> EventEmitter for Builder<E> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl<E: BuildEnvironment> Builder<E> {
    /// Resolve a package name and prepare a builder for it.
    ///
    /// Scans the local PKGBUILD tree (when one is configured) so that
    /// dependency names can later be resolved against it.
    ///
    /// # Errors
    ///
    /// Returns a resolution error when no source satisfies the name; see
    /// [`Pkgbuild::locate`].
    pub async fn new(
        name: &str,
        ctx: BuildContext,
        env: Arc<E>,
        aur: Arc<AurClient>,
        event_sender: Option<EventSender>,
    ) -> Result<Self, Error> {
        event_sender.emit(AppEvent::Resolver(ResolverEvent::Resolving {
            name: name.to_string(),
        }));

        let mut tree = LocalTree::new(
            ctx.local_root.clone(),
            ctx.build_root.clone(),
            ctx.makepkg_conf.clone(),
            event_sender.clone(),
        );
        tree.update(false).await?;

        let pkgbuild = Pkgbuild::locate(
            name,
            &ctx.build_root,
            ctx.local_root.as_deref(),
            ctx.preference,
            &aur,
            ctx.makepkg_conf.as_deref(),
            event_sender.clone(),
        )
        .await?;

        event_sender.emit(AppEvent::Resolver(ResolverEvent::Resolved {
            name: pkgbuild.name().to_string(),
            source: pkgbuild.source_label().to_string(),
        }));

        Ok(Self::assemble(
            Arc::new(pkgbuild),
            Arc::new(tree),
            ctx,
            env,
            aur,
            event_sender,
        ))
    }

    fn assemble(
        pkgbuild: Arc<Pkgbuild>,
        tree: Arc<LocalTree>,
        ctx: BuildContext,
        env: Arc<E>,
        aur: Arc<AurClient>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let name = pkgbuild.name().to_string();
        let manifest = Manifest::new(&name, pkgbuild.build_dir());
        Self {
            name,
            manifest,
            pkgbuild,
            tree,
            env,
            aur,
            ctx,
            event_sender,
        }
    }

    /// Builder for a discovered dependency.
    ///
    /// When local sources are allowed and a tree is configured, the
    /// dependency is resolved through the provider index under the
    /// declared restrictions; the first matching provider is
    /// authoritative. Otherwise resolution falls back to the general
    /// name lookup.
    async fn child(&self, name: &str, restrictions: &[Restriction]) -> Result<Self, Error> {
        self.emit(AppEvent::Resolver(ResolverEvent::Resolving {
            name: name.to_string(),
        }));

        let pkgbuild = if self.ctx.preference.allows_local() && self.tree.root().is_some() {
            let providers = self.tree.providers(name, restrictions)?;
            Arc::clone(&providers[0])
        } else {
            Arc::new(
                Pkgbuild::locate(
                    name,
                    &self.ctx.build_root,
                    None,
                    self.ctx.preference,
                    &self.aur,
                    self.ctx.makepkg_conf.as_deref(),
                    self.event_sender.clone(),
                )
                .await?,
            )
        };

        self.emit(AppEvent::Resolver(ResolverEvent::Resolved {
            name: pkgbuild.name().to_string(),
            source: pkgbuild.source_label().to_string(),
        }));

        Ok(Self::assemble(
            pkgbuild,
            Arc::clone(&self.tree),
            self.ctx.clone(),
            Arc::clone(&self.env),
            Arc::clone(&self.aur),
            self.event_sender.clone(),
        ))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    #[must_use]
    pub fn pkgbuild(&self) -> &Pkgbuild {
        &self.pkgbuild
    }

    /// Build the package, discovering and building missing dependencies.
    ///
    /// Returns the paths of the built runtime packages, or an empty set
    /// when the build failed terminally.
    ///
    /// # Errors
    ///
    /// Returns an error when resolution of a discovered dependency fails
    /// or the build environment cannot be driven at all; a failing build
    /// is reported through the empty return set.
    pub async fn build(&mut self, rebuild: Rebuild) -> Result<BTreeSet<PathBuf>, Error> {
        self.build_pass(rebuild, 1).await
    }

    /// One build pass. Dependency discovery happens only on the first
    /// failing pass, followed by exactly one retry; recursion into child
    /// builds gives each dependency its own discovery-and-retry cycle.
    fn build_pass(
        &mut self,
        rebuild: Rebuild,
        pass: u32,
    ) -> Pin<Box<dyn Future<Output = Result<BTreeSet<PathBuf>, Error>> + '_>> {
        Box::pin(async move {
            if pass == 1 {
                if rebuild.is_rebuild() {
                    self.emit(AppEvent::Build(BuildEvent::Rebuilding {
                        package: self.name.clone(),
                    }));
                    self.manifest.reset();
                } else if self.manifest.load().await && self.manifest.verify(None) {
                    self.emit(AppEvent::Build(BuildEvent::CacheHit {
                        package: self.name.clone(),
                    }));
                    return Ok(self.manifest.runtime_packages());
                } else {
                    self.manifest.reset();
                }
            }

            self.emit(AppEvent::Build(BuildEvent::Started {
                package: self.name.clone(),
                pass,
            }));

            self.pkgbuild.update(false).await?;
            let deps = self.manifest.build_depends();
            let output = self.env.build(self.pkgbuild.build_dir(), &deps).await?;

            if output.success() {
                let produced = self.pkgbuild.package_list().await?.to_vec();
                self.manifest.add_packages(produced);
                if self.manifest.verify(None) {
                    self.manifest.save().await?;
                    self.emit(AppEvent::Build(BuildEvent::Succeeded {
                        package: self.name.clone(),
                        artifacts: self.manifest.all_packages().len(),
                    }));
                    return Ok(self.manifest.runtime_packages());
                }
                // Exit status said success but artifacts are missing;
                // treated as a terminal failure.
            } else if pass == 1 {
                self.discover_dependencies(&output, rebuild).await?;
                if !self.manifest.build_depends().is_empty() {
                    return self.build_pass(rebuild, pass + 1).await;
                }
            }

            self.emit(AppEvent::Build(BuildEvent::Failed {
                package: self.name.clone(),
                passes: pass,
            }));
            Ok(BTreeSet::new())
        })
    }

    /// Parse the failed pass's output for missing dependencies, build
    /// each one, and merge its packages into the matching manifest set.
    async fn discover_dependencies(
        &mut self,
        output: &CommandOutput,
        rebuild: Rebuild,
    ) -> Result<(), Error> {
        for line in &output.stdout {
            let Some(token) = parse_missing_target(line) else {
                continue;
            };
            let (dep_name, _) = parse_restriction(token);

            let kind = self.pkgbuild.dependency_kind(dep_name).await?;
            self.emit(AppEvent::Build(BuildEvent::MissingDependency {
                package: self.name.clone(),
                dependency: dep_name.to_string(),
                kind,
            }));

            let restrictions = self.pkgbuild.dependency_restrictions(dep_name).await?;
            let mut child = self.child(dep_name, &restrictions).await?;
            child.build_pass(rebuild.child(), 1).await?;

            match kind {
                DepKind::Runtime => self
                    .manifest
                    .add_depends(child.manifest.packages().iter().cloned()),
                DepKind::Make => self
                    .manifest
                    .add_makedepends(child.manifest.packages().iter().cloned()),
            }
        }
        Ok(())
    }

    /// Install built packages, building first if necessary.
    ///
    /// With `repo`, the packages are added to that local repository and
    /// installed through pacman's sync machinery instead of `-U`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Failed`] when the package cannot be built,
    /// or an install/repo error from the pacman step.
    pub async fn install(
        &mut self,
        reinstall: bool,
        sysroot: Option<PathBuf>,
        repo: Option<&str>,
        confirm: bool,
    ) -> Result<BTreeSet<PathBuf>, Error> {
        if self.manifest.runtime_packages().is_empty() || !self.manifest.verify(None) {
            let built = self.build(Rebuild::No).await?;
            if built.is_empty() {
                return Err(BuildError::Failed {
                    package: self.name.clone(),
                }
                .into());
            }
        }

        let pacman = Pacman::new(self.ctx.pacman_conf.clone())
            .with_sysroot(sysroot)
            .with_confirm(confirm)
            .with_events(self.event_sender.clone());

        if let Some(repo) = repo {
            let repo = LocalRepo::open(
                repo,
                self.ctx.pacman_conf.as_deref(),
                self.event_sender.clone(),
            )
            .await?;
            self.manifest.add_to_repo(&repo).await?;
            pacman.sync_install(&self.name).await?;
        } else {
            self.manifest.install(&pacman, reinstall).await?;
        }

        Ok(self.manifest.runtime_packages())
    }

    /// Remove the package's build directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub async fn remove_build_dir(&self) -> Result<(), Error> {
        self.pkgbuild.remove().await
    }
}

/// Extract the missing dependency token from a
/// `error: target not found: <name>` line.
fn parse_missing_target(line: &str) -> Option<&str> {
    let mut fields = line.splitn(3, ": ");
    if fields.next()? != "error" || fields.next()? != "target not found" {
        return None;
    }
    fields.next()
}
