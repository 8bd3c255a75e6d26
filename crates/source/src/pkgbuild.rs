//! Local and AUR-based PKGBUILD sources

use crate::srcinfo::Srcinfo;
use crate::sync::synctree;
use pkgsmith_aur::{AurClient, AurPackage, GitRepo};
use pkgsmith_errors::{AttemptedSources, Error, SourceError};
use pkgsmith_events::{AcquisitionEvent, AppEvent, BuildEvent, EventEmitter, EventSender};
use pkgsmith_types::{parse_restriction, DepKind, Restriction, SourcePreference};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Where a PKGBUILD comes from
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// A directory containing a PKGBUILD, synchronized into the build dir
    Local { source_dir: PathBuf },
    /// An AUR package, cloned or pulled into the build dir
    Aur { package: AurPackage },
}

/// A package's build description and the build directory it is built in
///
/// Derived metadata (`.SRCINFO` contents, the package list) is memoized
/// per instance; `update` is idempotent per run unless forced.
pub struct Pkgbuild {
    name: String,
    kind: SourceKind,
    build_dir: PathBuf,
    makepkg_conf: Option<PathBuf>,
    updated: AtomicBool,
    srcinfo: OnceCell<Srcinfo>,
    package_list: OnceCell<Vec<PathBuf>>,
    depends: OnceCell<HashMap<String, Vec<Restriction>>>,
    makedepends: OnceCell<HashMap<String, Vec<Restriction>>>,
    event_sender: Option<EventSender>,
}

impl std::fmt::Debug for Pkgbuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkgbuild")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("build_dir", &self.build_dir)
            .finish_non_exhaustive()
    }
}

impl EventEmitter for Pkgbuild {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Pkgbuild {
    /// Create a locally sourced PKGBUILD.
    #[must_use]
    pub fn new_local(
        name: impl Into<String>,
        build_root: &Path,
        source_dir: PathBuf,
        makepkg_conf: Option<PathBuf>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let name = name.into();
        let build_dir = build_root.join("local").join(&name);
        Self {
            name,
            kind: SourceKind::Local { source_dir },
            build_dir,
            makepkg_conf,
            updated: AtomicBool::new(false),
            srcinfo: OnceCell::new(),
            package_list: OnceCell::new(),
            depends: OnceCell::new(),
            makedepends: OnceCell::new(),
            event_sender,
        }
    }

    /// Create an AUR-based PKGBUILD.
    #[must_use]
    pub fn new_aur(
        package: AurPackage,
        build_root: &Path,
        makepkg_conf: Option<PathBuf>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let name = package.name.clone();
        let build_dir = build_root.join("aur").join(&name);
        Self {
            name,
            kind: SourceKind::Aur { package },
            build_dir,
            makepkg_conf,
            updated: AtomicBool::new(false),
            srcinfo: OnceCell::new(),
            package_list: OnceCell::new(),
            depends: OnceCell::new(),
            makedepends: OnceCell::new(),
            event_sender,
        }
    }

    /// Resolve a name to a concrete build source.
    ///
    /// The name may be a filesystem path (its directory becomes the local
    /// candidate and its final component the canonical name), or a bare
    /// name looked up under `local_root` and then on the AUR, subject to
    /// `preference`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NoPkgbuild`] when a candidate directory
    /// exists without a PKGBUILD file, and [`SourceError::SourceNotFound`]
    /// carrying the attempted source kinds when nothing satisfies the
    /// name.
    pub async fn locate(
        name: &str,
        build_root: &Path,
        local_root: Option<&Path>,
        preference: SourcePreference,
        aur: &AurClient,
        makepkg_conf: Option<&Path>,
        event_sender: Option<EventSender>,
    ) -> Result<Self, Error> {
        let mut resolved_name = name.to_string();
        let mut candidate: Option<PathBuf> = None;
        let mut looked_local = false;

        let as_path = Path::new(name);
        if as_path.exists() {
            let dir = tokio::fs::canonicalize(as_path)
                .await
                .map_err(|e| Error::io_with_path(&e, as_path))?;
            if let Some(file_name) = dir.file_name() {
                resolved_name = file_name.to_string_lossy().into_owned();
            }
            candidate = Some(dir);
        } else if let Some(root) = local_root {
            candidate = Some(root.join(name));
        }

        if let Some(dir) = candidate.take() {
            looked_local = true;
            if dir.exists() {
                if !dir.join("PKGBUILD").exists() {
                    return Err(SourceError::NoPkgbuild {
                        directory: dir.display().to_string(),
                    }
                    .into());
                }
                candidate = Some(dir);
            }
        }

        if preference.allows_local() {
            if let Some(dir) = candidate {
                return Ok(Self::new_local(
                    resolved_name,
                    build_root,
                    dir,
                    makepkg_conf.map(Path::to_path_buf),
                    event_sender,
                ));
            }
        }

        if !preference.allows_aur() {
            return Err(SourceError::SourceNotFound {
                name: resolved_name,
                attempted: AttemptedSources::Local,
            }
            .into());
        }

        if let Some(package) = aur.get_package(&resolved_name).await? {
            return Ok(Self::new_aur(
                package,
                build_root,
                makepkg_conf.map(Path::to_path_buf),
                event_sender,
            ));
        }

        let attempted = if preference.allows_local() && looked_local {
            AttemptedSources::Both
        } else {
            AttemptedSources::Aur
        };
        Err(SourceError::SourceNotFound {
            name: resolved_name,
            attempted,
        }
        .into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Short label for the source kind, used in resolution events.
    #[must_use]
    pub fn source_label(&self) -> &'static str {
        match self.kind {
            SourceKind::Local { .. } => "local",
            SourceKind::Aur { .. } => "aur",
        }
    }

    /// The directory this package is built in.
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Update the build directory from its source.
    ///
    /// Local sources are synchronized; AUR sources are cloned or pulled.
    /// Already performed this run unless `force` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if synchronization, cloning, or pulling fails.
    pub async fn update(&self, force: bool) -> Result<(), Error> {
        if self.updated.load(Ordering::Acquire) && !force {
            return Ok(());
        }

        if let Some(parent) = self.build_dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }

        let changed = match &self.kind {
            SourceKind::Local { source_dir } => synctree(source_dir, &self.build_dir).await?,
            SourceKind::Aur { package } => self.update_aur(package).await?,
        };

        if changed {
            self.emit(AppEvent::Acquisition(AcquisitionEvent::Synced {
                name: self.name.clone(),
                path: self.build_dir.clone(),
            }));
        }
        self.updated.store(true, Ordering::Release);
        Ok(())
    }

    async fn update_aur(&self, package: &AurPackage) -> Result<bool, Error> {
        if self.build_dir.exists() {
            let repo = GitRepo::new(&self.build_dir);
            if repo.is_repo().await {
                self.emit(AppEvent::Acquisition(AcquisitionEvent::Pulling {
                    name: self.name.clone(),
                    path: self.build_dir.clone(),
                }));
                return repo.pull().await;
            }
            // Not a checkout; start over from a fresh clone.
            self.remove().await?;
        }

        self.emit(AppEvent::Acquisition(AcquisitionEvent::Cloning {
            name: self.name.clone(),
            url: package.git_url.clone(),
        }));
        GitRepo::clone(&package.git_url, &self.build_dir).await?;
        Ok(true)
    }

    /// Remove the build directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub async fn remove(&self) -> Result<(), Error> {
        if !self.build_dir.exists() {
            return Ok(());
        }
        self.emit(AppEvent::Build(BuildEvent::RemovingBuildDir {
            package: self.name.clone(),
            path: self.build_dir.clone(),
        }));
        tokio::fs::remove_dir_all(&self.build_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.build_dir))?;
        self.updated.store(false, Ordering::Release);
        Ok(())
    }

    /// Parsed `.SRCINFO` metadata, memoized per instance.
    ///
    /// Reads the `.SRCINFO` file when it is newer than the PKGBUILD,
    /// otherwise regenerates it with `makepkg --printsrcinfo` and writes
    /// it back next to the PKGBUILD.
    ///
    /// # Errors
    ///
    /// Returns an error if the build directory cannot be updated, makepkg
    /// fails, or the srcinfo does not parse.
    pub async fn srcinfo(&self) -> Result<&Srcinfo, Error> {
        self.srcinfo
            .get_or_try_init(|| async {
                self.update(false).await?;

                let file = self.build_dir.join(".SRCINFO");
                let content = if self.srcinfo_is_fresh().await {
                    tokio::fs::read_to_string(&file)
                        .await
                        .map_err(|e| Error::io_with_path(&e, &file))?
                } else {
                    self.emit_debug(format!(
                        "{}: generating .SRCINFO in {}",
                        self.name,
                        self.build_dir.display()
                    ));
                    let content = self.run_makepkg("--printsrcinfo").await.map_err(|message| {
                        SourceError::SrcinfoFailed { message }
                    })?;
                    tokio::fs::write(&file, &content)
                        .await
                        .map_err(|e| Error::io_with_path(&e, &file))?;
                    content
                };

                Srcinfo::parse(&content)
            })
            .await
    }

    /// The package version declared by the PKGBUILD.
    ///
    /// # Errors
    ///
    /// Returns an error if the srcinfo cannot be obtained.
    pub async fn version(&self) -> Result<&str, Error> {
        Ok(&self.srcinfo().await?.pkgver)
    }

    /// Paths to the package files this PKGBUILD produces when built,
    /// memoized per instance (`makepkg --packagelist`).
    ///
    /// # Errors
    ///
    /// Returns an error if the build directory cannot be updated or
    /// makepkg fails.
    pub async fn package_list(&self) -> Result<&[PathBuf], Error> {
        let list = self
            .package_list
            .get_or_try_init(|| async {
                self.update(false).await?;
                let stdout = self.run_makepkg("--packagelist").await.map_err(|message| {
                    Error::from(SourceError::PackageListFailed { message })
                })?;
                Ok::<_, Error>(stdout.lines().map(PathBuf::from).collect())
            })
            .await?;
        Ok(list)
    }

    /// Runtime dependencies with their version restrictions.
    ///
    /// # Errors
    ///
    /// Returns an error if the srcinfo cannot be obtained.
    pub async fn depends(&self) -> Result<&HashMap<String, Vec<Restriction>>, Error> {
        self.depends
            .get_or_try_init(|| async { Ok(collect_deps(&self.srcinfo().await?.depends)) })
            .await
    }

    /// Build-only dependencies with their version restrictions.
    ///
    /// # Errors
    ///
    /// Returns an error if the srcinfo cannot be obtained.
    pub async fn makedepends(&self) -> Result<&HashMap<String, Vec<Restriction>>, Error> {
        self.makedepends
            .get_or_try_init(|| async { Ok(collect_deps(&self.srcinfo().await?.makedepends)) })
            .await
    }

    /// Classify a dependency name: runtime when declared in `depends`,
    /// build-only otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the srcinfo cannot be obtained.
    pub async fn dependency_kind(&self, name: &str) -> Result<DepKind, Error> {
        if self.depends().await?.contains_key(name) {
            Ok(DepKind::Runtime)
        } else {
            Ok(DepKind::Make)
        }
    }

    /// Restrictions this PKGBUILD declares for a dependency name, empty
    /// when the name is unrestricted or undeclared.
    ///
    /// # Errors
    ///
    /// Returns an error if the srcinfo cannot be obtained.
    pub async fn dependency_restrictions(&self, name: &str) -> Result<Vec<Restriction>, Error> {
        if let Some(restrictions) = self.depends().await?.get(name) {
            return Ok(restrictions.clone());
        }
        if let Some(restrictions) = self.makedepends().await?.get(name) {
            return Ok(restrictions.clone());
        }
        Ok(Vec::new())
    }

    /// Whether the synced `.SRCINFO` can be reused instead of running
    /// `makepkg --printsrcinfo`.
    ///
    /// Build-dir mtimes are set by the sync itself, so for local sources
    /// freshness is judged where the user edits: the source directory.
    async fn srcinfo_is_fresh(&self) -> bool {
        if !self.build_dir.join(".SRCINFO").exists() {
            return false;
        }
        match &self.kind {
            SourceKind::Local { source_dir } => {
                not_newer(
                    &source_dir.join("PKGBUILD"),
                    &source_dir.join(".SRCINFO"),
                )
                .await
            }
            SourceKind::Aur { .. } => {
                not_newer(
                    &self.build_dir.join("PKGBUILD"),
                    &self.build_dir.join(".SRCINFO"),
                )
                .await
            }
        }
    }

    /// Run makepkg in the build directory, returning captured stdout or
    /// a failure message.
    async fn run_makepkg(&self, arg: &str) -> Result<String, String> {
        let mut cmd = Command::new("makepkg");
        cmd.arg(arg);
        if let Some(conf) = &self.makepkg_conf {
            cmd.arg("--config").arg(conf);
        }
        cmd.current_dir(&self.build_dir);

        let output = cmd.output().await.map_err(|e| e.to_string())?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).into_owned());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// True when `a` is not newer than `b` by modification time. Missing
/// files or unavailable mtimes count as newer.
async fn not_newer(a: &Path, b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (
        tokio::fs::metadata(a).await,
        tokio::fs::metadata(b).await,
    ) else {
        return false;
    };
    match (meta_a.modified(), meta_b.modified()) {
        (Ok(mtime_a), Ok(mtime_b)) => mtime_a <= mtime_b,
        _ => false,
    }
}

/// Fold dependency tokens into a name -> restrictions map, deduplicating
/// repeated restrictions on the same name.
fn collect_deps(tokens: &[String]) -> HashMap<String, Vec<Restriction>> {
    let mut deps: HashMap<String, Vec<Restriction>> = HashMap::new();
    for token in tokens {
        let (name, restriction) = parse_restriction(token);
        let entry = deps.entry(name.to_string()).or_default();
        if let Some(restriction) = restriction {
            if !entry.contains(&restriction) {
                entry.push(restriction);
            }
        }
    }
    deps
}
