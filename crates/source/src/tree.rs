//! Provider index over a directory of local PKGBUILDs
//!
//! Every subdirectory of the local root is scanned once per run; each
//! parsed PKGBUILD is registered under its base identity and every name
//! it provides, so dependency names can be resolved against the tree
//! under version restrictions.

use crate::pkgbuild::Pkgbuild;
use pkgsmith_errors::{Error, SourceError};
use pkgsmith_events::{AppEvent, EventEmitter, EventSender, ResolverEvent};
use pkgsmith_types::{satisfies_all, Restriction};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One `(name, version)` the tree can provide, with its providers in
/// scan order
#[derive(Debug)]
struct ProviderEntry {
    name: String,
    version: String,
    providers: Vec<Arc<Pkgbuild>>,
}

/// Index of a local PKGBUILD tree keyed by provided name and version
///
/// The index is an explicit per-run cache: the first `update` scans the
/// tree, later calls reuse the result unless forced. Subdirectories are
/// visited in sorted order so provider selection is deterministic.
#[derive(Debug)]
pub struct LocalTree {
    root: Option<PathBuf>,
    build_root: PathBuf,
    makepkg_conf: Option<PathBuf>,
    scanned: bool,
    entries: Vec<ProviderEntry>,
    event_sender: Option<EventSender>,
}

impl EventEmitter for LocalTree {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl LocalTree {
    #[must_use]
    pub fn new(
        root: Option<PathBuf>,
        build_root: PathBuf,
        makepkg_conf: Option<PathBuf>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            root,
            build_root,
            makepkg_conf,
            scanned: false,
            entries: Vec::new(),
            event_sender,
        }
    }

    /// Path of the indexed tree, if one is configured.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Scan the tree into the provider index.
    ///
    /// Reuses the previous scan unless `force` is set. Subdirectories
    /// without a PKGBUILD, and entries whose metadata cannot be read,
    /// are skipped with a warning rather than failing the whole scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree root itself cannot be read.
    pub async fn update(&mut self, force: bool) -> Result<(), Error> {
        let Some(root) = self.root.clone() else {
            return Ok(());
        };
        if self.scanned && !force {
            return Ok(());
        }
        self.entries.clear();

        let mut dirs = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&root)
            .await
            .map_err(|e| Error::io_with_path(&e, &root))?;
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &root))?
        {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        for dir in dirs {
            if !dir.join("PKGBUILD").exists() {
                continue;
            }
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let pkgbuild = Arc::new(Pkgbuild::new_local(
                name,
                &self.build_root,
                dir.clone(),
                self.makepkg_conf.clone(),
                self.event_sender.clone(),
            ));

            let srcinfo = match pkgbuild.srcinfo().await {
                Ok(srcinfo) => srcinfo.clone(),
                Err(e) => {
                    self.emit_warning(format!(
                        "skipping {} during tree scan: {e}",
                        dir.display()
                    ));
                    continue;
                }
            };

            self.register(&srcinfo.pkgbase, &srcinfo.pkgver, &pkgbuild);
            for provided in &srcinfo.provides {
                let (name, version) = match provided.split_once('=') {
                    Some((name, version)) => (name, version),
                    None => (provided.as_str(), srcinfo.pkgver.as_str()),
                };
                self.register(name, version, &pkgbuild);
            }
        }

        self.scanned = true;
        self.emit(AppEvent::Resolver(ResolverEvent::TreeScanned {
            root,
            providers: self.entries.len(),
        }));
        Ok(())
    }

    fn register(&mut self, name: &str, version: &str, pkgbuild: &Arc<Pkgbuild>) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.name == name && e.version == version)
        {
            entry.providers.push(Arc::clone(pkgbuild));
        } else {
            self.entries.push(ProviderEntry {
                name: name.to_string(),
                version: version.to_string(),
                providers: vec![Arc::clone(pkgbuild)],
            });
        }
    }

    /// Providers for a name under version restrictions, in scan order.
    ///
    /// The first structurally matching entry is authoritative; callers
    /// wanting a single provider take the head of the list.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ProviderNotFound`] carrying the attempted
    /// restrictions when nothing in the tree satisfies the name.
    pub fn providers(
        &self,
        name: &str,
        restrictions: &[Restriction],
    ) -> Result<Vec<Arc<Pkgbuild>>, Error> {
        let not_found = || SourceError::ProviderNotFound {
            name: name.to_string(),
            restrictions: restrictions.iter().map(ToString::to_string).collect(),
        };

        if self.root.is_none() || self.entries.is_empty() {
            return Err(not_found().into());
        }

        self.entries
            .iter()
            .find(|e| e.name == name && satisfies_all(&e.version, restrictions))
            .map(|e| e.providers.clone())
            .ok_or_else(|| not_found().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgsmith_types::Compare;
    use tempfile::tempdir;

    async fn seed_entry(root: &Path, dir: &str, srcinfo: &str) {
        let path = root.join(dir);
        tokio::fs::create_dir_all(&path).await.unwrap();
        tokio::fs::write(path.join("PKGBUILD"), b"# seeded\n")
            .await
            .unwrap();
        tokio::fs::write(path.join(".SRCINFO"), srcinfo).await.unwrap();
    }

    async fn scanned_tree(root: &Path, build_root: PathBuf) -> LocalTree {
        let mut tree = LocalTree::new(Some(root.to_path_buf()), build_root, None, None);
        tree.update(false).await.unwrap();
        tree
    }

    #[tokio::test]
    async fn scan_registers_base_and_provided_names() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("pkgbuilds");
        seed_entry(
            &root,
            "test1",
            "pkgbase = test1\n\tpkgver = 1\n\npkgname = test1\n",
        )
        .await;
        seed_entry(
            &root,
            "provider",
            "pkgbase = provider\n\tpkgver = 2\n\tprovides = virtual-pkg=3\n\npkgname = provider\n",
        )
        .await;

        let tree = scanned_tree(&root, temp.path().join("cache")).await;

        assert_eq!(tree.providers("test1", &[]).unwrap().len(), 1);
        assert_eq!(tree.providers("provider", &[]).unwrap().len(), 1);

        let virtual_providers = tree.providers("virtual-pkg", &[]).unwrap();
        assert_eq!(virtual_providers.len(), 1);
        assert_eq!(virtual_providers[0].name(), "provider");
    }

    #[tokio::test]
    async fn provides_without_version_default_to_pkgver() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("pkgbuilds");
        seed_entry(
            &root,
            "provider",
            "pkgbase = provider\n\tpkgver = 2\n\tprovides = virtual-pkg\n\npkgname = provider\n",
        )
        .await;

        let tree = scanned_tree(&root, temp.path().join("cache")).await;

        let restrictions = vec![Restriction::new(Compare::Equal, "2")];
        assert!(tree.providers("virtual-pkg", &restrictions).is_ok());
    }

    #[tokio::test]
    async fn restriction_filtering_and_error_payload() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("pkgbuilds");
        for (dir, version) in [("x1", "1"), ("x2", "2"), ("x3", "3")] {
            seed_entry(
                &root,
                dir,
                &format!(
                    "pkgbase = {dir}\n\tpkgver = {version}\n\tprovides = x={version}\n\npkgname = {dir}\n"
                ),
            )
            .await;
        }

        let tree = scanned_tree(&root, temp.path().join("cache")).await;

        let above_two = vec![Restriction::new(Compare::Greater, "2")];
        let providers = tree.providers("x", &above_two).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "x3");

        let above_three = vec![Restriction::new(Compare::Greater, "3")];
        let err = tree.providers("x", &above_three).unwrap_err();
        match err {
            Error::Source(SourceError::ProviderNotFound { name, restrictions }) => {
                assert_eq!(name, "x");
                assert_eq!(restrictions, vec![">3".to_string()]);
            }
            other => panic!("expected ProviderNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn entries_without_pkgbuild_are_skipped() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("pkgbuilds");
        tokio::fs::create_dir_all(root.join("not-a-package"))
            .await
            .unwrap();
        seed_entry(
            &root,
            "test1",
            "pkgbase = test1\n\tpkgver = 1\n\npkgname = test1\n",
        )
        .await;

        let tree = scanned_tree(&root, temp.path().join("cache")).await;
        assert!(tree.providers("test1", &[]).is_ok());
        assert!(tree.providers("not-a-package", &[]).is_err());
    }

    #[tokio::test]
    async fn unconfigured_tree_yields_provider_not_found() {
        let temp = tempdir().unwrap();
        let mut tree = LocalTree::new(None, temp.path().to_path_buf(), None, None);
        tree.update(false).await.unwrap();

        assert!(matches!(
            tree.providers("anything", &[]).unwrap_err(),
            Error::Source(SourceError::ProviderNotFound { .. })
        ));
    }
}
