//! Integration tests for PKGBUILD source resolution

use pkgsmith_aur::AurClient;
use pkgsmith_errors::{AttemptedSources, Error, SourceError};
use pkgsmith_source::{LocalTree, Pkgbuild};
use pkgsmith_types::SourcePreference;
use std::path::Path;
use tempfile::tempdir;

fn offline_aur() -> AurClient {
    // Points at a closed port; tests that reach the AUR path are
    // expected to fail before any request is made.
    AurClient::new("http://127.0.0.1:9", None).unwrap()
}

async fn seed_pkgbuild(root: &Path, name: &str, srcinfo: &str) {
    let dir = root.join(name);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("PKGBUILD"), b"# seeded\n")
        .await
        .unwrap();
    tokio::fs::write(dir.join(".SRCINFO"), srcinfo).await.unwrap();
}

#[tokio::test]
async fn name_resolves_under_the_local_root() {
    let temp = tempdir().unwrap();
    let local_root = temp.path().join("pkgbuilds");
    seed_pkgbuild(
        &local_root,
        "test1",
        "pkgbase = test1\n\tpkgver = 1\n\npkgname = test1\n",
    )
    .await;

    let pkgbuild = Pkgbuild::locate(
        "test1",
        &temp.path().join("cache"),
        Some(&local_root),
        SourcePreference::Local,
        &offline_aur(),
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(pkgbuild.name(), "test1");
    assert_eq!(pkgbuild.source_label(), "local");
    assert_eq!(pkgbuild.version().await.unwrap(), "1");
}

#[tokio::test]
async fn local_only_resolution_never_touches_the_aur() {
    let temp = tempdir().unwrap();

    let err = Pkgbuild::locate(
        "no-such-package",
        &temp.path().join("cache"),
        None,
        SourcePreference::Local,
        &offline_aur(),
        None,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Source(SourceError::SourceNotFound {
            attempted: AttemptedSources::Local,
            ..
        })
    ));
}

#[tokio::test]
async fn tree_resolution_prefers_scan_order() {
    let temp = tempdir().unwrap();
    let local_root = temp.path().join("pkgbuilds");
    // Both entries provide the same virtual name at the same version;
    // sorted scan order makes "aaa" the authoritative first provider.
    seed_pkgbuild(
        &local_root,
        "bbb",
        "pkgbase = bbb\n\tpkgver = 1\n\tprovides = virt=1\n\npkgname = bbb\n",
    )
    .await;
    seed_pkgbuild(
        &local_root,
        "aaa",
        "pkgbase = aaa\n\tpkgver = 1\n\tprovides = virt=1\n\npkgname = aaa\n",
    )
    .await;

    let mut tree = LocalTree::new(
        Some(local_root),
        temp.path().join("cache"),
        None,
        None,
    );
    tree.update(false).await.unwrap();

    let providers = tree.providers("virt", &[]).unwrap();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0].name(), "aaa");
    assert_eq!(providers[1].name(), "bbb");
}

#[tokio::test]
async fn forced_rescan_picks_up_new_entries() {
    let temp = tempdir().unwrap();
    let local_root = temp.path().join("pkgbuilds");
    seed_pkgbuild(
        &local_root,
        "first",
        "pkgbase = first\n\tpkgver = 1\n\npkgname = first\n",
    )
    .await;

    let mut tree = LocalTree::new(
        Some(local_root.clone()),
        temp.path().join("cache"),
        None,
        None,
    );
    tree.update(false).await.unwrap();
    assert!(tree.providers("second", &[]).is_err());

    seed_pkgbuild(
        &local_root,
        "second",
        "pkgbase = second\n\tpkgver = 1\n\npkgname = second\n",
    )
    .await;

    // Unforced update reuses the previous scan.
    tree.update(false).await.unwrap();
    assert!(tree.providers("second", &[]).is_err());

    tree.update(true).await.unwrap();
    assert!(tree.providers("second", &[]).is_ok());
}
