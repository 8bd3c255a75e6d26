//! One-way directory tree synchronization
//!
//! Mirrors a seed directory into a destination: new and changed files are
//! copied, entries present only in the destination are removed. Used to
//! keep a package's build directory in step with its local PKGBUILD
//! directory without clobbering unchanged files.
//!
//! Build products living next to the synced sources - the manifest,
//! generated srcinfo, makepkg's work dirs and package files - are never
//! removed, so re-synchronizing does not invalidate completed builds.

use pkgsmith_errors::{Error, SourceError};
use std::ffi::OsStr;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Destination-only entries produced by builds rather than by the seed
/// tree; the sync leaves them alone.
fn is_build_product(name: &OsStr) -> bool {
    if name == "build.json" || name == ".SRCINFO" || name == "src" || name == "pkg" {
        return true;
    }
    let name = name.to_string_lossy();
    name.contains(".pkg.tar") || name.ends_with(".log")
}

/// Synchronize the contents of `dest` with those found in `seed`.
///
/// Returns `true` when anything was copied or removed.
///
/// # Errors
///
/// Returns an error if either tree cannot be read or written.
pub async fn synctree(seed: &Path, dest: &Path) -> Result<bool, Error> {
    if !dest.exists() {
        copy_tree(seed, dest).await?;
        return Ok(true);
    }
    sync_dir(seed.to_path_buf(), dest.to_path_buf()).await
}

fn sync_dir(
    seed: std::path::PathBuf,
    dest: std::path::PathBuf,
) -> Pin<Box<dyn Future<Output = Result<bool, Error>> + Send>> {
    Box::pin(async move {
        let mut changed = false;

        let mut seed_names = Vec::new();
        let mut entries = read_dir(&seed).await?;
        while let Some(entry) = next_entry(&mut entries, &seed).await? {
            let name = entry.file_name();
            seed_names.push(name.clone());

            let seed_path = entry.path();
            let dest_path = dest.join(&name);
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::io_with_path(&e, &seed_path))?;

            if file_type.is_dir() {
                if dest_path.is_dir() {
                    changed |= sync_dir(seed_path, dest_path).await?;
                } else {
                    if dest_path.exists() {
                        remove(&dest_path).await?;
                    }
                    copy_tree(&seed_path, &dest_path).await?;
                    changed = true;
                }
            } else if !dest_path.is_file() || files_differ(&seed_path, &dest_path).await? {
                if dest_path.is_dir() {
                    remove(&dest_path).await?;
                }
                tokio::fs::copy(&seed_path, &dest_path)
                    .await
                    .map_err(|e| Error::io_with_path(&e, &dest_path))?;
                changed = true;
            }
        }

        // Anything only present in the destination is stale, unless a
        // build put it there.
        let mut entries = read_dir(&dest).await?;
        while let Some(entry) = next_entry(&mut entries, &dest).await? {
            let name = entry.file_name();
            if !seed_names.contains(&name) && !is_build_product(&name) {
                remove(&entry.path()).await?;
                changed = true;
            }
        }

        Ok(changed)
    })
}

/// Compare two files by size, then by content. PKGBUILD trees are small,
/// so a byte comparison is cheaper than getting mtime preservation right
/// across copies.
async fn files_differ(a: &Path, b: &Path) -> Result<bool, Error> {
    let meta_a = tokio::fs::metadata(a)
        .await
        .map_err(|e| Error::io_with_path(&e, a))?;
    let meta_b = tokio::fs::metadata(b)
        .await
        .map_err(|e| Error::io_with_path(&e, b))?;

    if meta_a.len() != meta_b.len() {
        return Ok(true);
    }

    let content_a = tokio::fs::read(a)
        .await
        .map_err(|e| Error::io_with_path(&e, a))?;
    let content_b = tokio::fs::read(b)
        .await
        .map_err(|e| Error::io_with_path(&e, b))?;
    Ok(content_a != content_b)
}

fn copy_tree(
    seed: &Path,
    dest: &Path,
) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send>> {
    let seed = seed.to_path_buf();
    let dest = dest.to_path_buf();
    Box::pin(async move {
        tokio::fs::create_dir_all(&dest)
            .await
            .map_err(|e| Error::io_with_path(&e, &dest))?;

        let mut entries = read_dir(&seed).await?;
        while let Some(entry) = next_entry(&mut entries, &seed).await? {
            let seed_path = entry.path();
            let dest_path = dest.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::io_with_path(&e, &seed_path))?;

            if file_type.is_dir() {
                copy_tree(&seed_path, &dest_path).await?;
            } else {
                tokio::fs::copy(&seed_path, &dest_path)
                    .await
                    .map_err(|e| Error::io_with_path(&e, &dest_path))?;
            }
        }
        Ok(())
    })
}

async fn remove(path: &Path) -> Result<(), Error> {
    let result = if path.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.map_err(|e| {
        SourceError::SyncFailed {
            message: format!("failed to remove {}: {e}", path.display()),
        }
        .into()
    })
}

async fn read_dir(path: &Path) -> Result<tokio::fs::ReadDir, Error> {
    tokio::fs::read_dir(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

async fn next_entry(
    entries: &mut tokio::fs::ReadDir,
    path: &Path,
) -> Result<Option<tokio::fs::DirEntry>, Error> {
    entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}
