//! Chroot mirrorlist management
//!
//! Reads and rewrites the chroot's pacman mirrorlist, including pinning
//! it to the Arch Linux Archive repository of a given date. Databases are
//! refreshed after every write so the chroot sees the change.

use crate::Chroot;
use chrono::NaiveDate;
use pkgsmith_errors::Error;
use std::path::PathBuf;

/// Arch Linux Archive repository root
pub const ARCHIVE_URL: &str = "https://archive.archlinux.org/repos";

/// A chroot's mirrorlist
pub struct Mirrorlist<'c> {
    chroot: &'c Chroot,
    pub mirrors: Vec<String>,
}

impl<'c> Mirrorlist<'c> {
    #[must_use]
    pub(crate) fn new(chroot: &'c Chroot) -> Self {
        Self {
            chroot,
            mirrors: Vec::new(),
        }
    }

    /// Path of the mirrorlist file inside the chroot.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.chroot.root().join("etc/pacman.d/mirrorlist")
    }

    /// Render the mirrorlist file content.
    #[must_use]
    pub fn render(&self) -> String {
        let mut content = String::new();
        for mirror in &self.mirrors {
            content.push_str("Server = ");
            content.push_str(mirror);
            content.push('\n');
        }
        content
    }

    /// Read the mirrors from the mirrorlist file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read(&mut self) -> Result<&[String], Error> {
        let path = self.path();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;

        self.mirrors = content
            .lines()
            .filter_map(|line| line.trim().strip_prefix("Server = "))
            .map(|url| url.trim().to_string())
            .collect();
        Ok(&self.mirrors)
    }

    /// Write the mirrors to the mirrorlist file and refresh databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the database refresh fails.
    pub async fn write(&self) -> Result<(), Error> {
        let path = self.path();
        tokio::fs::write(&path, self.render())
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        self.chroot.refresh().await
    }

    /// Copy an existing mirrorlist file into the chroot and refresh
    /// databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy, the refresh, or the re-read fails.
    pub async fn copy(&mut self, from: &std::path::Path) -> Result<(), Error> {
        let path = self.path();
        tokio::fs::copy(from, &path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        self.chroot.refresh().await?;
        self.read().await?;
        Ok(())
    }

    /// Make the given mirror the chroot's only mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the mirrorlist fails.
    pub async fn set(&mut self, mirror: impl Into<String>, write: bool) -> Result<(), Error> {
        self.mirrors = vec![mirror.into()];
        if write {
            self.write().await?;
        }
        Ok(())
    }

    /// Append a mirror to the chroot's mirrorlist.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the mirrorlist fails.
    pub async fn add(&mut self, mirror: impl Into<String>, write: bool) -> Result<(), Error> {
        self.mirrors.push(mirror.into());
        if write {
            self.write().await?;
        }
        Ok(())
    }

    /// Pin the chroot to the Arch Linux Archive repository of a date.
    ///
    /// Returns the mirror URL that was set.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the mirrorlist fails.
    pub async fn set_date(&mut self, date: NaiveDate, write: bool) -> Result<String, Error> {
        let mirror = format!(
            "{ARCHIVE_URL}/{}/$repo/os/$arch",
            date.format("%Y/%m/%d")
        );
        self.set(mirror.clone(), write).await?;
        Ok(mirror)
    }
}
