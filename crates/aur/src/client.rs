//! AUR RPC client with per-run response memoization

use dashmap::DashMap;
use flate2::read::GzDecoder;
use pkgsmith_errors::{AurError, Error};
use pkgsmith_events::{AcquisitionEvent, AppEvent, EventEmitter, EventSender};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive as TarArchive;
use tokio::task;

use crate::git::GitRepo;

/// Package info returned by an RPC `info` query
#[derive(Debug, Clone, Deserialize)]
pub struct AurInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "URLPath")]
    pub url_path: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    results: Vec<AurInfo>,
}

/// An AUR package whose sources can be downloaded or cloned
#[derive(Debug, Clone)]
pub struct AurPackage {
    pub name: String,
    pub version: String,
    /// Snapshot tarball URL
    pub snapshot_url: String,
    /// Git repository URL
    pub git_url: String,
}

impl AurPackage {
    /// Derive download and clone URLs from RPC info.
    #[must_use]
    pub fn from_info(base_url: &str, info: &AurInfo) -> Self {
        Self {
            name: info.name.clone(),
            version: info.version.clone(),
            snapshot_url: format!("{base_url}{}", info.url_path),
            git_url: format!("{base_url}/{}.git", info.name),
        }
    }
}

/// AUR RPC client
///
/// Lookups are memoized for the lifetime of the client, so repeated
/// resolution of the same name during one run performs one request. The
/// cache is an explicit per-run object; build a new client to discard it.
#[derive(Debug)]
pub struct AurClient {
    url: String,
    client: reqwest::Client,
    cache: DashMap<String, AurInfo>,
    event_sender: Option<EventSender>,
}

impl EventEmitter for AurClient {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl AurClient {
    /// Create a client against an AUR endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>, event_sender: Option<EventSender>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(format!("pkgsmith/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AurError::RequestFailed {
                message: e.to_string(),
            })?;

        Ok(Self {
            url: url.into(),
            client,
            cache: DashMap::new(),
            event_sender,
        })
    }

    /// Look up info for a package, memoized per run.
    ///
    /// Returns `None` when the AUR does not know the name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not valid
    /// RPC JSON.
    pub async fn info(&self, name: &str) -> Result<Option<AurInfo>, Error> {
        if let Some(info) = self.cache.get(name) {
            return Ok(Some(info.clone()));
        }

        let url = format!("{}/rpc/?v=5&type=info&arg[]={name}", self.url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AurError::RequestFailed {
                message: e.to_string(),
            })?;
        let body: RpcResponse = response.json().await.map_err(|e| AurError::InvalidResponse {
            message: e.to_string(),
        })?;

        let mut found = None;
        for info in body.results {
            if info.name == name {
                found = Some(info.clone());
            }
            self.cache.insert(info.name.clone(), info);
        }

        Ok(found)
    }

    /// Get an AUR package that can be downloaded or cloned.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails; an unknown name is `None`.
    pub async fn get_package(&self, name: &str) -> Result<Option<AurPackage>, Error> {
        let Some(info) = self.info(name).await? else {
            return Ok(None);
        };

        Ok(Some(AurPackage::from_info(&self.url, &info)))
    }

    /// Download and extract a package's snapshot tarball to `dest`.
    ///
    /// Snapshot tarballs nest everything under a leading `<name>/`
    /// component, which is stripped so `dest` becomes the PKGBUILD
    /// directory itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or extraction fails.
    pub async fn download_snapshot(&self, package: &AurPackage, dest: &Path) -> Result<(), Error> {
        self.emit(AppEvent::Acquisition(AcquisitionEvent::DownloadStarted {
            name: package.name.clone(),
            url: package.snapshot_url.clone(),
        }));

        let response = self
            .client
            .get(&package.snapshot_url)
            .send()
            .await
            .map_err(|e| AurError::DownloadFailed {
                url: package.snapshot_url.clone(),
                message: e.to_string(),
            })?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AurError::DownloadFailed {
                url: package.snapshot_url.clone(),
                message: e.to_string(),
            })?;

        let name = package.name.clone();
        let dest = dest.to_path_buf();
        task::spawn_blocking(move || extract_snapshot(&bytes, &name, &dest))
            .await
            .map_err(|e| Error::internal(format!("extraction task failed: {e}")))??;

        self.emit(AppEvent::Acquisition(AcquisitionEvent::DownloadCompleted {
            name: package.name.clone(),
        }));
        Ok(())
    }

    /// Clone a package's git repository to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dest` already exists or the clone fails.
    pub async fn clone_package(&self, package: &AurPackage, dest: &Path) -> Result<(), Error> {
        self.emit(AppEvent::Acquisition(AcquisitionEvent::Cloning {
            name: package.name.clone(),
            url: package.git_url.clone(),
        }));
        GitRepo::clone(&package.git_url, dest).await
    }
}

/// Extract a gzipped snapshot tarball, stripping the leading `prefix/`
/// path component.
fn extract_snapshot(bytes: &[u8], prefix: &str, dest: &Path) -> Result<(), Error> {
    let tar = GzDecoder::new(bytes);
    let mut archive = TarArchive::new(tar);

    let map_err = |e: std::io::Error| AurError::ExtractFailed {
        message: e.to_string(),
    };

    std::fs::create_dir_all(dest).map_err(map_err)?;

    for entry in archive.entries().map_err(map_err)? {
        let mut entry = entry.map_err(map_err)?;
        let path = entry.path().map_err(map_err)?;
        let Ok(stripped) = path.strip_prefix(prefix) else {
            continue;
        };
        if stripped.as_os_str().is_empty() {
            continue;
        }
        let target: PathBuf = dest.join(stripped);
        entry.unpack(&target).map_err(map_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_response_parses_results() {
        let json = r#"{
            "version": 5,
            "type": "multiinfo",
            "resultcount": 1,
            "results": [{
                "Name": "ripgrep-git",
                "Version": "14.1.0.r12.gdeadbee-1",
                "URLPath": "/cgit/aur.git/snapshot/ripgrep-git.tar.gz"
            }]
        }"#;

        let response: RpcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].name, "ripgrep-git");
    }

    #[test]
    fn rpc_response_tolerates_missing_results() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"version": 5, "type": "error"}"#).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn snapshot_extraction_strips_leading_component() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        // Build a small foo/PKGBUILD tarball in memory.
        let mut builder = tar::Builder::new(Vec::new());
        let content = b"pkgname=foo\npkgver=1\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "foo/PKGBUILD", &content[..])
            .unwrap();
        let tarball = builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tarball).unwrap();
        let gz = encoder.finish().unwrap();

        let temp = tempfile::tempdir().unwrap();
        extract_snapshot(&gz, "foo", temp.path()).unwrap();

        let extracted = std::fs::read_to_string(temp.path().join("PKGBUILD")).unwrap();
        assert!(extracted.contains("pkgname=foo"));
    }
}
