#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration for pkgsmith
//!
//! Configuration is read from a TOML file with serde defaults carrying the
//! stock Arch paths. Precedence is: defaults, then file, then environment,
//! then CLI flags (applied by the caller).

use pkgsmith_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pkgsmith/config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub aur: AurConfig,
}

/// Filesystem locations used across the build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Package build directory root
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// Chroot working directory
    #[serde(default = "default_chroot_dir")]
    pub chroot_dir: PathBuf,
    /// pacman configuration file
    #[serde(default = "default_pacman_conf")]
    pub pacman_conf: PathBuf,
    /// makepkg configuration file
    #[serde(default = "default_makepkg_conf")]
    pub makepkg_conf: PathBuf,
    /// Directory of local PKGBUILDs, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<PathBuf>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            chroot_dir: default_chroot_dir(),
            pacman_conf: default_pacman_conf(),
            makepkg_conf: default_makepkg_conf(),
            local_dir: None,
        }
    }
}

/// AUR endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AurConfig {
    #[serde(default = "default_aur_url")]
    pub url: String,
}

impl Default for AurConfig {
    fn default() -> Self {
        Self {
            url: default_aur_url(),
        }
    }
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("/var/cache/pkgsmith")
}

fn default_chroot_dir() -> PathBuf {
    PathBuf::from("/var/lib/pkgsmith")
}

fn default_pacman_conf() -> PathBuf {
    PathBuf::from("/etc/pacman.conf")
}

fn default_makepkg_conf() -> PathBuf {
    PathBuf::from("/etc/makepkg.conf")
}

fn default_aur_url() -> String {
    "https://aur.archlinux.org".to_string()
}

impl Config {
    /// Load configuration from a file, or fall back to defaults when no
    /// file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| {
            ConfigError::Invalid {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Merge environment variable overrides.
    pub fn merge_env(&mut self) {
        if let Ok(dir) = std::env::var("PKGSMITH_BUILD_DIR") {
            self.paths.build_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("PKGSMITH_CHROOT_DIR") {
            self.paths.chroot_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("PKGSMITH_AUR_URL") {
            self.aur.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_stock_arch_paths() {
        let config = Config::default();
        assert_eq!(config.paths.build_dir, Path::new("/var/cache/pkgsmith"));
        assert_eq!(config.paths.chroot_dir, Path::new("/var/lib/pkgsmith"));
        assert_eq!(config.paths.pacman_conf, Path::new("/etc/pacman.conf"));
        assert_eq!(config.paths.makepkg_conf, Path::new("/etc/makepkg.conf"));
        assert!(config.paths.local_dir.is_none());
        assert_eq!(config.aur.url, "https://aur.archlinux.org");
    }

    #[test]
    fn partial_file_fills_missing_fields_from_defaults() {
        let config = Config::from_toml(
            r#"
            [paths]
            build_dir = "/tmp/smith"
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.build_dir, Path::new("/tmp/smith"));
        assert_eq!(config.paths.chroot_dir, Path::new("/var/lib/pkgsmith"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_toml("paths = 3").is_err());
    }
}
