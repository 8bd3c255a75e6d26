//! Command line interface definition

use clap::{ArgAction, Parser};
use pkgsmith_builder::Rebuild;
use pkgsmith_types::SourcePreference;
use std::path::PathBuf;

/// pkgsmith - build Arch packages and their dependencies in chroots
#[derive(Parser)]
#[command(name = "pkgsmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build Arch packages and their dependencies in chroots")]
pub struct Cli {
    /// Package names or PKGBUILD directory paths (default: the current
    /// directory's package)
    pub names: Vec<String>,

    /// Path to pacman config file
    #[arg(short = 'C', long, value_name = "PATH")]
    pub pacman_config: Option<PathBuf>,

    /// Path to makepkg config file
    #[arg(short = 'M', long, value_name = "PATH")]
    pub makepkg_config: Option<PathBuf>,

    /// Path to package build directory
    #[arg(short = 'b', long, value_name = "PATH")]
    pub builddir: Option<PathBuf>,

    /// Path to chroot directory
    #[arg(short = 'c', long, value_name = "PATH")]
    pub chrootdir: Option<PathBuf>,

    /// Path to directory of local PKGBUILDs
    #[arg(short = 'd', long = "pkgbuilds", value_name = "PATH")]
    pub pkgbuilds: Option<PathBuf>,

    /// Install packages after building
    #[arg(short = 'i', long)]
    pub install: bool,

    /// Reinstall packages even if already installed
    #[arg(short = 'I', long)]
    pub reinstall: bool,

    /// Install packages via this local repository (name or path)
    #[arg(short = 'r', long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Build packages even if they exist (pass twice to rebuild
    /// dependencies too)
    #[arg(short = 'B', long, action = ArgAction::Count)]
    pub rebuild: u8,

    /// Remove package build directories instead of building
    #[arg(short = 'R', long)]
    pub remove: bool,

    /// Search for packages in the AUR only
    #[arg(short = 'a', long)]
    pub aur: bool,

    /// An alternative system root to install into
    #[arg(long, value_name = "PATH")]
    pub sysroot: Option<PathBuf>,

    /// Prompt before installing instead of assuming yes
    #[arg(long)]
    pub confirm: bool,

    /// Use an alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Rebuild depth selected by the repeatable `-B` flag.
    #[must_use]
    pub fn rebuild_mode(&self) -> Rebuild {
        match self.rebuild {
            0 => Rebuild::No,
            1 => Rebuild::Package,
            _ => Rebuild::Tree,
        }
    }

    /// Which source kinds resolution may use.
    #[must_use]
    pub fn preference(&self) -> SourcePreference {
        if self.aur {
            SourcePreference::Aur
        } else {
            SourcePreference::Either
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_flag_counts_map_to_depth() {
        let cli = Cli::parse_from(["pkgsmith", "foo"]);
        assert_eq!(cli.rebuild_mode(), Rebuild::No);

        let cli = Cli::parse_from(["pkgsmith", "-B", "foo"]);
        assert_eq!(cli.rebuild_mode(), Rebuild::Package);

        let cli = Cli::parse_from(["pkgsmith", "-BB", "foo"]);
        assert_eq!(cli.rebuild_mode(), Rebuild::Tree);
    }

    #[test]
    fn aur_flag_selects_remote_only_resolution() {
        let cli = Cli::parse_from(["pkgsmith", "-a", "foo"]);
        assert_eq!(cli.preference(), SourcePreference::Aur);

        let cli = Cli::parse_from(["pkgsmith", "foo"]);
        assert_eq!(cli.preference(), SourcePreference::Either);
    }
}
