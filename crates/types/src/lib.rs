#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for pkgsmith

mod restriction;

pub use restriction::{parse_restriction, satisfies_all, Compare, Restriction};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a PKGBUILD may be sourced from during resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourcePreference {
    /// Only local PKGBUILD directories qualify.
    Local,
    /// Only the AUR qualifies.
    Aur,
    /// Local first, falling back to the AUR.
    #[default]
    Either,
}

impl SourcePreference {
    #[must_use]
    pub fn allows_local(self) -> bool {
        matches!(self, Self::Local | Self::Either)
    }

    #[must_use]
    pub fn allows_aur(self) -> bool {
        matches!(self, Self::Aur | Self::Either)
    }
}

impl fmt::Display for SourcePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Aur => write!(f, "aur"),
            Self::Either => write!(f, "either"),
        }
    }
}

/// Dependency kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepKind {
    /// Required at install/run time; persists after the build.
    Runtime,
    /// Required only to perform the build; installed transiently.
    Make,
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "depends"),
            Self::Make => write!(f, "makedepends"),
        }
    }
}
