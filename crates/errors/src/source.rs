//! PKGBUILD source resolution error types

use std::borrow::Cow;
use std::fmt;

use crate::UserFacingError;
use thiserror::Error;

/// Which source kinds a failed resolution attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptedSources {
    Local,
    Aur,
    Both,
}

impl fmt::Display for AttemptedSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Aur => write!(f, "aur"),
            Self::Both => write!(f, "local, aur"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("directory does not contain a PKGBUILD file: {directory}")]
    NoPkgbuild { directory: String },

    #[error("source for {name} not found (attempted: {attempted})")]
    SourceNotFound {
        name: String,
        attempted: AttemptedSources,
    },

    #[error("provider for {name} not found")]
    ProviderNotFound {
        name: String,
        restrictions: Vec<String>,
    },

    #[error("failed to parse srcinfo: {message}")]
    SrcinfoParse { message: String },

    #[error("srcinfo generation failed: {message}")]
    SrcinfoFailed { message: String },

    #[error("package list query failed: {message}")]
    PackageListFailed { message: String },

    #[error("tree synchronization failed: {message}")]
    SyncFailed { message: String },
}

impl UserFacingError for SourceError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::NoPkgbuild { .. } => Cow::Borrowed("directory does not contain a PKGBUILD file"),
            Self::SourceNotFound { name, .. } => Cow::Owned(format!("source for {name} not found")),
            Self::ProviderNotFound { name, .. } => {
                Cow::Owned(format!("provider for {name} not found"))
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_detail(&self) -> Option<String> {
        match self {
            Self::NoPkgbuild { directory } => Some(directory.clone()),
            Self::SourceNotFound { attempted, .. } => Some(attempted.to_string()),
            Self::ProviderNotFound { restrictions, .. } => {
                if restrictions.is_empty() {
                    Some("no version restrictions".to_string())
                } else {
                    Some(restrictions.join(", "))
                }
            }
            _ => None,
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoPkgbuild { .. } => {
                Some("Point pkgsmith at a directory containing a PKGBUILD.")
            }
            Self::ProviderNotFound { .. } => {
                Some("No local PKGBUILD satisfies the version restrictions.")
            }
            _ => None,
        }
    }
}
