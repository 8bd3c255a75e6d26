#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the pkgsmith package builder
//!
//! This crate provides fine-grained error types organized by domain.
//! Resolution failures carry enough structure for callers to report
//! exactly what was attempted.

use std::borrow::Cow;

use thiserror::Error;

pub mod aur;
pub mod build;
pub mod config;
pub mod pacman;
pub mod source;

// Re-export all error types at the root
pub use aur::AurError;
pub use build::BuildError;
pub use config::ConfigError;
pub use pacman::{InstallError, RepoError};
pub use source::{AttemptedSources, SourceError};

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("AUR error: {0}")]
    Aur(#[from] AurError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("repo error: {0}")]
    Repo(#[from] RepoError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for pkgsmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information.
///
/// The CLI prints failures as a single `ERROR: <message>: <detail>` line;
/// this trait supplies both halves without heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Machine-readable detail appended after the message.
    fn user_detail(&self) -> Option<String> {
        None
    }

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Source(err) => err.user_message(),
            Error::Aur(err) => err.user_message(),
            Error::Repo(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_detail(&self) -> Option<String> {
        match self {
            Error::Source(err) => err.user_detail(),
            Error::Aur(err) => err.user_detail(),
            Error::Repo(err) => err.user_detail(),
            Error::Io { path, .. } => path.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Source(err) => err.user_hint(),
            Error::Config(_) => Some("Check your pkgsmith configuration file."),
            _ => None,
        }
    }
}
