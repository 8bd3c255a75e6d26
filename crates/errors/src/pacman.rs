//! Pacman install and local repository error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum InstallError {
    #[error("pacman exited with status {code}")]
    PacmanFailed { code: i32 },

    #[error("failed to spawn pacman: {message}")]
    PacmanSpawn { message: String },
}

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RepoError {
    #[error("repository {name} not found")]
    NotFound { name: String },

    #[error("repository {name} is not local")]
    NotLocal { name: String },

    #[error("database for {name} repository not found in {path}")]
    DatabaseNotFound { name: String, path: String },

    #[error("repo-add failed for {name}")]
    AddFailed { name: String },
}

impl UserFacingError for RepoError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::NotFound { name } => Cow::Owned(format!("repository {name} not found")),
            Self::NotLocal { name } => Cow::Owned(format!("repository {name} is not local")),
            Self::DatabaseNotFound { name, .. } => {
                Cow::Owned(format!("database for {name} repository not found"))
            }
            Self::AddFailed { name } => Cow::Owned(format!("repo-add failed for {name}")),
        }
    }

    fn user_detail(&self) -> Option<String> {
        match self {
            Self::DatabaseNotFound { path, .. } => Some(path.clone()),
            _ => None,
        }
    }
}
