//! AUR client error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum AurError {
    #[error("AUR request failed: {message}")]
    RequestFailed { message: String },

    #[error("invalid AUR response: {message}")]
    InvalidResponse { message: String },

    #[error("snapshot download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("snapshot extraction failed: {message}")]
    ExtractFailed { message: String },

    #[error("git clone failed for {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error("git pull failed in {path}: {message}")]
    PullFailed { path: String, message: String },
}

impl UserFacingError for AurError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::DownloadFailed { url, .. } => Cow::Owned(format!("snapshot download failed for {url}")),
            Self::CloneFailed { url, .. } => Cow::Owned(format!("git clone failed for {url}")),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_detail(&self) -> Option<String> {
        match self {
            Self::DownloadFailed { message, .. }
            | Self::CloneFailed { message, .. }
            | Self::PullFailed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RequestFailed { .. } | Self::DownloadFailed { .. } => {
                Some("Check network access to the AUR.")
            }
            _ => None,
        }
    }
}
