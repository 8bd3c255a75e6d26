//! Chroot build error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed for {package}")]
    Failed { package: String },

    #[error("{command} exited with status {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("failed to spawn {command}: {message}")]
    CommandSpawn { command: String, message: String },

    #[error("chroot creation failed: {message}")]
    ChrootCreateFailed { message: String },

    #[error("built artifact missing: {path}")]
    ArtifactMissing { path: String },
}
