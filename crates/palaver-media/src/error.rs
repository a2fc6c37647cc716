use thiserror::Error;

/// Errors produced by the blob layer.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Storing the payload failed.
    #[error("failed to upload blob to {path}: {reason}")]
    UploadFailed { path: String, reason: String },

    /// The payload was stored (or was expected to be stored) but no
    /// retrievable URL could be produced for it.
    #[error("failed to resolve download url for {path}: {reason}")]
    DownloadUrlFailed { path: String, reason: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MediaError>;
