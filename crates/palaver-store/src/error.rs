use thiserror::Error;

/// Errors produced by the store layer.
///
/// Every variant is reported to the caller as a failed result; none of
/// them aborts the process. Multi-step operations that fail part-way do
/// not roll back sub-writes that already succeeded.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The expected node is absent (e.g. no messages stored yet).
    #[error("no value stored at {0}")]
    NotFound(String),

    /// The backing store failed to serve a read.
    #[error("read from {path} failed: {reason}")]
    ReadFailed { path: String, reason: String },

    /// The backing store failed to apply a write.
    #[error("write to {path} failed: {reason}")]
    WriteFailed { path: String, reason: String },

    /// A stored record does not have the expected shape.
    #[error("stored record is malformed: {0}")]
    Decode(String),

    /// The user directory node is absent or malformed.
    #[error("user directory is missing or malformed")]
    FetchFailed,

    /// An operation that acts on behalf of the signed-in user was called
    /// with nobody signed in.
    #[error("no user is signed in")]
    NotSignedIn,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
