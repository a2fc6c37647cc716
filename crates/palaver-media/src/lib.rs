//! # palaver-media
//!
//! The blob upload façade: puts profile pictures and message attachments
//! into a [`BlobStore`] under fixed directory prefixes and resolves the
//! retrievable URL the message codec then persists as content. One
//! attempt per call, no retry; failures surface as [`MediaError`].

pub mod blob;
pub mod fs;
pub mod upload;

mod error;

pub use blob::BlobStore;
pub use error::{MediaError, Result};
pub use fs::FsBlobStore;
pub use upload::Uploader;
