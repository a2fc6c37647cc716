//! The upload façade used when composing media messages and when
//! registering a profile picture. The URL it returns is what the
//! message codec persists as content for photo and video kinds.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use palaver_shared::constants::{MESSAGE_IMAGE_DIR, MESSAGE_VIDEO_DIR, PROFILE_IMAGE_DIR};

use crate::blob::BlobStore;
use crate::error::Result;

/// Uploads media and resolves the URL persisted in message content.
///
/// Pure pass-through over the injected [`BlobStore`]: one attempt per
/// call, no retry. What changes per entry point is only the directory
/// the payload lands in.
#[derive(Clone)]
pub struct Uploader {
    blobs: Arc<dyn BlobStore>,
}

impl Uploader {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Store a profile picture and return its URL.
    ///
    /// File names follow `UserKey::profile_picture_file_name`, e.g.
    /// `a_x_com_profile_picture.png`.
    pub async fn upload_profile_picture(&self, data: Bytes, file_name: &str) -> Result<String> {
        self.upload_to(PROFILE_IMAGE_DIR, file_name, data).await
    }

    /// Store a photo attached to a message and return its URL.
    pub async fn upload_message_photo(&self, data: Bytes, file_name: &str) -> Result<String> {
        self.upload_to(MESSAGE_IMAGE_DIR, file_name, data).await
    }

    /// Store a video attached to a message and return its URL.
    pub async fn upload_message_video(&self, data: Bytes, file_name: &str) -> Result<String> {
        self.upload_to(MESSAGE_VIDEO_DIR, file_name, data).await
    }

    /// URL for a payload that was stored earlier.
    pub async fn download_url(&self, path: &str) -> Result<String> {
        self.blobs.resolve_url(path).await
    }

    async fn upload_to(&self, dir: &str, file_name: &str, data: Bytes) -> Result<String> {
        let path = format!("{dir}/{file_name}");
        self.blobs.put(&path, data).await?;
        let url = self.blobs.resolve_url(&path).await?;

        info!(%path, "uploaded blob");
        Ok(url)
    }
}
