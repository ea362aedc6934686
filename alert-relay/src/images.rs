//! Uploaded image storage
//!
//! Images are written verbatim to a single directory. An upload with an
//! existing filename overwrites the previous file.

use crate::error::{Error, Result};
use axum::body::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// An image received from a client
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-supplied filename
    pub filename: String,
    /// Declared MIME type
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Bytes,
}

/// Directory-backed image store
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the image directory if it does not exist
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        debug!("Image directory ready: {}", self.dir.display());
        Ok(())
    }

    /// Validate and write an upload, returning the stored path.
    ///
    /// # Errors
    /// - `InvalidInput` if the content type is not `image/*` or the filename is unusable
    /// - `Internal` if the file cannot be written
    pub async fn save(&self, image: UploadedImage) -> Result<PathBuf> {
        let content_type = image
            .content_type
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("Uploaded file has no content type.".to_string()))?;

        if !is_image_content_type(content_type) {
            return Err(Error::InvalidInput(
                "Uploaded file is not an image.".to_string(),
            ));
        }

        let filename = sanitize_filename(&image.filename)?;
        let path = self.dir.join(filename);
        info!("Saving image to {}", path.display());

        tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
            error!("Failed to save image {}: {}", path.display(), e);
            Error::Internal(format!("Failed to save image: {}", e))
        })?;

        info!("Image saved ({} bytes)", image.bytes.len());
        Ok(path)
    }
}

/// True for MIME types in the `image/` category (case-insensitive)
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Reduce a client filename to its final path component.
fn sanitize_filename(filename: &str) -> Result<&str> {
    // Clients on Windows may send backslash-separated paths
    let last = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    match last {
        "" | "." | ".." => Err(Error::InvalidInput(format!(
            "Invalid upload filename: {:?}",
            filename
        ))),
        name => Ok(name),
    }
}
