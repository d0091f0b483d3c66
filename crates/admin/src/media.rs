//! Product image storage under the media root.
//!
//! Files are written flat into one directory and served by both binaries
//! under `/media`. Only [`ValidatedImage`] values can be saved, so every
//! stored file has already passed the product image rules.

use std::io;
use std::path::{Path, PathBuf};

use techmart_core::media::ValidatedImage;
use techmart_core::{ProductKind, Slug};

/// Errors from the media store.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Filesystem operation failed.
    #[error("media I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored name would escape the media root.
    #[error("invalid media file name: {0}")]
    InvalidName(String),
}

/// Writes and removes product images.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save an image and return its stored file name.
    ///
    /// Names look like `notebook-x1-carbon-1a2b3c4d.png`; the random suffix
    /// keeps a replaced image from being served from a stale cache.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory or file cannot be written.
    pub async fn save(
        &self,
        kind: ProductKind,
        slug: &Slug,
        image: &ValidatedImage,
    ) -> Result<String, MediaError> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!(
            "{kind}-{slug}-{}.{}",
            suffix.get(..8).unwrap_or(&suffix),
            image.extension()
        );

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), image.bytes()).await?;

        tracing::info!(file = %name, width = image.width(), height = image.height(), "Stored product image");
        Ok(name)
    }

    /// Delete a stored image. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidName` for names containing path separators
    /// or `..`, and `MediaError::Io` for other filesystem failures.
    pub async fn remove(&self, name: &str) -> Result<(), MediaError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(MediaError::InvalidName(name.to_owned()));
        }

        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a replaced image, logging instead of failing.
    ///
    /// Used after the database already points at the new file.
    pub async fn discard(&self, name: &str) {
        if let Err(e) = self.remove(name).await {
            tracing::warn!(file = %name, error = %e, "Failed to remove old product image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, ImageFormat, Rgb};
    use techmart_core::media::ImageRules;

    use super::*;

    fn validated(width: u32, height: u32) -> ValidatedImage {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageRules::PRODUCT.validate(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_save_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("media"));
        let slug = Slug::parse("x1-carbon").unwrap();

        let name = store
            .save(ProductKind::Notebook, &slug, &validated(500, 500))
            .await
            .unwrap();

        assert!(name.starts_with("notebook-x1-carbon-"));
        assert!(name.ends_with(".png"));
        let written = std::fs::read(store.root().join(&name)).unwrap();
        assert!(!written.is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        let slug = Slug::parse("pixel").unwrap();
        let name = store
            .save(ProductKind::Smartphone, &slug, &validated(400, 400))
            .await
            .unwrap();

        store.remove(&name).await.unwrap();
        assert!(!store.root().join(&name).exists());
        store.remove(&name).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());

        for name in ["../etc/passwd", "a/b.png", "", ".."] {
            assert!(matches!(
                store.remove(name).await,
                Err(MediaError::InvalidName(_))
            ));
        }
    }
}
