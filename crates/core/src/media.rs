//! Product image rules.
//!
//! Every product image must stay within a byte budget and a pixel box. The
//! checks run in a fixed order: byte size, then minimum resolution, then
//! maximum resolution. Only the image header is decoded, so oversized
//! uploads are rejected without decompressing them.
//!
//! Persistence code accepts images only as [`ValidatedImage`], which can only
//! be produced by [`ImageRules::validate`]. Any path that stores a product
//! image therefore goes through the same rules as the admin form.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

/// Errors produced when an image breaks the rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The upload is larger than the byte budget.
    #[error("Image file is larger than the allowed size ({size} bytes, limit {max} bytes)")]
    TooLarge {
        /// Upload size in bytes.
        size: usize,
        /// Limit in bytes.
        max: usize,
    },
    /// Width or height is below the minimum.
    #[error("Image resolution is below the minimum ({width}x{height}, minimum {min_width}x{min_height})")]
    BelowMinimum {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    /// Width or height is above the maximum.
    #[error("Image resolution is above the maximum ({width}x{height}, maximum {max_width}x{max_height})")]
    AboveMaximum {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    /// The bytes are not a raster format we can read.
    #[error("File is not a supported image")]
    Unreadable,
}

impl ImageError {
    /// Short message suitable for a form field error.
    #[must_use]
    pub const fn field_message(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "Image file is larger than the allowed size",
            Self::BelowMinimum { .. } => "Image resolution is below the minimum",
            Self::AboveMaximum { .. } => "Image resolution is above the maximum",
            Self::Unreadable => "File is not a supported image",
        }
    }
}

/// Size and resolution bounds for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRules {
    /// Minimum `(width, height)` in pixels.
    pub min_resolution: (u32, u32),
    /// Maximum `(width, height)` in pixels.
    pub max_resolution: (u32, u32),
    /// Maximum encoded size in bytes.
    pub max_bytes: usize,
}

impl ImageRules {
    /// Rules shared by all product kinds.
    pub const PRODUCT: Self = Self {
        min_resolution: (400, 400),
        max_resolution: (800, 800),
        max_bytes: 3 * 1024 * 1024,
    };

    /// Help text shown next to the upload field.
    #[must_use]
    pub fn help_text(&self) -> String {
        let (min_w, min_h) = self.min_resolution;
        let (max_w, max_h) = self.max_resolution;
        format!(
            "Upload images with a resolution of at least {min_w}x{min_h} and at most {max_w}x{max_h}, up to {} MB",
            self.max_bytes / (1024 * 1024)
        )
    }

    /// Check an uploaded file against the rules.
    ///
    /// # Errors
    ///
    /// Returns the first rule the image breaks, checked in the order: byte
    /// size, minimum resolution, maximum resolution. Returns
    /// [`ImageError::Unreadable`] when the format cannot be detected or the
    /// header cannot be read.
    pub fn validate(&self, bytes: Vec<u8>) -> Result<ValidatedImage, ImageError> {
        if bytes.len() > self.max_bytes {
            return Err(ImageError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let (format, (width, height)) = probe(&bytes)?;
        self.check_dimensions(width, height)?;

        Ok(ValidatedImage {
            bytes,
            format,
            width,
            height,
        })
    }

    /// Check a pixel size against the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::BelowMinimum`] or [`ImageError::AboveMaximum`].
    pub const fn check_dimensions(&self, width: u32, height: u32) -> Result<(), ImageError> {
        let (min_width, min_height) = self.min_resolution;
        let (max_width, max_height) = self.max_resolution;

        if width < min_width || height < min_height {
            return Err(ImageError::BelowMinimum {
                width,
                height,
                min_width,
                min_height,
            });
        }
        if width > max_width || height > max_height {
            return Err(ImageError::AboveMaximum {
                width,
                height,
                max_width,
                max_height,
            });
        }
        Ok(())
    }
}

fn probe(bytes: &[u8]) -> Result<(ImageFormat, (u32, u32)), ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| ImageError::Unreadable)?;
    let format = reader.format().ok_or(ImageError::Unreadable)?;
    let dimensions = reader.into_dimensions().map_err(|_| ImageError::Unreadable)?;
    Ok((format, dimensions))
}

/// An image that passed [`ImageRules::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl ValidatedImage {
    /// Encoded file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pixel width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Preferred file extension for the detected format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{ImageBuffer, Rgb};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_accepts_bounds_inclusive() {
        let rules = ImageRules::PRODUCT;
        assert!(rules.validate(png(400, 400)).is_ok());
        assert!(rules.validate(png(800, 800)).is_ok());

        let image = rules.validate(png(640, 480)).unwrap();
        assert_eq!((image.width(), image.height()), (640, 480));
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_rejects_below_minimum_on_either_axis() {
        let rules = ImageRules::PRODUCT;
        for (w, h) in [(399, 500), (500, 399), (10, 10)] {
            assert!(matches!(
                rules.validate(png(w, h)),
                Err(ImageError::BelowMinimum { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_above_maximum_on_either_axis() {
        let rules = ImageRules::PRODUCT;
        for (w, h) in [(801, 500), (500, 801)] {
            assert!(matches!(
                rules.validate(png(w, h)),
                Err(ImageError::AboveMaximum { .. })
            ));
        }
    }

    #[test]
    fn test_size_is_checked_before_resolution() {
        let rules = ImageRules {
            max_bytes: 64,
            ..ImageRules::PRODUCT
        };
        // Too small in pixels as well, but the byte limit wins.
        let err = rules.validate(png(10, 10)).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { max: 64, .. }));
    }

    #[test]
    fn test_rejects_non_images() {
        let err = ImageRules::PRODUCT
            .validate(b"definitely not a png".to_vec())
            .unwrap_err();
        assert_eq!(err, ImageError::Unreadable);
        assert_eq!(err.field_message(), "File is not a supported image");
    }

    #[test]
    fn test_help_text_mentions_minimum() {
        assert!(ImageRules::PRODUCT.help_text().contains("400x400"));
    }

    #[test]
    fn test_check_dimensions_allows_mixed_axes_within_box() {
        assert!(ImageRules::PRODUCT.check_dimensions(400, 800).is_ok());
    }
}
