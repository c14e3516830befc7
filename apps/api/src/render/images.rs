//! Image provider: resolves listing image references to decoded RGB pixels.
//!
//! A reference is either an `http(s)://` URL or a local path (multipart uploads are
//! stored on disk). The format comes from the extension: `.png` decodes as PNG,
//! anything else as JPEG, with content sniffing as a second chance.
//!
//! Every reference for one build is fetched concurrently; results are returned in
//! source order so placement never depends on completion order. A failed or timed-out
//! fetch becomes `None` and is logged; it never fails the build.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use image::ImageFormat;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::property::PropertyRecord;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host returned status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("decode task failed: {0}")]
    Join(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Decoded image
// ────────────────────────────────────────────────────────────────────────────

/// 8-bit RGB pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<Self, ImageError> {
        let decoded = match image::load_from_memory_with_format(bytes, format) {
            Ok(img) => img,
            Err(first) => {
                debug!("decode as {format:?} failed ({first}), sniffing format");
                image::load_from_memory(bytes)?
            }
        };
        let rgb = decoded.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels: rgb.into_raw(),
        })
    }

    /// Width over height; 1.0 for degenerate images.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// `.png` (ignoring query string and fragment) → PNG, everything else → JPEG.
pub fn format_for_reference(reference: &str) -> ImageFormat {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
        .to_ascii_lowercase();
    if path.ends_with(".png") {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

// ────────────────────────────────────────────────────────────────────────────
// Provider trait
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn load(&self, reference: &str) -> Result<LoadedImage, ImageError>;
}

/// Fetches URLs over HTTP and reads everything else from the local filesystem.
#[derive(Clone)]
pub struct HttpImageProvider {
    client: Client,
}

impl HttpImageProvider {
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn read_bytes(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
        if is_remote(reference) {
            let response = self.client.get(reference).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ImageError::Status(status.as_u16()));
            }
            Ok(response.bytes().await?.to_vec())
        } else {
            Ok(tokio::fs::read(reference).await?)
        }
    }
}

#[async_trait]
impl ImageProvider for HttpImageProvider {
    async fn load(&self, reference: &str) -> Result<LoadedImage, ImageError> {
        let bytes = self.read_bytes(reference).await?;
        let format = format_for_reference(reference);
        tokio::task::spawn_blocking(move || LoadedImage::decode(&bytes, format))
            .await
            .map_err(|e| ImageError::Join(e.to_string()))?
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch fetch
// ────────────────────────────────────────────────────────────────────────────

/// Loads every reference concurrently. Output index `i` belongs to `references[i]`.
pub async fn fetch_all(
    provider: &dyn ImageProvider,
    references: &[String],
) -> Vec<Option<LoadedImage>> {
    let loads = references.iter().map(|reference| async move {
        match provider.load(reference).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(reference = %reference, error = %e, "Image unavailable, leaving its cell blank");
                None
            }
        }
    });
    join_all(loads).await
}

/// Every image a brochure needs, already fetched and in source order.
#[derive(Debug, Clone, Default)]
pub struct BrochureImages {
    pub cover: Option<LoadedImage>,
    /// One slot per gallery reference (`images[1..]`); `None` marks a failed fetch.
    pub gallery: Vec<Option<LoadedImage>>,
    pub logos: Vec<Option<LoadedImage>>,
}

impl BrochureImages {
    /// Fetches cover, gallery and logos in one concurrent batch.
    pub async fn fetch(provider: &dyn ImageProvider, property: &PropertyRecord) -> Self {
        let mut references = property.images.clone();
        references.extend(property.company_logos.iter().cloned());

        let mut loaded = fetch_all(provider, &references).await;
        let logos = loaded.split_off(property.images.len());
        let mut images = loaded.into_iter();
        let cover = images.next().flatten();
        let gallery = images.collect();

        Self {
            cover,
            gallery,
            logos,
        }
    }

    pub fn failed_count(&self) -> usize {
        let cover_failed = usize::from(self.cover.is_none());
        cover_failed
            + self.gallery.iter().filter(|i| i.is_none()).count()
            + self.logos.iter().filter(|i| i.is_none()).count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test provider
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub use fixtures::{solid_image, StaticImageProvider};


// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::sample_property;
    use std::io::{Cursor, Write};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    // ── format inference ────────────────────────────────────────────────────

    #[test]
    fn test_png_extension() {
        assert_eq!(format_for_reference("https://x.com/a/photo.PNG"), ImageFormat::Png);
        assert_eq!(format_for_reference("uploads/1-logo.png"), ImageFormat::Png);
    }

    #[test]
    fn test_query_string_ignored() {
        assert_eq!(format_for_reference("https://x.com/a.png?w=1000"), ImageFormat::Png);
    }

    #[test]
    fn test_default_is_jpeg() {
        assert_eq!(format_for_reference("https://x.com/photo?fit=crop"), ImageFormat::Jpeg);
        assert_eq!(format_for_reference("uploads/house.webp"), ImageFormat::Jpeg);
    }

    // ── decoding ────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_png() {
        let image = LoadedImage::decode(&png_bytes(4, 2), ImageFormat::Png).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.pixels.len(), 4 * 2 * 3);
        assert_eq!(&image.pixels[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_decode_jpeg() {
        let image = LoadedImage::decode(&jpeg_bytes(8, 8), ImageFormat::Jpeg).unwrap();
        assert_eq!((image.width, image.height), (8, 8));
    }

    #[test]
    fn test_decode_png_mislabelled_as_jpeg() {
        let image = LoadedImage::decode(&png_bytes(3, 3), ImageFormat::Jpeg).unwrap();
        assert_eq!(image.width, 3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            LoadedImage::decode(b"not an image", ImageFormat::Jpeg),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_aspect() {
        assert_eq!(solid_image(200, 100).aspect(), 2.0);
        assert_eq!(solid_image(10, 0).aspect(), 1.0);
    }

    // ── local files ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_load_local_png() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&png_bytes(5, 7)).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let provider = HttpImageProvider::new(Duration::from_secs(5)).unwrap();
        let image = provider.load(&path).await.unwrap();
        assert_eq!((image.width, image.height), (5, 7));
    }

    #[tokio::test]
    async fn test_missing_local_file_is_io_error() {
        let provider = HttpImageProvider::new(Duration::from_secs(5)).unwrap();
        let result = provider.load("/definitely/not/here.jpg").await;
        assert!(matches!(result, Err(ImageError::Io(_))));
    }

    #[tokio::test]
    async fn test_remote_404_is_status_error() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/missing.jpg");
                then.status(404);
            })
            .await;

        let provider = HttpImageProvider::new(Duration::from_secs(5)).unwrap();
        let result = provider.load(&server.url("/missing.jpg")).await;
        assert!(matches!(result, Err(ImageError::Status(404))));
    }

    #[tokio::test]
    async fn test_remote_png_loads() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/house.png");
                then.status(200).body(png_bytes(6, 4));
            })
            .await;

        let provider = HttpImageProvider::new(Duration::from_secs(5)).unwrap();
        let image = provider.load(&server.url("/house.png")).await.unwrap();
        assert_eq!((image.width, image.height), (6, 4));
    }

    // ── batch fetch ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fetch_all_preserves_source_order() {
        let provider = StaticImageProvider::failing(&["bb"]);
        let refs = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
        let loaded = fetch_all(&provider, &refs).await;
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].as_ref().map(|i| i.width), Some(1));
        assert!(loaded[1].is_none());
        assert_eq!(loaded[2].as_ref().map(|i| i.width), Some(3));
    }

    #[tokio::test]
    async fn test_brochure_images_split() {
        let mut property = sample_property();
        property.images = vec!["c.jpg".into(), "g1.jpg".into(), "g2.jpg".into()];
        property.company_logos = vec!["logo.png".into()];
        let provider = StaticImageProvider::failing(&["g1.jpg"]);

        let images = BrochureImages::fetch(&provider, &property).await;
        assert!(images.cover.is_some());
        assert_eq!(images.gallery.len(), 2);
        assert!(images.gallery[0].is_none());
        assert!(images.gallery[1].is_some());
        assert_eq!(images.logos.len(), 1);
        assert_eq!(images.failed_count(), 1);
    }
}
