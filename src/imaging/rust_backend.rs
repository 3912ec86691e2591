//! Pure Rust image backend on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` → `to_rgba8` |
//! | Preview downscale | `image::imageops::resize` with `Lanczos3` |
//! | Depth-of-field blur | `image::imageops::blur` (sigma = radius px) |
//! | Encode | `RgbaImage::save`, flattened to RGB for JPEG |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::buffer::PixelBuffer;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn to_rgba_image(buffer: &PixelBuffer) -> Result<RgbaImage, BackendError> {
    RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.as_raw().to_vec()).ok_or_else(
        || BackendError::ProcessingFailed("pixel buffer does not match its dimensions".into()),
    )
}

fn from_rgba_image(image: RgbaImage) -> Result<PixelBuffer, BackendError> {
    let (width, height) = image.dimensions();
    Ok(PixelBuffer::new(width, height, image.into_raw())?)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<PixelBuffer, BackendError> {
        let image = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::Decode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        from_rgba_image(image.to_rgba8())
    }

    fn resize(
        &self,
        buffer: &PixelBuffer,
        target: Dimensions,
    ) -> Result<PixelBuffer, BackendError> {
        if (buffer.width(), buffer.height()) == (target.width, target.height) {
            return Ok(buffer.clone());
        }
        let image = to_rgba_image(buffer)?;
        let resized =
            image::imageops::resize(&image, target.width, target.height, FilterType::Lanczos3);
        from_rgba_image(resized)
    }

    fn blur(&self, buffer: &PixelBuffer, radius: u32) -> Result<PixelBuffer, BackendError> {
        if radius == 0 {
            return Ok(buffer.clone());
        }
        let image = to_rgba_image(buffer)?;
        from_rgba_image(image::imageops::blur(&image, radius as f32))
    }

    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), BackendError> {
        let image = to_rgba_image(buffer)?;
        let result = if is_jpeg(path) {
            // JPEG has no alpha channel.
            DynamicImage::ImageRgba8(image).to_rgb8().save(path)
        } else {
            image.save(path)
        };
        result.map_err(|e| BackendError::Encode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
