//! Photo intake: decode camera/gallery bytes into an upright bitmap and
//! convert it into what each backend consumes (grayscale pixel buffer for
//! local recognition, base64-ready JPEG for remote models).

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, GrayImage, ImageOutputFormat};
use tracing::debug;

use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// JPEG quality for remote upload and the persisted photo (0.8 on a 0-1 scale).
pub const JPEG_QUALITY: u8 = 80;

// ═══════════════════════════════════════════════════════════
// Photo
// ═══════════════════════════════════════════════════════════

/// A decoded, upright photograph handed to the extraction pipeline.
#[derive(Debug, Clone)]
pub struct Photo {
    image: DynamicImage,
}

impl Photo {
    /// Decode JPEG/PNG bytes and apply EXIF orientation.
    pub fn decode(bytes: &[u8]) -> Result<Self, ExtractionError> {
        validate_image_bytes(bytes)?;

        let img = image::load_from_memory(bytes)
            .map_err(|e| ExtractionError::ImageFormat(format!("failed to decode image: {e}")))?;
        let orientation = read_exif_orientation(bytes);
        let img = apply_orientation(img, orientation);

        let (w, h) = img.dimensions();
        debug!(
            size = format!("{w}x{h}"),
            orientation,
            bytes = bytes.len(),
            "Photo decoded"
        );

        Ok(Self { image: img })
    }

    /// Wrap a bitmap the caller already holds.
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn is_empty(&self) -> bool {
        let (w, h) = self.dimensions();
        w == 0 || h == 0
    }

    /// Grayscale pixel buffer for the text recognizer.
    pub fn to_pixel_buffer(&self) -> Result<GrayImage, ExtractionError> {
        if self.is_empty() {
            return Err(ExtractionError::ImageFormat("image has no pixels".into()));
        }
        Ok(self.image.to_luma8())
    }

    /// Encode as baseline JPEG at the given quality (1-100).
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, ExtractionError> {
        if self.is_empty() {
            return Err(ExtractionError::Encoding("image has no pixels".into()));
        }
        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(self.image.to_rgb8());
        let mut cursor = Cursor::new(Vec::new());
        rgb.write_to(&mut cursor, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))
            .map_err(|e| ExtractionError::Encoding(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

/// Validate image bytes before decoding.
/// Rejects clearly invalid input before decoding.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ExtractionError::ImageFormat(
            "image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageFormat(format!(
            "image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Read EXIF tag 0x0112 (Orientation) from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply an EXIF orientation transform.
///
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn make_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn decodes_png() {
        let photo = Photo::decode(&make_png(40, 20, [255, 255, 255])).unwrap();
        assert_eq!(photo.dimensions(), (40, 20));
    }

    #[test]
    fn rejects_tiny_input() {
        let err = Photo::decode(b"not an image").unwrap_err();
        assert!(matches!(err, ExtractionError::ImageFormat(_)));
    }

    #[test]
    fn rejects_garbage_of_plausible_size() {
        let err = Photo::decode(&[0xAB; 512]).unwrap_err();
        assert!(matches!(err, ExtractionError::ImageFormat(_)));
    }

    #[test]
    fn png_without_exif_is_normal_orientation() {
        assert_eq!(read_exif_orientation(&make_png(4, 4, [0, 0, 0])), 1);
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 10));
        let rotated = apply_orientation(img, 6);
        assert_eq!(rotated.dimensions(), (10, 30));
    }

    #[test]
    fn unknown_orientation_is_identity() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 10));
        assert_eq!(apply_orientation(img, 42).dimensions(), (30, 10));
    }

    #[test]
    fn jpeg_encoding_round_trips_dimensions() {
        let photo = Photo::from_image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            64,
            32,
            Rgb([200, 10, 10]),
        )));
        let jpeg = photo.encode_jpeg(JPEG_QUALITY).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        let decoded = Photo::decode(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 32));
    }

    #[test]
    fn empty_bitmap_fails_both_conversions() {
        let photo = Photo::from_image(DynamicImage::ImageRgb8(RgbImage::new(0, 0)));
        assert!(matches!(photo.to_pixel_buffer(), Err(ExtractionError::ImageFormat(_))));
        assert!(matches!(photo.encode_jpeg(JPEG_QUALITY), Err(ExtractionError::Encoding(_))));
    }

    #[test]
    fn pixel_buffer_is_grayscale_same_size() {
        let photo = Photo::from_image(DynamicImage::ImageRgb8(RgbImage::new(12, 7)));
        let gray = photo.to_pixel_buffer().unwrap();
        assert_eq!(gray.dimensions(), (12, 7));
    }
}
