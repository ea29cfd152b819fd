//! Pure image transcoder for gallery uploads.
//!
//! Normalizes whatever an administrator drops into the upload form to one of
//! exactly two encodings before it goes anywhere near the network:
//!
//! - sources with an alpha channel re-encode as PNG, transparency kept
//! - everything else re-encodes as JPEG over an opaque RGB buffer
//!
//! The decision is made from the decoded color type, never from the file
//! extension or the declared MIME type - a transparent PNG renamed to
//! `.jpg` still keeps its transparency. Oversized images are downscaled so
//! the longer edge is at most [`MAX_EDGE_PX`]; images are never upscaled.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, PngEncoder};
use image::imageops::FilterType;
use thiserror::Error;

/// Longest edge allowed in stored gallery images.
pub const MAX_EDGE_PX: u32 = 1920;

/// Lossy quality for opaque JPEG output.
const JPEG_QUALITY: u8 = 85;

/// Errors from transcoding, all raised before any upload happens.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Declared MIME type does not indicate an image.
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// Bytes could not be decoded as an image (corrupt or truncated).
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding the normalized pixel buffer failed.
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Normalized, size-capped, re-encoded image ready for upload.
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Transcode raw upload bytes into the storage encoding.
///
/// Pure transform over the provided bytes: no I/O, no side effects.
///
/// # Errors
///
/// - [`TranscodeError::UnsupportedMedia`] if `declared_mime` is not an
///   `image/*` type (checked before decoding)
/// - [`TranscodeError::Decode`] if the bytes are not a decodable image
/// - [`TranscodeError::Encode`] if re-encoding fails
pub fn transcode(raw: &[u8], declared_mime: &str) -> Result<TranscodedImage, TranscodeError> {
    if !declared_mime.starts_with("image/") {
        return Err(TranscodeError::UnsupportedMedia(declared_mime.to_string()));
    }

    let decoded = image::load_from_memory(raw).map_err(TranscodeError::Decode)?;

    // resize() fits within the box preserving aspect ratio, so the longer
    // edge lands exactly on MAX_EDGE_PX. Smaller images pass through.
    let img = if decoded.width() > MAX_EDGE_PX || decoded.height() > MAX_EDGE_PX {
        decoded.resize(MAX_EDGE_PX, MAX_EDGE_PX, FilterType::Lanczos3)
    } else {
        decoded
    };

    let mut bytes = Vec::new();

    if img.color().has_alpha() {
        let encoder = PngEncoder::new_with_quality(
            Cursor::new(&mut bytes),
            CompressionType::Best,
            image::codecs::png::FilterType::Adaptive,
        );
        img.write_with_encoder(encoder)
            .map_err(TranscodeError::Encode)?;

        Ok(TranscodedImage {
            bytes,
            mime_type: "image/png",
            extension: "png",
        })
    } else {
        // No alpha on this path, so the RGB conversion is the white
        // composite with nothing to composite.
        let rgb = img.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), JPEG_QUALITY);
        rgb.write_with_encoder(encoder)
            .map_err(TranscodeError::Encode)?;

        Ok(TranscodedImage {
            bytes,
            mime_type: "image/jpeg",
            extension: "jpg",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode test fixture");
        bytes
    }

    fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(Cursor::new(&mut bytes), 90))
            .expect("encode test fixture");
        bytes
    }

    #[test]
    fn test_rejects_non_image_mime_before_decoding() {
        let result = transcode(b"not an image at all", "text/plain");
        assert!(matches!(result, Err(TranscodeError::UnsupportedMedia(_))));
    }

    #[test]
    fn test_rejects_corrupt_image_bytes() {
        let result = transcode(b"\xff\xd8\xff\xe0garbage", "image/jpeg");
        assert!(matches!(result, Err(TranscodeError::Decode(_))));
    }

    #[test]
    fn test_oversized_image_downscales_to_max_edge() {
        let source = RgbImage::from_pixel(4000, 3000, Rgb([120, 80, 40]));
        let raw = jpeg_bytes(&source);

        let out = transcode(&raw, "image/jpeg").expect("transcode");
        let decoded = image::load_from_memory(&out.bytes).expect("decode output");

        assert_eq!(decoded.width(), 1920);
        // 3000/4000 aspect preserved: 1920 * 3/4 = 1440.
        assert_eq!(decoded.height(), 1440);
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let source = RgbImage::from_pixel(500, 500, Rgb([10, 20, 30]));
        let raw = jpeg_bytes(&source);

        let out = transcode(&raw, "image/jpeg").expect("transcode");
        let decoded = image::load_from_memory(&out.bytes).expect("decode output");

        assert_eq!((decoded.width(), decoded.height()), (500, 500));
    }

    #[test]
    fn test_never_upscales() {
        let source = RgbImage::from_pixel(64, 48, Rgb([0, 0, 0]));
        let raw = jpeg_bytes(&source);

        let out = transcode(&raw, "image/jpeg").expect("transcode");
        let decoded = image::load_from_memory(&out.bytes).expect("decode output");

        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_alpha_png_stays_png_with_transparency() {
        let mut source = RgbaImage::from_pixel(32, 32, Rgba([200, 100, 50, 255]));
        source.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let raw = png_bytes(&DynamicImage::ImageRgba8(source));

        let out = transcode(&raw, "image/png").expect("transcode");
        assert_eq!(out.mime_type, "image/png");
        assert_eq!(out.extension, "png");

        let decoded = image::load_from_memory(&out.bytes).expect("decode output");
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_opaque_png_becomes_jpeg() {
        let source = RgbImage::from_pixel(32, 32, Rgb([200, 100, 50]));
        let raw = png_bytes(&DynamicImage::ImageRgb8(source));

        let out = transcode(&raw, "image/png").expect("transcode");
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(out.extension, "jpg");
    }

    #[test]
    fn test_format_choice_ignores_declared_mime() {
        // A transparent PNG wrongly declared as JPEG must keep transparency.
        let mut source = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        source.put_pixel(5, 5, Rgba([0, 0, 0, 0]));
        let raw = png_bytes(&DynamicImage::ImageRgba8(source));

        let out = transcode(&raw, "image/jpeg").expect("transcode");
        assert_eq!(out.mime_type, "image/png");
    }
}
