// src/photo.rs
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use tracing::debug;

use crate::error::ValidationErrorReason;

pub const MAX_PHOTO_WIDTH: u32 = 400;
pub const MAX_PHOTO_HEIGHT: u32 = 300;
pub const JPEG_QUALITY: u8 = 80;
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Decodes a captured photo (JPEG, PNG or WebP), shrinks it to fit within
/// 400x300 keeping the aspect ratio, re-encodes it as JPEG and returns it as a
/// `data:image/jpeg;base64,...` string.
pub fn encode_photo_data_uri(raw: &[u8]) -> Result<String, ValidationErrorReason> {
    if raw.is_empty() {
        return Err(ValidationErrorReason::MissingPhoto);
    }

    let mut img = image::load_from_memory(raw).map_err(|e| ValidationErrorReason::InvalidPhoto {
        detail: e.to_string(),
    })?;

    // Shrink only; small captures keep their size
    if img.width() > MAX_PHOTO_WIDTH || img.height() > MAX_PHOTO_HEIGHT {
        img = img.thumbnail(MAX_PHOTO_WIDTH, MAX_PHOTO_HEIGHT);
    }

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let rgb_img = img.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| ValidationErrorReason::InvalidPhoto {
                detail: format!("JPEG compression failed: {}", e),
            })?;
    }
    debug!(
        "Encoded check-in photo: {}x{} -> {} bytes",
        img.width(),
        img.height(),
        buffer.len()
    );

    Ok(format!("{}{}", DATA_URI_PREFIX, BASE64_STANDARD.encode(&buffer)))
}

/// Decodes a base64 upload (optionally already in data-URI form) into raw bytes.
pub fn decode_base64_upload(encoded: &str) -> Result<Vec<u8>, ValidationErrorReason> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(ValidationErrorReason::MissingPhoto);
    }
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };
    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| ValidationErrorReason::InvalidPhoto {
            detail: format!("photo is not valid base64: {}", e),
        })
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode sample png");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_data_uri(uri: &str) -> image::DynamicImage {
        let encoded = uri.strip_prefix(DATA_URI_PREFIX).expect("data uri prefix");
        let bytes = BASE64_STANDARD.decode(encoded).expect("valid base64");
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
        image::load_from_memory(&bytes).expect("decodable jpeg")
    }

    #[test]
    fn large_photo_is_shrunk_to_fit() {
        let uri = encode_photo_data_uri(&sample_png(800, 600)).unwrap();
        let img = decode_data_uri(&uri);
        assert_eq!((img.width(), img.height()), (400, 300));
    }

    #[test]
    fn tall_photo_keeps_aspect_ratio() {
        let uri = encode_photo_data_uri(&sample_png(300, 600)).unwrap();
        let img = decode_data_uri(&uri);
        assert_eq!((img.width(), img.height()), (150, 300));
    }

    #[test]
    fn small_photo_is_not_upscaled() {
        let uri = encode_photo_data_uri(&sample_png(64, 48)).unwrap();
        let img = decode_data_uri(&uri);
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = encode_photo_data_uri(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ValidationErrorReason::InvalidPhoto { .. }));
    }

    #[test]
    fn empty_photo_is_missing() {
        assert_eq!(
            encode_photo_data_uri(&[]).unwrap_err(),
            ValidationErrorReason::MissingPhoto
        );
    }

    #[test]
    fn base64_upload_accepts_plain_and_data_uri_forms() {
        let raw = b"abc".to_vec();
        let plain = BASE64_STANDARD.encode(&raw);
        assert_eq!(decode_base64_upload(&plain).unwrap(), raw);
        let uri = format!("data:image/png;base64,{}", plain);
        assert_eq!(decode_base64_upload(&uri).unwrap(), raw);
        assert!(decode_base64_upload("  ").is_err());
        assert!(decode_base64_upload("***").is_err());
    }
}
