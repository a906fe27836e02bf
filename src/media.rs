//! Attachments arrive as `data:` URLs. Images are downscaled and re-encoded
//! as JPEG; voice notes are only checked.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

/// Longest side of an uploaded avatar.
pub const AVATAR_DIMENSION: u32 = 200;
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Expected a base64 data URL")]
    NotDataUrl,

    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unreadable image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Attachment too large: {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },
}

/// Splits `data:<mime>;base64,<payload>` into the mime type and decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(&str, Vec<u8>), MediaError> {
    let rest = url.strip_prefix("data:").ok_or(MediaError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(MediaError::NotDataUrl)?;
    let mime = meta.strip_suffix(";base64").ok_or(MediaError::NotDataUrl)?;
    Ok((mime, STANDARD.decode(payload.trim())?))
}

pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:")
}

/// Decodes an image data URL, shrinks it so neither side exceeds
/// `max_dimension` (never enlarging) and returns it as a JPEG data URL.
pub fn downscale_image(url: &str, max_dimension: u32) -> Result<String, MediaError> {
    let (mime, bytes) = parse_data_url(url)?;
    if !mime.starts_with("image/") {
        return Err(MediaError::UnsupportedType(mime.to_string()));
    }

    let mut img = image::load_from_memory(&bytes)?;
    let (width, height) = img.dimensions();
    if width > max_dimension || height > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Triangle);
    }

    let mut out = Vec::new();
    img.to_rgb8()
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;

    tracing::debug!(
        from = ?(width, height),
        to = ?img.dimensions(),
        bytes = out.len(),
        "Image downscaled"
    );

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&out)))
}

/// Accepts an audio data URL no larger than `max_bytes` once decoded.
pub fn check_voice_note(url: &str, max_bytes: usize) -> Result<(), MediaError> {
    let (mime, bytes) = parse_data_url(url)?;
    if !mime.starts_with("audio/") {
        return Err(MediaError::UnsupportedType(mime.to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(MediaError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_data_url(width: u32, height: u32) -> String {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, _| Rgba([(x % 255) as u8, 90, 200, 255]));
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&buf))
    }

    fn dimensions(url: &str) -> (u32, u32) {
        let (mime, bytes) = parse_data_url(url).unwrap();
        assert_eq!(mime, "image/jpeg");
        image::load_from_memory(&bytes).unwrap().dimensions()
    }

    #[test]
    fn test_wide_image_is_bounded_by_width() {
        let out = downscale_image(&png_data_url(1600, 400), 800).unwrap();
        assert_eq!(dimensions(&out), (800, 200));
    }

    #[test]
    fn test_tall_image_is_bounded_by_height() {
        let out = downscale_image(&png_data_url(300, 1200), 800).unwrap();
        assert_eq!(dimensions(&out), (200, 800));
    }

    #[test]
    fn test_small_image_is_not_enlarged() {
        let out = downscale_image(&png_data_url(120, 80), 800).unwrap();
        assert_eq!(dimensions(&out), (120, 80));
    }

    #[test]
    fn test_rejects_non_images() {
        let text = format!("data:text/plain;base64,{}", STANDARD.encode("hello"));
        assert!(matches!(
            downscale_image(&text, 800),
            Err(MediaError::UnsupportedType(_))
        ));
        assert!(matches!(
            downscale_image("https://example.com/cat.png", 800),
            Err(MediaError::NotDataUrl)
        ));
        let broken = format!("data:image/png;base64,{}", STANDARD.encode("not a png"));
        assert!(matches!(
            downscale_image(&broken, 800),
            Err(MediaError::Image(_))
        ));
    }

    #[test]
    fn test_voice_note_size_limit() {
        let clip = format!("data:audio/webm;base64,{}", STANDARD.encode([0u8; 64]));
        assert!(check_voice_note(&clip, 64).is_ok());
        assert!(matches!(
            check_voice_note(&clip, 63),
            Err(MediaError::TooLarge { size: 64, max: 63 })
        ));
        let codec = format!("data:audio/webm;codecs=opus;base64,{}", STANDARD.encode([1u8; 4]));
        assert!(check_voice_note(&codec, 64).is_ok());
    }
}
