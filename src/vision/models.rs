// Frame formats and the validated payload handed to the classifier
// Author: kelexine (https://github.com/kelexine)

use crate::error::{DetectorError, Result};

/// Gemini rejects inline data above 20 MiB once decoded
pub const MAX_IMAGE_SIZE_BYTES: usize = 20 * 1024 * 1024;

/// Frame encodings Gemini accepts as inline data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Heic,
}

impl ImageFormat {
    const ALL: [ImageFormat; 5] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::WebP,
        ImageFormat::Gif,
        ImageFormat::Heic,
    ];

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Heic => "image/heic",
        }
    }

    /// Format named by a declared MIME type, e.g. from a `data:` URL
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "image/jpg" {
            return Some(ImageFormat::Jpeg);
        }
        Self::ALL.into_iter().find(|f| f.mime_type() == mime)
    }

    /// Format identified by the magic bytes of decoded data
    pub fn sniff(data: &[u8]) -> Option<Self> {
        let brand = data.get(4..12);
        match data {
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageFormat::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(ImageFormat::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(ImageFormat::WebP),
            _ if matches!(brand, Some(b"ftypheic") | Some(b"ftypheix")) => Some(ImageFormat::Heic),
            _ => None,
        }
    }
}

/// A validated frame ready to be sent to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub format: ImageFormat,
    /// Base64 data without any `data:` URL prefix
    pub data: String,
}

impl ImagePayload {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Reject decoded frames larger than Gemini accepts
pub fn validate_image_size(decoded_len: usize) -> Result<()> {
    if decoded_len > MAX_IMAGE_SIZE_BYTES {
        return Err(DetectorError::InvalidRequest(format!(
            "image is {} bytes, the limit is {} bytes",
            decoded_len, MAX_IMAGE_SIZE_BYTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"\x89PNG\r\n\x1a\n...."), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::sniff(b"\0\0\0\x18ftypheic...."), Some(ImageFormat::Heic));
        assert_eq!(ImageFormat::sniff(b"hello"), None);
        assert_eq!(ImageFormat::sniff(&[]), None);
    }

    #[test]
    fn test_mime_round_trip_and_alias() {
        assert_eq!(ImageFormat::from_mime_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_size_limit() {
        assert!(validate_image_size(MAX_IMAGE_SIZE_BYTES).is_ok());
        assert!(matches!(
            validate_image_size(MAX_IMAGE_SIZE_BYTES + 1),
            Err(DetectorError::InvalidRequest(_))
        ));
    }
}
