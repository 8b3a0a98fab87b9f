// Frame payload validation
// Author: kelexine (https://github.com/kelexine)

use super::models::{validate_image_size, ImageFormat, ImagePayload};
use crate::error::{DetectorError, Result};
use base64::Engine;

/// Validate a base64 frame from the extension and detect its format.
///
/// Accepts bare base64 or a `data:image/...;base64,` URL. Frames whose format
/// cannot be sniffed are treated as JPEG, which is what the extension captures.
pub fn prepare_image(payload: &str) -> Result<ImagePayload> {
    let (declared, data) = split_data_url(payload.trim());

    if data.is_empty() {
        return Err(DetectorError::InvalidRequest("Image data is empty".to_string()));
    }

    // Decode base64 to validate and get size
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| DetectorError::InvalidRequest(format!("Invalid base64 image data: {}", e)))?;

    validate_image_size(decoded.len())?;

    let format = ImageFormat::sniff(&decoded)
        .or_else(|| declared.and_then(ImageFormat::from_mime_type))
        .unwrap_or(ImageFormat::Jpeg);

    Ok(ImagePayload {
        format,
        data: data.to_string(),
    })
}

/// Split `data:<mime>;base64,<data>` into its MIME type and data
fn split_data_url(payload: &str) -> (Option<&str>, &str) {
    let Some(rest) = payload.strip_prefix("data:") else {
        return (None, payload);
    };
    match rest.split_once(',') {
        Some((header, data)) => (header.split(';').next(), data),
        None => (None, payload),
    }
}
