//! Data URI encoding and decoding for generated images

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{AppError, Result};

/// Media type the inference endpoint is assumed to return
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// Encode binary data to a base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Create a data URI from binary image data
pub fn to_data_uri(data: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", media_type, encode(data))
}

/// Decode a data URI (or a bare base64 string) back into bytes
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                AppError::Validation("data URI has no payload separator".to_string())
            })?;
            if !header.ends_with(";base64") {
                return Err(AppError::Validation(format!(
                    "data URI is not base64 encoded: {}",
                    header
                )));
            }
            payload
        }
        None => encoded,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Validation(format!("Invalid base64 data: {}", e)))
}

/// Get the media type from a data URI prefix, e.g. `image/jpeg`
pub fn media_type(data_uri: &str) -> Option<&str> {
    let rest = data_uri.strip_prefix("data:")?;
    let end = rest.find(|c: char| c == ';' || c == ',')?;
    Some(&rest[..end]).filter(|mt| !mt.is_empty())
}
