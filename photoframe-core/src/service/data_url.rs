use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// Decode the payload of a `data:image/<subtype>;base64,` URL.
///
/// A string without a `data:` header is decoded as bare base64. ASCII
/// whitespace inside the payload is ignored.
pub fn decode_data_url(input: &str) -> PhotoframeResult<Vec<u8>> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| PhotoframeError::bad_input("data URL has no ',' separator"))?;
            let Some(mime) = header.strip_suffix(";base64") else {
                return Err(PhotoframeError::bad_input("data URL must be base64 encoded"));
            };
            if !mime.starts_with("image/") {
                return Err(PhotoframeError::bad_input(format!(
                    "data URL media type '{mime}' is not an image"
                )));
            }
            payload
        }
        None => input,
    };

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(PhotoframeError::bad_input("image data is empty"));
    }
    BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PhotoframeError::bad_input(format!("invalid base64 image data: {e}")))
}

/// Encode `bytes` as a `data:<mime>;base64,` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/service/data_url.rs"]
mod tests;
