use std::io::Cursor;

use image::ImageDecoder as _;

use crate::assets::transcode::Transcoder;
use crate::foundation::core::Surface;
use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// ISO-BMFF brands written by HEIC/HEIF encoders.
const HEIF_BRANDS: [&[u8; 4]; 8] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// Raster format of `bytes` as recognised by the image codec.
pub fn sniff_format(bytes: &[u8]) -> Option<image::ImageFormat> {
    image::guess_format(bytes).ok()
}

/// MIME type of `bytes`, when they are a recognised raster format.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    sniff_format(bytes).map(|f| f.to_mime_type())
}

/// Whether `bytes` start with an ISO-BMFF `ftyp` box carrying a HEIF brand.
pub fn is_heif(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    HEIF_BRANDS.iter().any(|b| &bytes[8..12] == *b)
}

/// Decode encoded image bytes, apply EXIF orientation, and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> PhotoframeResult<Surface> {
    let mut decoder = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PhotoframeError::decode(e.to_string()))?
        .into_decoder()
        .map_err(|e| PhotoframeError::decode(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);
    let mut dyn_img = image::DynamicImage::from_decoder(decoder)
        .map_err(|e| PhotoframeError::decode(e.to_string()))?;
    dyn_img.apply_orientation(orientation);

    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotoframeError::decode("image has zero width or height"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Surface::from_premul(width, height, rgba8_premul)
}

/// Decode a user photo.
///
/// HEIF containers and formats the codec does not recognise go through
/// `transcoder` first when one is given; if transcoding fails the generic
/// decoder still gets a try and its error is the one reported.
pub fn decode_photo(bytes: &[u8], transcoder: Option<&dyn Transcoder>) -> PhotoframeResult<Surface> {
    let needs_transcode = is_heif(bytes) || sniff_format(bytes).is_none();
    if needs_transcode && let Some(t) = transcoder {
        match t.transcode(bytes) {
            Ok(jpeg) => return decode_image(&jpeg),
            Err(err) => {
                tracing::warn!(error = %err, "transcoder failed, falling back to generic decode");
            }
        }
    }
    decode_image(bytes)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
