use anyhow::Context as _;
use image::ImageEncoder as _;

use crate::foundation::core::{Rgba8, Surface};
use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::foundation::math::{mul_div255_u16, unpremul_u8};

/// Flatten a premultiplied surface over an opaque `bg`, producing packed RGB8.
pub fn flatten_to_rgb8(surface: &Surface, bg: Rgba8) -> Vec<u8> {
    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    let mut out = Vec::with_capacity(surface.data.len() / 4 * 3);
    for s in surface.data.chunks_exact(4) {
        let a = u16::from(s[3]);
        if a == 255 {
            out.extend_from_slice(&s[..3]);
            continue;
        }
        let inv = 255u16 - a;
        let r = u16::from(s[0]) + mul_div255_u16(bg_r, inv);
        let g = u16::from(s[1]) + mul_div255_u16(bg_g, inv);
        let b = u16::from(s[2]) + mul_div255_u16(bg_b, inv);
        out.extend_from_slice(&[r.min(255) as u8, g.min(255) as u8, b.min(255) as u8]);
    }
    out
}

/// Convert a premultiplied surface into a straight-alpha [`image::RgbaImage`].
pub fn to_rgba_image(surface: &Surface) -> PhotoframeResult<image::RgbaImage> {
    let mut data = surface.data.clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        px[0] = unpremul_u8(px[0], a);
        px[1] = unpremul_u8(px[1], a);
        px[2] = unpremul_u8(px[2], a);
    }
    image::RgbaImage::from_raw(surface.width, surface.height, data)
        .ok_or_else(|| PhotoframeError::composition("surface buffer does not match its dimensions"))
}

/// Flatten `surface` over `bg` and encode it as baseline JPEG at `quality` (1-100).
pub fn encode_jpeg(surface: &Surface, bg: Rgba8, quality: u8) -> PhotoframeResult<Vec<u8>> {
    if surface.width == 0 || surface.height == 0 {
        return Err(PhotoframeError::composition(
            "cannot encode a zero-size canvas",
        ));
    }
    if !(1..=100).contains(&quality) {
        return Err(PhotoframeError::composition(format!(
            "jpeg quality {quality} is outside 1..=100"
        )));
    }

    let rgb = flatten_to_rgb8(surface, bg);
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            &rgb,
            surface.width,
            surface.height,
            image::ExtendedColorType::Rgb8,
        )
        .context("encode jpeg")
        .map_err(|e| PhotoframeError::composition(format!("{e:#}")))?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
