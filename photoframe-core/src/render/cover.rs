use image::RgbaImage;
use image::imageops::FilterType;

use crate::foundation::core::Surface;
use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// Geometry of a cover fit: cut a `crop_width x crop_height` window at
/// `(crop_x, crop_y)` out of the source, then resample it to `width x height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverPlan {
    /// Left edge of the crop window in source pixels.
    pub crop_x: u32,
    /// Top edge of the crop window in source pixels.
    pub crop_y: u32,
    /// Crop window width in source pixels.
    pub crop_width: u32,
    /// Crop window height in source pixels.
    pub crop_height: u32,
    /// Target width.
    pub width: u32,
    /// Target height.
    pub height: u32,
}

/// Plan a cover fit of a `src_w x src_h` image into a `dst_w x dst_h` box.
///
/// The aspect ratio is preserved, the box is always fully covered, and the
/// overflow is split evenly between both sides (odd pixels go to the far side).
/// The window is measured in source space so no intermediate larger than the
/// target is ever needed.
pub fn plan_cover(
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> PhotoframeResult<CoverPlan> {
    if src_w == 0 || src_h == 0 {
        return Err(PhotoframeError::decode(
            "source image has zero width or height",
        ));
    }
    if dst_w == 0 || dst_h == 0 {
        return Err(PhotoframeError::composition(
            "cover target must be non-empty",
        ));
    }

    let scale_x = f64::from(dst_w) / f64::from(src_w);
    let scale_y = f64::from(dst_h) / f64::from(src_h);
    let scale = scale_x.max(scale_y);
    let window = |src: u32, dst: u32| -> u32 {
        let v = (f64::from(dst) / scale).round();
        if v >= f64::from(src) {
            src
        } else {
            (v as u32).max(1)
        }
    };
    let crop_width = window(src_w, dst_w);
    let crop_height = window(src_h, dst_h);

    Ok(CoverPlan {
        crop_x: (src_w - crop_width) / 2,
        crop_y: (src_h - crop_height) / 2,
        crop_width,
        crop_height,
        width: dst_w,
        height: dst_h,
    })
}

/// Cover-fit a premultiplied surface to exactly `dst_w x dst_h`.
pub fn cover_fit(
    src: &Surface,
    dst_w: u32,
    dst_h: u32,
    filter: FilterType,
) -> PhotoframeResult<Surface> {
    let plan = plan_cover(src.width, src.height, dst_w, dst_h)?;
    let window = crop_rows(src, &plan)?;

    let mut data = if (plan.crop_width, plan.crop_height) == (plan.width, plan.height) {
        window.into_raw()
    } else {
        image::imageops::resize(&window, plan.width, plan.height, filter).into_raw()
    };
    clamp_premul_in_place(&mut data);
    Surface::from_premul(plan.width, plan.height, data)
}

fn crop_rows(src: &Surface, plan: &CoverPlan) -> PhotoframeResult<RgbaImage> {
    let stride = src.width as usize * 4;
    if src.data.len() != stride * src.height as usize {
        return Err(PhotoframeError::composition(
            "surface buffer does not match its dimensions",
        ));
    }

    let left = plan.crop_x as usize * 4;
    let row_len = plan.crop_width as usize * 4;
    let mut out = Vec::with_capacity(row_len * plan.crop_height as usize);
    for row in src
        .data
        .chunks_exact(stride)
        .skip(plan.crop_y as usize)
        .take(plan.crop_height as usize)
    {
        out.extend_from_slice(&row[left..left + row_len]);
    }

    RgbaImage::from_raw(plan.crop_width, plan.crop_height, out).ok_or_else(|| {
        PhotoframeError::composition("crop window does not fit the source surface")
    })
}

/// Windowed filters can ring past the alpha channel; keep `c <= a`.
fn clamp_premul_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        px[0] = px[0].min(a);
        px[1] = px[1].min(a);
        px[2] = px[2].min(a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cover.rs"]
mod tests;
