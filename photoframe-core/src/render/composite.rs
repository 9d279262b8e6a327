use crate::foundation::core::Surface;
use crate::foundation::math::mul_div255_u8;

/// Premultiplied `[r, g, b, a]` pixel.
pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Canvas region touched by a paint, as half-open pixel ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaintedRegion {
    /// First painted column.
    pub x0: u32,
    /// First painted row.
    pub y0: u32,
    /// One past the last painted column.
    pub x1: u32,
    /// One past the last painted row.
    pub y1: u32,
}

/// Paint `src` over `dst` with its top-left corner at `(x, y)` in `dst` pixels.
///
/// Whatever falls outside `dst` is clipped. Returns the painted region, or
/// `None` when `src` lies entirely outside.
pub fn over_at(dst: &mut Surface, src: &Surface, x: i64, y: i64) -> Option<PaintedRegion> {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src.width)).min(i64::from(dst.width));
    let y1 = (y + i64::from(src.height)).min(i64::from(dst.height));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let dst_stride = dst.width as usize * 4;
    let src_stride = src.width as usize * 4;
    let run = (x1 - x0) as usize * 4;
    let sx = (x0 - x) as usize * 4;

    for row in y0..y1 {
        let sy = (row - y) as usize;
        let d_start = row as usize * dst_stride + x0 as usize * 4;
        let s_start = sy * src_stride + sx;
        let d = &mut dst.data[d_start..d_start + run];
        let s = &src.data[s_start..s_start + run];
        for (dp, sp) in d.chunks_exact_mut(4).zip(s.chunks_exact(4)) {
            let out = over([dp[0], dp[1], dp[2], dp[3]], [sp[0], sp[1], sp[2], sp[3]]);
            dp.copy_from_slice(&out);
        }
    }

    Some(PaintedRegion {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
