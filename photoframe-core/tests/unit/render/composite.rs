use super::*;
use crate::foundation::core::Rgba8;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [0, 0, 0, 0];
    assert_eq!(over(dst, src), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_half_alpha_blends_onto_opaque() {
    let dst = [200, 0, 0, 255];
    let src = [0, 0, 128, 128];
    let out = over(dst, src);
    assert_eq!(out, [100, 0, 128, 255]);
}

#[test]
fn over_at_inside_paints_exact_rect() {
    let mut dst = Surface::filled(4, 4, Rgba8::opaque(0, 0, 0)).unwrap();
    let src = Surface::filled(2, 2, Rgba8::opaque(9, 9, 9)).unwrap();

    let region = over_at(&mut dst, &src, 1, 2).unwrap();
    assert_eq!(
        region,
        PaintedRegion {
            x0: 1,
            y0: 2,
            x1: 3,
            y1: 4
        }
    );
    assert_eq!(dst.pixel(0, 2), Some([0, 0, 0, 255]));
    assert_eq!(dst.pixel(1, 2), Some([9, 9, 9, 255]));
    assert_eq!(dst.pixel(2, 3), Some([9, 9, 9, 255]));
    assert_eq!(dst.pixel(3, 3), Some([0, 0, 0, 255]));
}

#[test]
fn over_at_clips_overflow_on_every_side() {
    let mut dst = Surface::filled(3, 3, Rgba8::opaque(0, 0, 0)).unwrap();
    let src = Surface::filled(5, 5, Rgba8::opaque(7, 7, 7)).unwrap();

    let region = over_at(&mut dst, &src, -1, -1).unwrap();
    assert_eq!((region.x0, region.y0, region.x1, region.y1), (0, 0, 3, 3));
    assert!(dst.data.chunks_exact(4).all(|p| p == [7, 7, 7, 255]));

    let mut dst = Surface::filled(3, 3, Rgba8::opaque(0, 0, 0)).unwrap();
    let region = over_at(&mut dst, &src, 2, 1).unwrap();
    assert_eq!((region.x0, region.y0, region.x1, region.y1), (2, 1, 3, 3));
    assert_eq!(dst.pixel(1, 1), Some([0, 0, 0, 255]));
    assert_eq!(dst.pixel(2, 2), Some([7, 7, 7, 255]));
}

#[test]
fn over_at_fully_outside_is_noop() {
    let mut dst = Surface::filled(3, 3, Rgba8::opaque(1, 1, 1)).unwrap();
    let before = dst.clone();
    let src = Surface::filled(2, 2, Rgba8::opaque(5, 5, 5)).unwrap();
    assert_eq!(over_at(&mut dst, &src, 3, 0), None);
    assert_eq!(over_at(&mut dst, &src, -2, 0), None);
    assert_eq!(dst, before);
}
