use super::*;
use crate::foundation::core::LayoutRect;
use crate::test_support::{png_from_fn, solid_jpeg, solid_png};

const BLUE: [u8; 4] = [0, 0, 255, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn assert_px_near(got: Option<[u8; 4]>, want: [u8; 4]) {
    let got = got.expect("pixel in bounds");
    for (g, w) in got.iter().zip(want) {
        assert!(g.abs_diff(w) <= 1, "got {got:?}, want {want:?}");
    }
}

/// Overlay that is opaque green on the top fifth of the canvas and clear below.
fn banner_overlay() -> Vec<u8> {
    png_from_fn(120, 150, |_, y| if y < 30 { GREEN } else { [0, 0, 0, 0] })
}

fn full_snapshot() -> PreparedSnapshot {
    PreparedSnapshot::bare(LayoutRect::default())
        .with_template(TemplateRole::Background, "bg", solid_png(12, 15, BLUE))
        .with_template(TemplateRole::Overlay, "ov", banner_overlay())
}

#[test]
fn output_matches_canvas_for_any_photo_shape() {
    let compositor = Compositor::default();
    let snapshot = PreparedSnapshot::bare(LayoutRect::new(0, 0, 1200, 1500).unwrap());
    for (w, h) in [(1, 1), (37, 91), (400, 100), (90, 90)] {
        let out = compositor
            .render(&solid_png(w, h, RED), &snapshot)
            .unwrap();
        assert_eq!((out.width, out.height), (1200, 1500), "{w}x{h}");
    }
}

#[test]
fn extreme_aspect_photos_fill_the_default_layout() {
    let compositor = Compositor::default();
    let snapshot = PreparedSnapshot::bare(LayoutRect::default());
    for (w, h) in [(10, 2000), (2000, 10), (1, 4000)] {
        let out = compositor
            .render(&solid_png(w, h, RED), &snapshot)
            .unwrap();
        assert_eq!((out.width, out.height), (1200, 1500), "{w}x{h}");
        assert_px_near(out.pixel(600, 750), RED);
    }
}

#[test]
fn compose_encodes_full_size_jpeg() {
    let compositor = Compositor::default();
    let jpeg = compositor
        .compose(&solid_jpeg(64, 48, [200, 10, 10]), &full_snapshot())
        .unwrap();
    let img = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((img.width(), img.height()), (1200, 1500));
}

#[test]
fn compose_is_deterministic() {
    let compositor = Compositor::default();
    let photo = png_from_fn(50, 80, |x, y| [(x * 5) as u8, (y * 3) as u8, 77, 255]);
    let snapshot = full_snapshot();
    let a = compositor.compose(&photo, &snapshot).unwrap();
    let b = compositor.compose(&photo, &snapshot).unwrap();
    assert_eq!(a, b);
}

#[test]
fn overlay_occludes_photo_which_occludes_background() {
    let out = Compositor::default()
        .render(&solid_png(30, 20, RED), &full_snapshot())
        .unwrap();

    // inside the photo rect and under the opaque banner
    assert_px_near(out.pixel(600, 200), GREEN);
    // inside the photo rect, overlay clear
    assert_px_near(out.pixel(600, 700), RED);
    // outside the photo rect, overlay clear
    assert_px_near(out.pixel(50, 700), BLUE);
    assert_px_near(out.pixel(600, 1300), BLUE);
}

#[test]
fn missing_templates_leave_backdrop_and_photo() {
    let out = Compositor::default()
        .render(&solid_png(10, 10, RED), &PreparedSnapshot::bare(LayoutRect::default()))
        .unwrap();
    assert_px_near(out.pixel(10, 10), [30, 30, 30, 255]);
    assert_px_near(out.pixel(1150, 1400), [30, 30, 30, 255]);
    assert_px_near(out.pixel(100, 150), RED);
    assert_px_near(out.pixel(1099, 1149), RED);
    assert_px_near(out.pixel(1100, 1149), [30, 30, 30, 255]);
}

#[test]
fn translucent_photo_blends_with_background() {
    let snapshot = PreparedSnapshot::bare(LayoutRect::default()).with_template(
        TemplateRole::Background,
        "bg",
        solid_png(12, 15, BLUE),
    );
    let out = Compositor::default()
        .render(&solid_png(8, 8, [255, 0, 0, 128]), &snapshot)
        .unwrap();
    assert_px_near(out.pixel(600, 600), [128, 0, 127, 255]);
}

#[test]
fn photo_past_canvas_edge_is_clipped() {
    let snapshot = PreparedSnapshot::bare(LayoutRect::new(1100, 1400, 400, 400).unwrap());
    let out = Compositor::default()
        .render(&solid_png(4, 4, RED), &snapshot)
        .unwrap();
    assert_eq!((out.width, out.height), (1200, 1500));
    assert_px_near(out.pixel(1199, 1499), RED);
    assert_px_near(out.pixel(1100, 1400), RED);
    assert_px_near(out.pixel(1099, 1499), [30, 30, 30, 255]);

    let off_canvas = PreparedSnapshot::bare(LayoutRect::new(5000, 5000, 10, 10).unwrap());
    Compositor::default()
        .compose(&solid_png(4, 4, RED), &off_canvas)
        .unwrap();
}

#[test]
fn undecodable_inputs_are_decode_errors() {
    let compositor = Compositor::default();
    let err = compositor
        .compose(b"not an image", &PreparedSnapshot::bare(LayoutRect::default()))
        .unwrap_err();
    assert!(matches!(err, PhotoframeError::Decode(_)));

    let snapshot = PreparedSnapshot::bare(LayoutRect::default()).with_template(
        TemplateRole::Overlay,
        "settings/overlay_1",
        b"garbage".to_vec(),
    );
    let err = compositor
        .compose(&solid_png(4, 4, RED), &snapshot)
        .unwrap_err();
    assert!(matches!(err, PhotoframeError::Decode(_)));
    assert!(err.to_string().contains("overlay template 'settings/overlay_1'"));
}

#[test]
fn zero_size_canvas_is_a_composition_error() {
    let mut snapshot = PreparedSnapshot::bare(LayoutRect::new(0, 0, 1, 1).unwrap());
    snapshot.canvas = Canvas {
        width: 0,
        height: 0,
    };
    let err = Compositor::default()
        .compose(&solid_png(4, 4, RED), &snapshot)
        .unwrap_err();
    assert!(matches!(err, PhotoframeError::Composition(_)));
}

#[test]
fn invalid_area_is_a_composition_error() {
    let snapshot = PreparedSnapshot::bare(LayoutRect {
        x: 0,
        y: 0,
        width: 0,
        height: 100,
    });
    let err = Compositor::default()
        .render(&solid_png(4, 4, RED), &snapshot)
        .unwrap_err();
    assert!(matches!(err, PhotoframeError::Composition(_)));
}
