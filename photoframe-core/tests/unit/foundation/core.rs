use super::*;

#[test]
fn layout_default_matches_documented_placement() {
    let r = LayoutRect::default();
    assert_eq!((r.x, r.y, r.width, r.height), (100, 150, 1000, 1000));
    assert!(r.fits_within(Canvas::OUTPUT));
}

#[test]
fn layout_rejects_zero_and_oversized_extents() {
    assert!(LayoutRect::new(0, 0, 0, 10).is_err());
    assert!(LayoutRect::new(0, 0, 10, 0).is_err());
    assert!(LayoutRect::new(MAX_LAYOUT_EXTENT + 1, 0, 10, 10).is_err());
    assert!(LayoutRect::new(0, 0, 10, MAX_LAYOUT_EXTENT + 1).is_err());
    LayoutRect::new(0, 0, 1, 1).unwrap();
}

#[test]
fn layout_overflowing_canvas_is_valid_but_does_not_fit() {
    let r = LayoutRect::new(1000, 1400, 400, 400).unwrap();
    assert!(!r.fits_within(Canvas::OUTPUT));
    assert_eq!(r.right(), 1400);
    assert_eq!(r.bottom(), 1800);
}

#[test]
fn layout_serde_uses_plain_field_names() {
    let r: LayoutRect =
        serde_json::from_str(r#"{"x":1,"y":2,"width":3,"height":4}"#).unwrap();
    assert_eq!(r, LayoutRect::new(1, 2, 3, 4).unwrap());
}

#[test]
fn rgba_premul_scales_color_by_alpha() {
    assert_eq!(Rgba8::BACKDROP.to_premul(), [30, 30, 30, 255]);
    let half = Rgba8 {
        r: 200,
        g: 100,
        b: 0,
        a: 128,
    };
    assert_eq!(half.to_premul(), [100, 50, 0, 128]);
}

#[test]
fn surface_filled_and_pixel_access() {
    let s = Surface::filled(3, 2, Rgba8::opaque(1, 2, 3)).unwrap();
    assert_eq!(s.data.len(), 24);
    assert_eq!(s.pixel(2, 1), Some([1, 2, 3, 255]));
    assert_eq!(s.pixel(3, 0), None);
    assert!(Surface::from_premul(2, 2, vec![0; 15]).is_err());
}

#[test]
fn template_role_parses_wire_names() {
    assert_eq!(
        "background".parse::<TemplateRole>().unwrap(),
        TemplateRole::Background
    );
    assert_eq!(
        " overlay ".parse::<TemplateRole>().unwrap(),
        TemplateRole::Overlay
    );
    assert!("config".parse::<TemplateRole>().is_err());
    assert_eq!(TemplateRole::Overlay.to_string(), "overlay");
    assert_eq!(
        serde_json::to_string(&TemplateRole::Background).unwrap(),
        r#""background""#
    );
}
