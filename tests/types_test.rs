use cardar::types::{Rect, Resolution};

#[test]
fn test_rect_fits_within() {
    let roi = Rect::new(100, 100, 400, 300);
    assert!(roi.fits_within(500, 400));
    assert!(roi.fits_within(1280, 720));
    assert!(!roi.fits_within(499, 400));
    assert!(!roi.fits_within(500, 399));

    // no overflow at the edge of u32
    let far = Rect::new(u32::MAX, 0, 1, 1);
    assert!(!far.fits_within(u32::MAX, 10));
}

#[test]
fn test_rect_serde_shape() {
    let roi: Rect = serde_json::from_str(r#"{"x": 1, "y": 2, "width": 3, "height": 4}"#).unwrap();
    assert_eq!(roi, Rect::new(1, 2, 3, 4));
    assert_eq!(roi.resolution(), Resolution::new(3, 4));
    assert_eq!(roi.to_string(), "(1, 2, 3x4)");
}

#[test]
fn test_empty_shapes() {
    assert!(Rect::new(5, 5, 0, 10).is_empty());
    assert!(Resolution::new(10, 0).is_empty());
    assert_eq!(Resolution::new(400, 300).pixel_count(), 120_000);
}
