use cascade_core::{Roi, RoiCircle, RoiElement, RoiKind};

#[test]
fn test_element_tagged_by_type() {
    let circle = RoiElement::Circle(RoiCircle {
        center_x: 1.0,
        center_y: 2.0,
        radius: 3.0,
    });
    let json = serde_json::to_value(&circle).unwrap();
    assert_eq!(json["type"], "Circle");
    assert_eq!(json["radius"], 3.0);

    let parsed: RoiElement = serde_json::from_str(
        r#"{"type":"CircleRing","center_x":0,"center_y":0,"inner_radius":1,"outer_radius":2}"#,
    )
    .unwrap();
    assert_eq!(parsed.kind(), RoiKind::CircleRing);
}

#[test]
fn test_roi_keeps_element_order() {
    let roi: Roi = [RoiKind::Rectangle, RoiKind::CircleSegment, RoiKind::Ellipse]
        .into_iter()
        .map(RoiElement::new)
        .collect();
    let json = serde_json::to_string(&roi).unwrap();
    let back: Roi = serde_json::from_str(&json).unwrap();

    assert_eq!(back, roi);
    let kinds: Vec<RoiKind> = back.iter().map(RoiElement::kind).collect();
    assert_eq!(
        kinds,
        vec![RoiKind::Rectangle, RoiKind::CircleSegment, RoiKind::Ellipse]
    );
}
