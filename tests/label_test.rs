use quote_ngin::{
    config::TextStyle,
    data_structures::{
        color::Color,
        scene_graph::{SceneNode, ShadowFlags},
    },
    objects::label::{Label, LabelState, label_color},
};

use crate::common::test_utils::{assert_close, assert_color, fake_layout};

mod common;

#[test]
fn should_match_hsl_at_primary_hues() {
    // HSL(h, 70%, 85%): q = 0.955, p = 0.745
    let mut label = Label::new("be a good one.", [0.0, 3.4, -4.0]);
    for (hue, expected) in [
        (0, [0.955, 0.745, 0.745]),
        (120, [0.745, 0.955, 0.745]),
        (240, [0.745, 0.745, 0.955]),
    ] {
        label.set_hue(hue);
        assert_eq!(label.hue(), hue);
        assert_color(label.color(), expected);
        assert_eq!(label.color(), label_color(hue));
    }
}

#[test]
fn should_clamp_hue() {
    let mut label = Label::new("x", [0.0; 3]);
    label.set_hue(1000);
    assert_eq!(label.hue(), 359);
    assert_eq!(label.color(), Color::from_hsl(359.0 / 360.0, 0.7, 0.85));
}

#[test]
fn should_start_pending_without_geometry() {
    let label = Label::new("Whatever you are,", [0.0, 4.2, -4.0]);
    assert_eq!(label.state(), LabelState::Pending);
    assert!(label.geometry().is_none());
    assert!(label.layout().is_none());
    assert_eq!(label.shadows(), ShadowFlags::NONE);
}

#[test]
fn should_become_ready_exactly_once() {
    let style = TextStyle::default();
    let mut label = Label::new("Whatever you are,", [0.0, 4.2, -4.0]);

    assert!(label.finish(fake_layout(128, 64), &style));
    assert!(label.is_ready());
    assert!(!label.finish(fake_layout(10, 10), &style));
    assert_eq!(label.layout().map(|l| l.width), Some(128));
}

#[test]
fn should_build_a_centered_quad_sized_by_style() {
    let style = TextStyle {
        size: 0.6,
        raster_px: 64.0,
        padding_px: 4,
    };
    let mut label = Label::new("- Abraham Lincoln", [1.0, 2.6, -4.0]);
    label.finish(fake_layout(128, 64), &style);

    let geometry = label.geometry().expect("ready labels have geometry");
    let (min, max) = geometry.bounds().expect("non-empty");
    assert_close(max[0] - min[0], 128.0 * 0.6 / 64.0, 1e-5);
    assert_close(max[1] - min[1], 0.6, 1e-5);
    assert_close(min[0] + max[0], 0.0, 1e-5);
    assert_close(min[1] + max[1], 0.0, 1e-5);

    assert_eq!(
        label.transform().position,
        cgmath::Vector3::new(1.0, 2.6, -4.0)
    );
    assert_eq!(label.shadows(), ShadowFlags::BOTH);
}
