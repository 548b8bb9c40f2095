use quote_ngin::{
    config::{ROTATION_STEP, SCALE_MAX, SCALE_MIN},
    data_structures::{color::Color, scene_graph::SceneNode},
    objects::shape::{Shape, ShapeAnimation, ShapeKind},
};

use crate::common::test_utils::assert_close;

mod common;

fn sphere() -> Shape {
    Shape::create(
        ShapeKind::Sphere {
            radius: 1.0,
            width_segments: 32,
            height_segments: 32,
        },
        Color::from_hex(0xff5733),
    )
}

#[test]
fn should_start_at_minimum_scale_and_growing() {
    let shape = sphere();
    assert_eq!(shape.scale(), SCALE_MIN);
    assert!(shape.is_growing());
    assert_eq!(shape.rotation(), (0.0, 0.0));
}

#[test]
fn should_flip_direction_exactly_at_the_bounds() {
    let mut shape = sphere();
    let mut previous = shape.scale();
    let mut flips = Vec::new();

    for step in 1..=1000 {
        let was_growing = shape.is_growing();
        shape.step_scale();
        let scale = shape.scale();

        assert!((SCALE_MIN..=SCALE_MAX).contains(&scale), "step {step}: {scale}");
        assert_close((scale - previous).abs(), 0.01, 1e-4);
        if shape.is_growing() != was_growing {
            flips.push((step, scale));
            assert!(scale == SCALE_MAX || scale == SCALE_MIN);
        }
        previous = scale;
    }

    // 200 steps up, 200 down, ...
    assert_eq!(flips[0], (200, SCALE_MAX));
    assert_eq!(flips[1], (400, SCALE_MIN));
    assert_eq!(flips.len(), 5);
}

#[test]
fn should_rotate_both_axes_without_wrapping() {
    let mut shape = sphere();
    for _ in 0..1000 {
        shape.step_rotation();
    }
    let (x, y) = shape.rotation();
    assert_close(x, 1000.0 * ROTATION_STEP, 1e-3);
    assert_close(y, 1000.0 * ROTATION_STEP, 1e-3);
    assert_eq!(shape.transform().rotation.z.0, 0.0);
}

#[test]
fn should_clamp_out_of_range_scale() {
    let mut shape = sphere();

    shape.set_scale(7.5);
    assert_eq!(shape.scale(), SCALE_MAX);
    assert!(!shape.is_growing());

    shape.set_scale(-2.0);
    assert_eq!(shape.scale(), SCALE_MIN);
    assert!(shape.is_growing());

    shape.set_scale(f32::NAN);
    assert_eq!(shape.scale(), SCALE_MIN);

    shape.set_scale(2.456);
    assert_eq!(shape.scale(), 2.46);
    assert_eq!(shape.transform().scale.x, 2.46);
}

#[test]
fn should_select_hooks_from_animation() {
    assert!(ShapeAnimation::Rotate.rotates());
    assert!(!ShapeAnimation::Rotate.pulses());
    assert!(ShapeAnimation::Pulse.pulses());
    assert!(!ShapeAnimation::Pulse.rotates());
    assert!(ShapeAnimation::RotateAndPulse.rotates());
    assert!(ShapeAnimation::RotateAndPulse.pulses());
}

#[test]
fn should_carry_geometry_for_both_kinds() {
    let cube = Shape::create(
        ShapeKind::Cube {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        },
        Color::WHITE,
    );
    let geometry = cube.geometry().expect("shapes always have geometry");
    assert_eq!(geometry.vertices.len(), 24);
    assert_eq!(geometry.triangle_count(), 12);

    let sphere = sphere();
    let geometry = sphere.geometry().expect("shapes always have geometry");
    assert_eq!(geometry.vertices.len(), 33 * 33);
    // the pole rows are fans, one triangle per segment
    assert_eq!(geometry.triangle_count(), 32 * 31 * 2);
}
