use quote_ngin::{TickOutcome, objects::label::label_color};

use crate::common::test_utils::{assert_color, quote_config, ready_world};

mod common;

#[test]
fn should_animate_the_full_scene() {
    let mut world = ready_world(quote_config());

    for _ in 0..300 {
        assert_eq!(world.tick(), TickOutcome::Frame);
    }

    assert_eq!(world.frames(), 300);
    // 200 frames up to the top, 100 back down
    assert_eq!(world.shape().scale(), 2.0);
    assert!(!world.shape().is_growing());
    assert_eq!(world.shape().rotation(), (0.0, 0.0));

    assert_eq!(world.hue().value(), 300);
    for label in world.labels() {
        assert_eq!(label.hue(), 299);
        assert_color(
            quote_ngin::data_structures::scene_graph::SceneNode::color(label),
            label_color(299).to_array(),
        );
    }
    assert_eq!(world.finalize_count(), 1);
}

#[test]
fn should_keep_hue_in_range_over_long_runs() {
    let mut world = ready_world(quote_config());
    for _ in 0..1000 {
        world.tick();
        assert!(world.hue().value() < 360);
    }
    assert_eq!(world.hue().value(), 1000 % 360);
    assert!((1.0..=3.0).contains(&world.shape().scale()));
}
