use std::{cell::RefCell, rc::Rc};

use quote_ngin::{
    EngineError, ResourceLoadError, TickOutcome, World, WorldConfig, WorldState,
    config::{PointLightConfig, ReadyPolicy},
    data_structures::scene_graph::NodeId,
    world::{HueState, ReadinessBarrier},
};

use crate::common::test_utils::{fake_layout, finish_labels, quote_config, ready_world};

mod common;

const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

#[test]
fn should_finalize_once_after_every_label_in_any_order() {
    for order in PERMUTATIONS {
        let mut world = World::new(quote_config(), 800, 600).unwrap();
        assert_eq!(*world.state(), WorldState::AwaitingResources);

        for (n, &index) in order.iter().enumerate() {
            let finalized = world
                .on_label_loaded(index, Ok(fake_layout(64, 16)))
                .unwrap();
            let last = n + 1 == order.len();
            assert_eq!(finalized, last, "order {order:?}, arrival {n}");
            assert_eq!(world.finalize_count(), last as u32);
            assert_eq!(world.is_running(), last);
        }
        assert!(world.labels().iter().all(|l| l.is_ready()));
    }
}

#[test]
fn should_ignore_duplicate_completions() {
    let mut world = World::new(quote_config(), 800, 600).unwrap();
    finish_labels(&mut world, &[0, 0, 1, 1]);
    assert!(!world.is_running());
    assert!(world.on_label_loaded(2, Ok(fake_layout(8, 8))).unwrap());
    assert!(!world.on_label_loaded(2, Ok(fake_layout(8, 8))).unwrap());
    assert_eq!(world.finalize_count(), 1);
}

#[test]
fn should_reject_unknown_label_index() {
    let mut world = World::new(quote_config(), 800, 600).unwrap();
    assert_eq!(
        world.on_label_loaded(7, Ok(fake_layout(8, 8))),
        Err(EngineError::UnknownLabel(7))
    );
}

#[test]
fn should_not_run_frames_while_waiting() {
    let mut world = World::new(quote_config(), 800, 600).unwrap();
    finish_labels(&mut world, &[0, 2]);

    for _ in 0..10 {
        assert_eq!(world.tick(), TickOutcome::Waiting);
    }
    assert_eq!(world.frames(), 0);
    assert_eq!(world.hue().value(), 0);
    assert_eq!(world.shape().scale(), 1.0);
    assert!(world.scene().members().is_empty());
    assert!(!world.scene().lights_attached());
    assert!(!world.is_compositor_attached());
}

#[test]
fn should_finalize_the_scene() {
    let world = ready_world(quote_config());
    let scene = world.scene();

    assert!(scene.contains(NodeId::Shape));
    assert!(scene.contains(NodeId::Ground));
    for i in 0..3 {
        assert!(scene.contains(NodeId::Label(i)));
    }
    assert!(scene.lights_attached());
    assert_eq!(scene.background, world.config().background);
    assert_eq!(scene.fog.map(|f| f.density), Some(0.0007));
    assert_eq!(world.camera().position, cgmath::Point3::new(0.0, 1.0, 10.0));
    assert_eq!(world.camera().target, cgmath::Point3::new(0.0, 1.0, 0.0));
    assert!(world.is_compositor_attached());
}

#[test]
fn should_fail_on_load_error_and_report_it() {
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();
    let mut world = World::new(quote_config(), 800, 600)
        .unwrap()
        .with_error_handler(move |err| sink.borrow_mut().push(err.clone()));

    let err = ResourceLoadError::new("fonts/quote.ttf", "connection reset");
    finish_labels(&mut world, &[0]);
    assert!(!world.on_label_loaded(1, Err(err.clone())).unwrap());

    assert_eq!(*world.state(), WorldState::Failed(err.clone()));
    assert_eq!(*reported.borrow(), vec![err]);
    assert_eq!(world.tick(), TickOutcome::Failed);

    // later completions change nothing
    assert!(!world.on_label_loaded(2, Ok(fake_layout(8, 8))).unwrap());
    assert_eq!(world.finalize_count(), 0);
    assert!(!world.scene().lights_attached());
    assert_eq!(reported.borrow().len(), 1);
}

#[test]
fn should_finalize_on_last_constructed_label_under_that_policy() {
    let config = WorldConfig {
        ready_policy: ReadyPolicy::LastConstructed,
        ..quote_config()
    };
    let mut world = World::new(config, 800, 600).unwrap();

    assert!(world.on_label_loaded(2, Ok(fake_layout(8, 8))).unwrap());
    assert!(world.is_running());
    assert!(!world.labels()[0].is_ready());

    // stragglers still become ready but never finalize again
    assert!(!world.on_label_loaded(0, Ok(fake_layout(8, 8))).unwrap());
    assert!(world.labels()[0].is_ready());
    assert_eq!(world.finalize_count(), 1);

    // a late failure is reported but the world keeps running
    let err = ResourceLoadError::new("fonts/quote.ttf", "gone");
    world.on_label_loaded(1, Err(err)).unwrap();
    assert!(world.is_running());
    assert_eq!(world.tick(), TickOutcome::Frame);
}

#[test]
fn should_finalize_immediately_without_labels() {
    let mut world = World::new(WorldConfig::rotating_cube(), 800, 600).unwrap();
    assert!(world.is_running());
    assert_eq!(world.finalize_count(), 1);
    assert!(world.label_loads(&mut Default::default()).is_empty());

    world.tick();
    assert_eq!(world.shape().scale(), 1.0);
    assert_eq!(world.shape().rotation(), (0.01, 0.01));
}

#[test]
fn should_render_before_ready_when_asked() {
    let config = WorldConfig {
        render_before_ready: true,
        ..quote_config()
    };
    let mut world = World::new(config, 800, 600).unwrap();

    assert_eq!(*world.state(), WorldState::AwaitingResources);
    assert!(world.scene().contains(NodeId::Shape));
    assert!(world.scene().contains(NodeId::Ground));
    assert!(!world.scene().lights_attached());

    assert_eq!(world.tick(), TickOutcome::Frame);
    assert_eq!(world.hue().value(), 1);
    assert!(!world.is_compositor_attached());
}

#[test]
fn should_stop_when_flag_is_set() {
    let mut world = ready_world(quote_config());
    assert_eq!(world.tick(), TickOutcome::Frame);

    let handle = world.stop_handle();
    handle.stop();
    assert!(handle.is_stopped());
    assert_eq!(world.tick(), TickOutcome::Stopped);
    assert_eq!(world.outcome(), TickOutcome::Stopped);
    assert_eq!(world.frames(), 1);
}

#[test]
fn should_reject_too_many_point_lights() {
    let mut config = quote_config();
    config.lighting.point_lights = vec![PointLightConfig::default(); 3];
    assert_eq!(
        World::new(config, 800, 600).err(),
        Some(EngineError::TooManyPointLights { max: 2, got: 3 })
    );
}

#[test]
fn should_skip_zero_sized_resize() {
    let mut world = ready_world(quote_config());
    let aspect = world.projection().aspect();

    assert!(!world.resize(0, 600));
    assert!(!world.resize(800, 0));
    assert_eq!(world.projection().aspect(), aspect);

    assert!(world.resize(1000, 500));
    assert_eq!(world.projection().aspect(), 2.0);
    assert_eq!(world.compositor().size(), (1000, 500));
}

#[test]
fn should_wrap_hue_at_360() {
    let mut hue = HueState::default();
    for n in 1..=1000u32 {
        hue.advance();
        assert_eq!(hue.value(), n % 360);
    }
}

#[test]
fn should_open_barrier_once() {
    let mut barrier = ReadinessBarrier::new(2, ReadyPolicy::AllLabels);
    assert!(!barrier.is_open());
    assert!(!barrier.arrive(1));
    assert_eq!(barrier.pending(), 1);
    assert!(barrier.arrive(0));
    assert!(!barrier.arrive(0));
    assert!(barrier.is_open());

    assert!(ReadinessBarrier::new(0, ReadyPolicy::AllLabels).is_open());
    assert!(!ReadinessBarrier::new(1, ReadyPolicy::AllLabels).arrive(5));
}
