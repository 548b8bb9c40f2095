use quote_ngin::{
    EngineError,
    compositor::{Compositor, GlitchState, PassChain, PassKind, bokeh_blur, view_depth},
    config::{BokehSettings, GlitchSettings},
};

use crate::common::test_utils::{assert_close, quote_config, ready_world};

mod common;

fn seeded(seed: u64) -> GlitchState {
    GlitchState::new(GlitchSettings {
        seed: Some(seed),
        ..Default::default()
    })
}

#[test]
fn should_accept_canonical_chains() {
    use PassKind::*;

    for passes in [
        vec![Render],
        vec![Render, Glitch],
        vec![Render, Bokeh],
        vec![Render, Glitch, Bokeh],
    ] {
        let chain = PassChain::new(passes.clone()).unwrap();
        assert_eq!(chain.passes(), passes.as_slice());
        assert_eq!(chain.output_pass(), *passes.last().unwrap());
    }
    assert!(PassChain::new(vec![Render]).unwrap().is_direct());
    assert!(!PassChain::new(vec![Render, Bokeh]).unwrap().is_direct());
    assert_eq!(PassChain::default(), PassChain::direct());
}

#[test]
fn should_reject_malformed_chains() {
    use PassKind::*;

    for passes in [
        vec![],
        vec![Glitch],
        vec![Glitch, Render],
        vec![Render, Render],
        vec![Render, Bokeh, Glitch],
        vec![Render, Glitch, Glitch],
    ] {
        assert!(
            matches!(PassChain::new(passes.clone()), Err(EngineError::InvalidPassChain(_))),
            "{passes:?} should be rejected"
        );
    }
}

#[test]
fn should_start_bypassed() {
    let glitch = seeded(1);
    assert_eq!(glitch.uniform().bypass, 1);
    let t = glitch.trigger_interval();
    assert!((120..=240).contains(&t), "trigger {t}");
}

#[test]
fn should_follow_the_trigger_cycle() {
    let mut glitch = seeded(42);

    // the counter starts on a multiple of the interval
    let first = glitch.step();
    assert_eq!(first.bypass, 0);
    assert!(first.amount <= 1.0 / 30.0);

    let t = glitch.trigger_interval();
    for frame in 1..t {
        let u = glitch.step();
        if (frame as f32) < t as f32 / 5.0 {
            assert_eq!(u.bypass, 0, "frame {frame} of {t} should glitch mildly");
            assert!(u.amount <= 1.0 / 90.0);
            assert!(u.seed_x.abs() <= 0.3 && u.seed_y.abs() <= 0.3);
        } else {
            assert_eq!(u.bypass, 1, "frame {frame} of {t} should be bypassed");
        }
    }

    let strong = glitch.step();
    assert_eq!(strong.bypass, 0);
    assert!((120..=240).contains(&glitch.trigger_interval()));
}

#[test]
fn should_never_bypass_when_wild() {
    let mut glitch = seeded(3);
    glitch.set_go_wild(true);
    for _ in 0..500 {
        assert_eq!(glitch.step().bypass, 0);
    }
}

#[test]
fn should_repeat_with_the_same_seed() {
    let mut a = seeded(9);
    let mut b = seeded(9);
    assert_eq!(a.trigger_interval(), b.trigger_interval());
    for _ in 0..300 {
        assert_eq!(a.step(), b.step());
    }
    assert_eq!(a.displacement_map(), b.displacement_map());
}

#[test]
fn should_fill_the_displacement_map() {
    let mut glitch = seeded(5);
    let (size, data) = glitch.displacement_map();
    assert_eq!(size, 64);
    assert_eq!(data.len(), 64 * 64 * 4);
    // random bytes, not a constant fill
    assert!(data.iter().any(|b| *b != data[0]));
}

#[test]
fn should_linearize_depth() {
    assert_close(view_depth(0.0, 0.1, 1000.0), 0.1, 1e-5);
    assert_close(view_depth(1.0, 0.1, 1000.0), 1000.0, 1.0);
    let mid = view_depth(0.99, 0.1, 1000.0);
    assert!(mid > 0.1 && mid < 1000.0);
}

#[test]
fn should_clamp_bokeh_blur() {
    let settings = BokehSettings::default();
    assert_close(bokeh_blur(&settings, 10.0), 0.0, 1e-6);
    assert_close(bokeh_blur(&settings, 12.0), 0.004, 1e-6);
    assert_close(bokeh_blur(&settings, 1000.0), 0.01, 1e-6);
    assert_close(bokeh_blur(&settings, 0.0), -0.01, 1e-6);
}

#[test]
fn should_only_step_passes_in_the_chain() {
    let mut compositor = Compositor::new(
        PassChain::direct(),
        GlitchSettings {
            seed: Some(1),
            ..Default::default()
        },
        BokehSettings::default(),
    );
    compositor.glitch_mut().set_go_wild(true);
    for _ in 0..10 {
        compositor.advance();
    }
    assert_eq!(compositor.glitch().uniform().bypass, 1);

    assert!(!compositor.set_size(0, 10));
    assert_eq!(compositor.size(), (1, 1));
}

#[test]
fn should_glitch_identically_in_seeded_worlds() {
    let mut a = ready_world(quote_config());
    let mut b = ready_world(quote_config());
    for _ in 0..250 {
        a.tick();
        b.tick();
        assert_eq!(a.compositor().glitch().uniform(), b.compositor().glitch().uniform());
    }
}
