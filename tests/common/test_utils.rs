use quote_ngin::{
    World, WorldConfig,
    config::GlitchSettings,
    data_structures::color::Color,
    resources::font::TextLayout,
};

/// The default scene with a seeded glitch so runs are reproducible.
pub fn quote_config() -> WorldConfig {
    WorldConfig {
        glitch: GlitchSettings {
            seed: Some(7),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A solid block of text coverage, standing in for a rasterized line.
pub fn fake_layout(width: u32, height: u32) -> TextLayout {
    TextLayout::new(width, height, vec![255; (width * height) as usize])
}

/// Complete the labels in `order` with fake layouts.
pub fn finish_labels(world: &mut World, order: &[usize]) {
    for &index in order {
        world
            .on_label_loaded(index, Ok(fake_layout(120, 40)))
            .expect("label index is valid");
    }
}

/// A world whose labels have all been completed in construction order.
pub fn ready_world(config: WorldConfig) -> World {
    let mut world = World::new(config, 800, 600).expect("valid config");
    let order: Vec<usize> = (0..world.labels().len()).collect();
    finish_labels(&mut world, &order);
    world
}

pub fn assert_close(actual: f32, expected: f32, eps: f32) {
    assert!(
        (actual - expected).abs() <= eps,
        "expected {expected} +- {eps}, got {actual}"
    );
}

pub fn assert_color(actual: Color, expected: [f32; 3]) {
    for (a, e) in actual.to_array().into_iter().zip(expected) {
        assert_close(a, e, 1e-3);
    }
}

/// 8-bit value an sRGB target stores for a linear channel value.
pub fn srgb_u8(linear: f32) -> u8 {
    let c = linear.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

pub fn channel_distance(a: image::Rgba<u8>, b: [u8; 3]) -> u32 {
    (0..3).map(|i| (a.0[i] as i32 - b[i] as i32).unsigned_abs()).sum()
}

#[cfg(feature = "integration-tests")]
pub mod gpu {
    use quote_ngin::{World, WorldConfig, context::Context, render::Renderer};

    /// Headless context, a world of `width` x `height` and its renderer.
    pub async fn headless(config: WorldConfig, width: u32, height: u32) -> (Context, World, Renderer) {
        let ctx = Context::headless(width, height)
            .await
            .expect("a graphics adapter is available");
        let mut world = World::new(config, width, height).expect("valid config");
        let renderer = Renderer::new(&ctx, &mut world).expect("renderer");
        (ctx, world, renderer)
    }
}
