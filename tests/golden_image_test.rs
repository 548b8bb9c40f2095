#![cfg(feature = "integration-tests")]

use quote_ngin::WorldConfig;

use crate::common::test_utils::{channel_distance, finish_labels, gpu::headless, quote_config, srgb_u8};

mod common;

const SIZE: (u32, u32) = (160, 120);

#[tokio::test]
async fn should_draw_the_cube_over_the_background() {
    let config = WorldConfig::rotating_cube();
    let background = config.background;
    let (ctx, mut world, mut renderer) = headless(config, SIZE.0, SIZE.1).await;
    for _ in 0..10 {
        world.tick();
    }

    let image = renderer.capture(&ctx, &world).await.unwrap();
    assert_eq!(image.dimensions(), SIZE);

    let expected = background.to_array().map(srgb_u8);
    let corner = *image.get_pixel(1, 1);
    assert!(
        channel_distance(corner, expected) <= 6,
        "corner {corner:?} should be the background {expected:?}"
    );
    let center = *image.get_pixel(SIZE.0 / 2, SIZE.1 / 2);
    assert!(
        channel_distance(center, expected) > 30,
        "center {center:?} should show the cube"
    );
}

#[tokio::test]
async fn should_composite_the_full_scene() {
    let (ctx, mut world, mut renderer) = headless(quote_config(), SIZE.0, SIZE.1).await;
    finish_labels(&mut world, &[0, 1, 2]);
    assert!(world.is_running());
    world.tick();

    let image = renderer.capture(&ctx, &world).await.unwrap();
    assert_eq!(renderer.uploaded_labels(), 3);

    let first = *image.get_pixel(0, 0);
    assert!(
        image.pixels().any(|p| channel_distance(*p, [first[0], first[1], first[2]]) > 30),
        "the frame should not be a single color"
    );
}
