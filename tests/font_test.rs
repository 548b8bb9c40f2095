use quote_ngin::{
    World,
    config::{DEFAULT_FONT_PATH, TextStyle},
    resources::font::{FontCache, TextLayout, load_label},
};

use crate::common::test_utils::quote_config;

mod common;

#[tokio::test]
async fn should_load_font_once_per_path() {
    let mut cache = FontCache::new();
    let first = cache.load(DEFAULT_FONT_PATH);
    let second = cache.load(DEFAULT_FONT_PATH);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains(DEFAULT_FONT_PATH));

    let (a, b) = futures::join!(first, second);
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.font().name(), b.font().name());
}

#[tokio::test]
async fn should_rasterize_a_line_of_text() {
    let mut cache = FontCache::new();
    let font = cache.load(DEFAULT_FONT_PATH).await.unwrap();
    let style = TextStyle::default();

    let layout = TextLayout::rasterize(&font, "Whatever you are,", &style);
    assert!(layout.width > layout.height);
    assert_eq!(layout.coverage.len(), (layout.width * layout.height) as usize);
    let ink = layout.ink_ratio();
    assert!(ink > 0.0 && ink < 1.0, "ink ratio {ink}");

    // the padding stays transparent
    assert!(layout.coverage[..layout.width as usize].iter().all(|c| *c == 0));
}

#[tokio::test]
async fn should_rasterize_empty_text_as_padding() {
    let mut cache = FontCache::new();
    let font = cache.load(DEFAULT_FONT_PATH).await.unwrap();
    let layout = TextLayout::rasterize(&font, "", &TextStyle::default());
    assert_eq!((layout.width, layout.height), (8, 8));
    assert_eq!(layout.ink_ratio(), 0.0);
}

#[tokio::test]
async fn should_report_missing_font() {
    let mut cache = FontCache::new();
    let err = load_label(
        &mut cache,
        "fonts/missing.ttf",
        "anything".to_string(),
        TextStyle::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.path, "fonts/missing.ttf");
    assert!(err.to_string().contains("fonts/missing.ttf"));
}

#[tokio::test]
async fn should_reach_running_with_the_bundled_font() {
    let mut world = World::new(quote_config(), 800, 600).unwrap();
    let mut cache = FontCache::new();
    let loads = world.label_loads(&mut cache);
    assert_eq!(loads.len(), 3);
    assert_eq!(cache.len(), 1);

    // deliver in reverse to make sure order does not matter
    let mut results = futures::future::join_all(loads).await;
    results.reverse();
    for (index, result) in results {
        world.on_label_loaded(index, result).unwrap();
    }

    assert!(world.is_running());
    for label in world.labels() {
        let geometry = quote_ngin::data_structures::scene_graph::SceneNode::geometry(label);
        assert!(geometry.is_some(), "label {:?} has no geometry", label.text());
    }
    assert!(world.label_loads(&mut cache).is_empty());
}
