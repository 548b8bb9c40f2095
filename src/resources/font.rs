//! Font loading and text rasterization for labels.
//!
//! Fonts are fetched once per path: [`FontCache::load`] hands out clones of a
//! shared future, so every label that asks for the same file while it is
//! still loading waits on the same fetch. The resolved font turns a line of
//! text into a [`TextLayout`], a single-channel coverage bitmap that becomes
//! the label's alpha mask.

use std::{collections::HashMap, fmt, sync::Arc};

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle as GlyphStyle};
use futures::{
    FutureExt,
    future::{LocalBoxFuture, Shared},
};

use crate::{config::TextStyle, error::ResourceLoadError, resources::load_binary};

/// A parsed font, cheap to clone.
#[derive(Clone)]
pub struct FontHandle(Arc<fontdue::Font>);

impl FontHandle {
    pub fn from_bytes(path: &str, bytes: &[u8]) -> Result<Self, ResourceLoadError> {
        fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map(|font| Self(Arc::new(font)))
            .map_err(|e| ResourceLoadError::new(path, e))
    }

    pub fn font(&self) -> &fontdue::Font {
        &self.0
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FontHandle").field(&self.0.name()).finish()
    }
}

pub type FontFuture = Shared<LocalBoxFuture<'static, Result<FontHandle, ResourceLoadError>>>;

/// One-shot font fetches keyed by asset path.
#[derive(Default)]
pub struct FontCache {
    fonts: HashMap<String, FontFuture>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared load future for `path`, starting the fetch on first use.
    pub fn load(&mut self, path: &str) -> FontFuture {
        self.fonts
            .entry(path.to_string())
            .or_insert_with(|| {
                let path = path.to_string();
                async move {
                    log::info!("loading font {path}");
                    let bytes = load_binary(&path)
                        .await
                        .map_err(|e| ResourceLoadError::new(path.as_str(), e))?;
                    FontHandle::from_bytes(&path, &bytes)
                }
                .boxed_local()
                .shared()
            })
            .clone()
    }

    /// Insert an already parsed font, e.g. one embedded in the binary.
    pub fn insert(&mut self, path: &str, font: FontHandle) {
        let ready: LocalBoxFuture<'static, _> = futures::future::ready(Ok(font)).boxed_local();
        self.fonts.insert(path.to_string(), ready.shared());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fonts.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// Rasterized text: `width * height` coverage bytes, row-major, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLayout {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl TextLayout {
    pub fn new(width: u32, height: u32, coverage: Vec<u8>) -> Self {
        debug_assert_eq!(coverage.len(), (width * height) as usize);
        Self {
            width,
            height,
            coverage,
        }
    }

    /// Lay out a single line with `font` and blit every glyph into one
    /// bitmap trimmed to the glyph bounds plus padding.
    pub fn rasterize(font: &FontHandle, text: &str, style: &TextStyle) -> Self {
        let font = font.font();
        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &GlyphStyle::new(text, style.raster_px, 0));

        let glyphs: Vec<_> = layout
            .glyphs()
            .iter()
            .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
            .collect();

        let pad = style.padding_px as i32;
        if glyphs.is_empty() {
            let side = (2 * pad).max(1) as u32;
            return Self::new(side, side, vec![0; (side * side) as usize]);
        }

        let min_x = glyphs.iter().map(|g| g.x.floor() as i32).min().unwrap_or(0);
        let min_y = glyphs.iter().map(|g| g.y.floor() as i32).min().unwrap_or(0);
        let max_x = glyphs
            .iter()
            .map(|g| g.x.floor() as i32 + g.width as i32)
            .max()
            .unwrap_or(0);
        let max_y = glyphs
            .iter()
            .map(|g| g.y.floor() as i32 + g.height as i32)
            .max()
            .unwrap_or(0);

        let width = (max_x - min_x + 2 * pad) as u32;
        let height = (max_y - min_y + 2 * pad) as u32;
        let mut coverage = vec![0u8; (width * height) as usize];

        for glyph in glyphs {
            let (metrics, bitmap) = font.rasterize_config(glyph.key);
            let ox = glyph.x.floor() as i32 - min_x + pad;
            let oy = glyph.y.floor() as i32 - min_y + pad;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let x = ox + col as i32;
                    let y = oy + row as i32;
                    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                        continue;
                    }
                    let dst = &mut coverage[y as usize * width as usize + x as usize];
                    *dst = (*dst).max(bitmap[row * metrics.width + col]);
                }
            }
        }

        Self::new(width, height, coverage)
    }

    /// Fraction of pixels with any coverage.
    pub fn ink_ratio(&self) -> f32 {
        if self.coverage.is_empty() {
            return 0.0;
        }
        self.coverage.iter().filter(|&&c| c > 0).count() as f32 / self.coverage.len() as f32
    }
}

/// Load the label font through the cache and rasterize `text` with it.
pub fn load_label(
    cache: &mut FontCache,
    path: &str,
    text: String,
    style: TextStyle,
) -> LocalBoxFuture<'static, Result<TextLayout, ResourceLoadError>> {
    let font = cache.load(path);
    async move {
        let font = font.await?;
        Ok(TextLayout::rasterize(&font, &text, &style))
    }
    .boxed_local()
}
