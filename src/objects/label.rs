//! Floating text lines.
//!
//! A label is created `Pending` with nothing to draw. Once its font has been
//! laid out it is turned into a textured quad whose alpha comes from the
//! rasterized text, and from then on its color follows the world's hue.

use crate::{
    config::{HUE_WRAP, LABEL_LIGHTNESS, LABEL_SATURATION, TextStyle},
    data_structures::{
        color::Color,
        geometry::Geometry,
        scene_graph::{SceneNode, ShadowFlags},
        transform::Transform,
    },
    resources::font::TextLayout,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelState {
    Pending,
    Ready,
}

pub struct Label {
    text: String,
    position: [f32; 3],
    state: LabelState,
    transform: Transform,
    shadows: ShadowFlags,
    geometry: Option<Geometry>,
    layout: Option<TextLayout>,
    color: Color,
    hue: u32,
}

impl Label {
    pub fn new(text: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            text: text.into(),
            position,
            state: LabelState::Pending,
            transform: Transform::at(position.into()),
            shadows: ShadowFlags::NONE,
            geometry: None,
            layout: None,
            color: label_color(0),
            hue: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn state(&self) -> LabelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LabelState::Ready
    }

    /// The rasterized text, available once the label is ready.
    pub fn layout(&self) -> Option<&TextLayout> {
        self.layout.as_ref()
    }

    /// Build the label's quad from a finished text layout.
    ///
    /// Returns `true` the first time only. A second completion for the same
    /// label is ignored so readiness is signalled exactly once.
    pub fn finish(&mut self, layout: TextLayout, style: &TextStyle) -> bool {
        if self.state == LabelState::Ready {
            log::debug!("label {:?} already finished, ignoring", self.text);
            return false;
        }
        let units_per_px = style.size / style.raster_px.max(1.0);
        let width = layout.width as f32 * units_per_px;
        let height = layout.height as f32 * units_per_px;
        let mut geometry = Geometry::plane(width, height);
        geometry.center();

        self.geometry = Some(geometry);
        self.layout = Some(layout);
        self.transform = Transform::at(self.position.into());
        self.shadows = ShadowFlags::BOTH;
        self.state = LabelState::Ready;
        true
    }

    /// Recolor to HSL(hue, 70%, 85%). Hues past 359 are clamped.
    pub fn set_hue(&mut self, hue: u32) {
        let hue = hue.min(HUE_WRAP - 1);
        self.hue = hue;
        self.color = label_color(hue);
    }

    pub fn hue(&self) -> u32 {
        self.hue
    }
}

/// The label color for a hue in degrees.
pub fn label_color(hue: u32) -> Color {
    Color::from_hsl(
        hue as f32 / HUE_WRAP as f32,
        LABEL_SATURATION,
        LABEL_LIGHTNESS,
    )
}

impl SceneNode for Label {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn shadows(&self) -> ShadowFlags {
        self.shadows
    }

    fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    fn color(&self) -> Color {
        self.color
    }
}
