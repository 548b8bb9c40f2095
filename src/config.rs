//! Scene configuration and the animation constants.
//!
//! Everything a [`World`](crate::world::World) is built from lives here as
//! plain structs with `Default` impls. `WorldConfig::default()` is the full
//! scene (pulsing sphere, ground, quote labels, glitch and bokeh);
//! [`WorldConfig::rotating_cube`] is the minimal rotating cube rendered
//! straight to the screen.

use crate::{
    compositor::PassKind,
    data_structures::{color::Color, scene_graph::ShadowFlags},
    objects::shape::{ShapeAnimation, ShapeKind},
};

/// Radians added to the shape's x and y rotation every frame.
pub const ROTATION_STEP: f32 = 0.01;
/// Uniform scale change per frame while pulsing.
pub const SCALE_STEP: f32 = 0.01;
pub const SCALE_MIN: f32 = 1.0;
pub const SCALE_MAX: f32 = 3.0;
/// The hue counter runs over `0..HUE_WRAP`.
pub const HUE_WRAP: u32 = 360;
pub const LABEL_SATURATION: f32 = 0.7;
pub const LABEL_LIGHTNESS: f32 = 0.85;
/// Upper bound of the lighting rig.
pub const MAX_POINT_LIGHTS: usize = 2;
pub const DEFAULT_FONT_PATH: &str = "fonts/quote.ttf";

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Where the camera is placed when the scene is finalized.
    pub position: [f32; 3],
    pub look_at: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 1.0, 10.0],
            look_at: [0.0, 1.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeConfig {
    pub kind: ShapeKind,
    pub color: Color,
    pub position: [f32; 3],
    pub animation: ShapeAnimation,
    pub shadows: ShadowFlags,
    pub shininess: f32,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Sphere {
                radius: 1.0,
                width_segments: 32,
                height_segments: 32,
            },
            color: Color::from_hex(0xff5733),
            position: [0.0, 0.0, 0.0],
            animation: ShapeAnimation::Pulse,
            shadows: ShadowFlags::BOTH,
            shininess: 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroundConfig {
    pub width: f32,
    pub depth: f32,
    /// Height of the plane; must sit below every other object.
    pub y: f32,
    pub color: Color,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            depth: 1000.0,
            y: -5.0,
            color: Color::from_hex(0xffffff),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientConfig {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x404040),
            intensity: 1.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLightConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: [f32; 3],
    /// Distance at which the light's contribution reaches zero.
    pub range: f32,
    pub casts_shadow: bool,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x404040),
            intensity: 5.0,
            position: [-3.0, 6.0, -3.0],
            range: 18.0,
            casts_shadow: true,
            shadow_near: 0.1,
            shadow_far: 25.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightingConfig {
    pub ambient: AmbientConfig,
    pub point_lights: Vec<PointLightConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientConfig::default(),
            point_lights: vec![
                PointLightConfig::default(),
                PointLightConfig {
                    color: Color::from_hex(0xffffff),
                    intensity: 1.0,
                    position: [4.0, 8.0, 6.0],
                    range: 40.0,
                    casts_shadow: false,
                    ..Default::default()
                },
            ],
        }
    }
}

/// How label text is turned into geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Height of one em in world units.
    pub size: f32,
    /// Pixel size the glyphs are rasterized at.
    pub raster_px: f32,
    /// Transparent border around the rasterized text, in pixels.
    pub padding_px: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 0.6,
            raster_px: 64.0,
            padding_px: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelLine {
    pub text: String,
    pub position: [f32; 3],
}

impl LabelLine {
    pub fn new(text: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelConfig {
    pub font_path: String,
    pub style: TextStyle,
    pub lines: Vec<LabelLine>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_path: DEFAULT_FONT_PATH.to_string(),
            style: TextStyle::default(),
            lines: vec![
                LabelLine::new("Whatever you are,", [0.0, 4.2, -4.0]),
                LabelLine::new("be a good one.", [0.0, 3.4, -4.0]),
                LabelLine::new("- Abraham Lincoln", [0.0, 2.6, -4.0]),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlitchSettings {
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Frames between strong glitches are drawn from this inclusive range.
    pub trigger_min: u32,
    pub trigger_max: u32,
    /// Side length of the random displacement map.
    pub displacement_size: u32,
}

impl Default for GlitchSettings {
    fn default() -> Self {
        Self {
            seed: None,
            trigger_min: 120,
            trigger_max: 240,
            displacement_size: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BokehSettings {
    /// View-space distance that stays sharp.
    pub focus: f32,
    pub aperture: f32,
    /// Blur radius cap in UV units.
    pub max_blur: f32,
}

impl Default for BokehSettings {
    fn default() -> Self {
        Self {
            focus: 10.0,
            aperture: 0.002,
            max_blur: 0.01,
        }
    }
}

/// When the scene is finalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadyPolicy {
    /// Wait until every label has finished loading.
    #[default]
    AllLabels,
    /// Finalize as soon as the last constructed label finishes, even if its
    /// siblings are still pending. Those appear later when they resolve.
    LastConstructed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FogConfig {
    pub color: Color,
    pub density: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    pub background: Color,
    pub fog: Option<FogConfig>,
    pub camera: CameraConfig,
    pub shape: ShapeConfig,
    pub ground: Option<GroundConfig>,
    pub lighting: LightingConfig,
    pub labels: LabelConfig,
    pub passes: Vec<PassKind>,
    pub glitch: GlitchSettings,
    pub bokeh: BokehSettings,
    pub ready_policy: ReadyPolicy,
    /// Execute frames while labels are still loading. The scene is drawn
    /// without lights, fog or postprocessing until it is finalized.
    pub render_before_ready: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let background = Color::from_hex(0xaaccff);
        Self {
            background,
            fog: Some(FogConfig {
                color: background,
                density: 0.0007,
            }),
            camera: CameraConfig::default(),
            shape: ShapeConfig::default(),
            ground: Some(GroundConfig::default()),
            lighting: LightingConfig::default(),
            labels: LabelConfig::default(),
            passes: vec![PassKind::Render, PassKind::Glitch, PassKind::Bokeh],
            glitch: GlitchSettings::default(),
            bokeh: BokehSettings::default(),
            ready_policy: ReadyPolicy::AllLabels,
            render_before_ready: false,
        }
    }
}

impl WorldConfig {
    /// A unit cube spinning in front of the camera with a single
    /// shadow-casting light, no ground, no labels and no postprocessing.
    pub fn rotating_cube() -> Self {
        Self {
            camera: CameraConfig {
                position: [0.0, 0.0, 5.0],
                look_at: [0.0, 0.0, 0.0],
                ..Default::default()
            },
            shape: ShapeConfig {
                kind: ShapeKind::Cube {
                    width: 1.0,
                    height: 1.0,
                    depth: 1.0,
                },
                animation: ShapeAnimation::Rotate,
                ..Default::default()
            },
            ground: None,
            lighting: LightingConfig {
                ambient: AmbientConfig::default(),
                point_lights: vec![PointLightConfig::default()],
            },
            labels: LabelConfig {
                lines: Vec::new(),
                ..Default::default()
            },
            passes: vec![PassKind::Render],
            render_before_ready: true,
            ..Self::default()
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        if let Some(fog) = self.fog.as_mut() {
            fog.color = background;
        }
        self
    }
}
