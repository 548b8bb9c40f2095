//! The animated centerpiece: a cube or sphere that rotates and/or pulses.

use cgmath::Rad;

use crate::{
    config::{ROTATION_STEP, SCALE_MAX, SCALE_MIN, SCALE_STEP},
    data_structures::{
        color::Color,
        geometry::Geometry,
        scene_graph::{SceneNode, ShadowFlags},
        transform::Transform,
    },
};

/// Primitive kind with its dimensions and tessellation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeKind {
    Cube {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
}

impl ShapeKind {
    pub fn geometry(&self) -> Geometry {
        match *self {
            ShapeKind::Cube {
                width,
                height,
                depth,
            } => Geometry::cuboid(width, height, depth),
            ShapeKind::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Geometry::sphere(radius, width_segments, height_segments),
        }
    }
}

/// Which per-frame hooks the world invokes on the shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeAnimation {
    Rotate,
    Pulse,
    RotateAndPulse,
}

impl ShapeAnimation {
    pub fn rotates(self) -> bool {
        matches!(self, ShapeAnimation::Rotate | ShapeAnimation::RotateAndPulse)
    }

    pub fn pulses(self) -> bool {
        matches!(self, ShapeAnimation::Pulse | ShapeAnimation::RotateAndPulse)
    }
}

pub struct Shape {
    kind: ShapeKind,
    geometry: Geometry,
    color: Color,
    transform: Transform,
    shadows: ShadowFlags,
    scale: f32,
    growing: bool,
}

impl Shape {
    /// Build the shape at the origin, scale 1.0 and growing.
    pub fn create(kind: ShapeKind, color: Color) -> Self {
        Self {
            kind,
            geometry: kind.geometry(),
            color,
            transform: Transform::new(),
            shadows: ShadowFlags::BOTH,
            scale: SCALE_MIN,
            growing: true,
        }
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.transform.position = position.into();
        self
    }

    pub fn with_shadows(mut self, shadows: ShadowFlags) -> Self {
        self.shadows = shadows;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Advance the rotation by one frame on the x and y axes.
    ///
    /// Angles are not wrapped; the renderer only sees them through sin/cos.
    pub fn step_rotation(&mut self) {
        let rotation = &mut self.transform.rotation;
        rotation.x = Rad(rotation.x.0 + ROTATION_STEP);
        rotation.y = Rad(rotation.y.0 + ROTATION_STEP);
    }

    /// Move the uniform scale one step towards the current bound, flipping
    /// direction when a bound is reached.
    ///
    /// The value is rounded to two decimals after every step so float drift
    /// can never skip past a bound.
    pub fn step_scale(&mut self) {
        let delta = if self.growing { SCALE_STEP } else { -SCALE_STEP };
        let next = round2(self.scale + delta).clamp(SCALE_MIN, SCALE_MAX);
        if self.growing && next >= SCALE_MAX {
            self.growing = false;
        } else if !self.growing && next <= SCALE_MIN {
            self.growing = true;
        }
        self.apply_scale(next);
    }

    /// Set the scale directly. Values outside `[SCALE_MIN, SCALE_MAX]` are
    /// clamped; the direction flag is left alone unless the value sits on a
    /// bound, in which case it points back into the range.
    pub fn set_scale(&mut self, scale: f32) {
        let scale = if scale.is_finite() {
            round2(scale).clamp(SCALE_MIN, SCALE_MAX)
        } else {
            SCALE_MIN
        };
        if scale >= SCALE_MAX {
            self.growing = false;
        } else if scale <= SCALE_MIN {
            self.growing = true;
        }
        self.apply_scale(scale);
    }

    fn apply_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.transform.set_uniform_scale(scale);
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// Current rotation around x and y in radians.
    pub fn rotation(&self) -> (f32, f32) {
        (self.transform.rotation.x.0, self.transform.rotation.y.0)
    }
}

impl SceneNode for Shape {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn shadows(&self) -> ShadowFlags {
        self.shadows
    }

    fn geometry(&self) -> Option<&Geometry> {
        Some(&self.geometry)
    }

    fn color(&self) -> Color {
        self.color
    }
}

pub(crate) fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
