//! Scene graph: the nodes a frame is composed of and the scene container.
//!
//! The scene does not own the nodes. The [`World`](crate::world::World) owns
//! its shape, ground and labels and the [`Scene`] records which of them are
//! attached, together with the scene-wide background, fog and light state.

use crate::data_structures::{color::Color, geometry::Geometry, transform::Transform};

/// Whether a node casts and/or receives shadows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowFlags {
    pub cast: bool,
    pub receive: bool,
}

impl ShadowFlags {
    pub const NONE: ShadowFlags = ShadowFlags {
        cast: false,
        receive: false,
    };
    pub const BOTH: ShadowFlags = ShadowFlags {
        cast: true,
        receive: true,
    };
    pub const RECEIVE: ShadowFlags = ShadowFlags {
        cast: false,
        receive: true,
    };
}

/// Anything that can be placed in the scene and drawn.
pub trait SceneNode {
    fn transform(&self) -> &Transform;

    fn shadows(&self) -> ShadowFlags;

    /// Geometry in local space. `None` while the node has nothing to draw yet
    /// (a label whose font has not resolved).
    fn geometry(&self) -> Option<&Geometry>;

    fn color(&self) -> Color;
}

/// Exponential squared fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    pub fn new(color: Color, density: f32) -> Self {
        Self {
            color,
            density: density.max(0.0),
        }
    }

    /// Fraction of the fog color mixed in at `distance` from the camera.
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// Identifies a node owned by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Shape,
    Ground,
    Label(usize),
}

/// Scene membership plus scene-wide state.
#[derive(Clone, Debug)]
pub struct Scene {
    pub background: Color,
    pub fog: Option<Fog>,
    members: Vec<NodeId>,
    lights_attached: bool,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            fog: None,
            members: Vec::new(),
            lights_attached: false,
        }
    }

    /// Attach a node. Attaching a node twice is a no-op.
    pub fn add(&mut self, node: NodeId) -> bool {
        if self.members.contains(&node) {
            return false;
        }
        self.members.push(node);
        true
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn attach_lights(&mut self) {
        self.lights_attached = true;
    }

    pub fn lights_attached(&self) -> bool {
        self.lights_attached
    }
}
