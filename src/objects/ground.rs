//! The ground plane that catches shadows.

use std::f32::consts::FRAC_PI_2;

use cgmath::Rad;

use crate::{
    config::GroundConfig,
    data_structures::{
        color::Color,
        geometry::Geometry,
        scene_graph::{SceneNode, ShadowFlags},
        transform::Transform,
    },
};

pub struct Ground {
    geometry: Geometry,
    transform: Transform,
    color: Color,
}

impl Ground {
    /// A plane of the configured size rotated from XY into XZ (facing +Y) and
    /// lowered to `config.y`.
    pub fn create(config: &GroundConfig) -> Self {
        let mut transform = Transform::at([0.0, config.y, 0.0].into());
        transform.rotation.x = Rad(-FRAC_PI_2);
        Self {
            geometry: Geometry::plane(config.width, config.depth),
            transform,
            color: config.color,
        }
    }

    pub fn height(&self) -> f32 {
        self.transform.position.y
    }
}

impl SceneNode for Ground {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn shadows(&self) -> ShadowFlags {
        ShadowFlags::RECEIVE
    }

    fn geometry(&self) -> Option<&Geometry> {
        Some(&self.geometry)
    }

    fn color(&self) -> Color {
        self.color
    }
}
