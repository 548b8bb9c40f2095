//! Ambient light plus up to two point lights. Static after construction.

use cgmath::{Matrix4, Vector3, Vector4};

use crate::{
    config::{AmbientConfig, LightingConfig, MAX_POINT_LIGHTS, PointLightConfig},
    data_structures::color::Color,
    error::EngineError,
};

/// Receivers are lifted by this much above the ground so projected shadows
/// do not z-fight with it.
const SHADOW_LIFT: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vector3<f32>,
    pub range: f32,
    pub casts_shadow: bool,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

impl PointLight {
    fn from_config(config: &PointLightConfig) -> Self {
        Self {
            color: config.color,
            intensity: config.intensity,
            position: config.position.into(),
            range: config.range.max(0.0),
            casts_shadow: config.casts_shadow,
            shadow_near: config.shadow_near,
            shadow_far: config.shadow_far,
        }
    }

    /// Whether a caster at `point` is inside this light's shadow range.
    pub fn shadows_point(&self, point: Vector3<f32>) -> bool {
        use cgmath::InnerSpace;
        if !self.casts_shadow {
            return false;
        }
        let d = (point - self.position).magnitude();
        d >= self.shadow_near && d <= self.shadow_far
    }

    /// Matrix flattening geometry onto the horizontal plane `y = ground_y`
    /// along rays from this light.
    ///
    /// `None` when the light is not above the plane.
    pub fn planar_shadow_matrix(&self, ground_y: f32) -> Option<Matrix4<f32>> {
        let h = ground_y + SHADOW_LIFT;
        let l = self.position;
        let dot = l.y - h;
        if dot <= f32::EPSILON {
            return None;
        }
        Some(Matrix4::from_cols(
            Vector4::new(dot, 0.0, 0.0, 0.0),
            Vector4::new(-l.x, dot - l.y, -l.z, -1.0),
            Vector4::new(0.0, 0.0, dot, 0.0),
            Vector4::new(l.x * h, l.y * h, l.z * h, dot + h),
        ))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightingRig {
    ambient: AmbientLight,
    point_lights: Vec<PointLight>,
}

impl LightingRig {
    pub fn create(config: &LightingConfig) -> Result<Self, EngineError> {
        if config.point_lights.len() > MAX_POINT_LIGHTS {
            return Err(EngineError::TooManyPointLights {
                max: MAX_POINT_LIGHTS,
                got: config.point_lights.len(),
            });
        }
        let AmbientConfig { color, intensity } = config.ambient.clone();
        Ok(Self {
            ambient: AmbientLight { color, intensity },
            point_lights: config
                .point_lights
                .iter()
                .map(PointLight::from_config)
                .collect(),
        })
    }

    pub fn ambient(&self) -> &AmbientLight {
        &self.ambient
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = &PointLight> {
        self.point_lights.iter().filter(|l| l.casts_shadow)
    }
}
