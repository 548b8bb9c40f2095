use wgpu::util::DeviceExt;

use crate::{
    config::MAX_POINT_LIGHTS,
    data_structures::{color::Color, scene_graph::Scene},
    objects::lighting::LightingRig,
};

/// Everything the mesh shader needs to light and fog a fragment.
#[derive(Debug)]
pub struct LightResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    // xyz: position, w: range
    position: [f32; 4],
    // rgb: color * intensity, w: unused
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    // rgb: ambient color * intensity
    ambient: [f32; 4],
    point_lights: [PointLightRaw; MAX_POINT_LIGHTS],
    // rgb: fog color, w: density (0 disables fog)
    fog: [f32; 4],
    // rgb: color written where a planar shadow lands, w: unused
    shadow: [f32; 4],
    // x: number of point lights
    counts: [u32; 4],
}

impl LightUniform {
    /// Pack the lighting rig and fog of `scene`. A scene whose lights are not
    /// attached yet is drawn unlit.
    pub fn from_scene(scene: &Scene, rig: &LightingRig, ground_color: Option<Color>) -> Self {
        let mut uniform = Self::default();
        if let Some(fog) = scene.fog {
            uniform.fog = fog.color.to_vec4(fog.density);
        }
        if !scene.lights_attached() {
            return uniform;
        }

        let ambient = rig.ambient();
        let ambient_rgb = scale(ambient.color, ambient.intensity);
        uniform.ambient = ambient_rgb.to_vec4(0.0);
        for (raw, light) in uniform.point_lights.iter_mut().zip(rig.point_lights()) {
            raw.position = [
                light.position.x,
                light.position.y,
                light.position.z,
                light.range,
            ];
            raw.color = scale(light.color, light.intensity).to_vec4(0.0);
        }
        uniform.counts[0] = rig.point_lights().len().min(MAX_POINT_LIGHTS) as u32;

        // Shadowed ground only receives ambient light.
        let ground = ground_color.unwrap_or(Color::WHITE);
        uniform.shadow = Color::new(
            ground.r * ambient_rgb.r,
            ground.g * ambient_rgb.g,
            ground.b * ambient_rgb.b,
        )
        .to_vec4(1.0);
        uniform
    }

    pub fn point_light_count(&self) -> u32 {
        self.counts[0]
    }

    pub fn ambient(&self) -> [f32; 3] {
        [self.ambient[0], self.ambient[1], self.ambient[2]]
    }
}

fn scale(color: Color, intensity: f32) -> Color {
    Color::new(color.r * intensity, color.g * intensity, color.b * intensity)
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, LightUniform::default());
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: &LightUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}
