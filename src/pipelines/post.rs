//! GPU side of the compositor: fullscreen glitch and bokeh passes.
//!
//! Both passes draw one oversized triangle generated in the vertex shader and
//! sample the previous pass's output. The bokeh pass also reads the scene's
//! depth buffer.

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::{
    compositor::{BokehUniform, GlitchUniform},
    data_structures::texture::Texture,
    pipelines::basic::{PipelineState, mk_render_pipeline},
};

pub struct PostResources {
    pub glitch_pipeline: wgpu::RenderPipeline,
    pub bokeh_pipeline: wgpu::RenderPipeline,
    glitch_layout: wgpu::BindGroupLayout,
    bokeh_layout: wgpu::BindGroupLayout,
    glitch_buffer: wgpu::Buffer,
    bokeh_buffer: wgpu::Buffer,
    displacement: Texture,
    sampler: wgpu::Sampler,
}

impl PostResources {
    /// `displacement` is the side length and RGBA bytes of the glitch's
    /// random displacement map.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        displacement: (u32, Vec<u8>),
    ) -> anyhow::Result<Self> {
        let (size, bytes) = displacement;
        let img = image::RgbaImage::from_raw(size, size, bytes)
            .context("displacement map does not match its size")?;
        let displacement = Texture::from_image(
            device,
            queue,
            &image::DynamicImage::ImageRgba8(img),
            Some("glitch displacement"),
        );

        let glitch_layout = mk_post_layout(device, "glitch_bind_group_layout", false);
        let bokeh_layout = mk_post_layout(device, "bokeh_bind_group_layout", true);

        let glitch_pipeline = mk_post_pipeline(
            device,
            "Glitch Pipeline",
            &glitch_layout,
            color_format,
            wgpu::ShaderModuleDescriptor {
                label: Some("Glitch Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("glitch.wgsl").into()),
            },
        );
        let bokeh_pipeline = mk_post_pipeline(
            device,
            "Bokeh Pipeline",
            &bokeh_layout,
            color_format,
            wgpu::ShaderModuleDescriptor {
                label: Some("Bokeh Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("bokeh.wgsl").into()),
            },
        );

        let glitch_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Glitch Uniform Buffer"),
            contents: bytemuck::cast_slice(&[GlitchUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bokeh_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bokeh Uniform Buffer"),
            contents: bytemuck::cast_slice(&[BokehUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            glitch_pipeline,
            bokeh_pipeline,
            glitch_layout,
            bokeh_layout,
            glitch_buffer,
            bokeh_buffer,
            displacement,
            sampler,
        })
    }

    pub fn glitch_bind_group(&self, device: &wgpu::Device, source: &Texture) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.glitch_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.glitch_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.displacement.view),
                },
            ],
            label: Some("glitch_bind_group"),
        })
    }

    pub fn bokeh_bind_group(
        &self,
        device: &wgpu::Device,
        source: &Texture,
        depth: &Texture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bokeh_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.bokeh_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
                },
            ],
            label: Some("bokeh_bind_group"),
        })
    }

    pub fn write_glitch(&self, queue: &wgpu::Queue, uniform: &GlitchUniform) {
        queue.write_buffer(&self.glitch_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }

    pub fn write_bokeh(&self, queue: &wgpu::Queue, uniform: &BokehUniform) {
        queue.write_buffer(&self.bokeh_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}

/// Draw the fullscreen triangle with `pipeline`.
pub fn draw_fullscreen<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    pipeline: &'a wgpu::RenderPipeline,
    bind_group: &'a wgpu::BindGroup,
) {
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

fn mk_post_pipeline(
    device: &wgpu::Device,
    label: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        immediate_size: 0,
    });
    mk_render_pipeline(
        device,
        label,
        &layout,
        color_format,
        PipelineState {
            blend: Some(wgpu::BlendState::REPLACE),
            // the fullscreen triangle winds clockwise
            cull_mode: None,
            depth_write: false,
        },
        None,
        &[],
        shader,
        "fs_main",
    )
}

/// Uniform, color source, sampler and a fourth texture: the displacement map
/// for the glitch, the depth buffer for bokeh.
fn mk_post_layout(device: &wgpu::Device, label: &str, depth: bool) -> wgpu::BindGroupLayout {
    let fourth = if depth {
        wgpu::TextureSampleType::Depth
    } else {
        wgpu::TextureSampleType::Float { filterable: true }
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: fourth,
                },
                count: None,
            },
        ],
        label: Some(label),
    })
}
