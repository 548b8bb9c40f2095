//! Drawing a [`World`] with wgpu.
//!
//! The [`Renderer`] owns the scene pipelines, the GPU copies of the world's
//! nodes and the offscreen targets of the compositor. Each frame it
//!
//! 1. uploads camera, light, instance and label color data ([`Renderer::prepare`]),
//! 2. draws the scene: opaque meshes, planar shadows, then labels,
//! 3. runs the postprocessing chain, the last pass writing to the output.
//!
//! With a direct chain, or before the scene is finalized, step 2 writes
//! straight to the output and step 3 is skipped.

use std::{iter, time::Duration};

use anyhow::Context as _;
use cgmath::Vector3;
use wgpu::util::DeviceExt;

use crate::{
    compositor::{BokehUniform, PassKind},
    config::MAX_POINT_LIGHTS,
    context::Context,
    data_structures::{
        geometry::Geometry,
        model::{DrawMesh, Material, MaterialUniform, Mesh, material_bind_group_layout},
        scene_graph::{NodeId, SceneNode},
        texture::Texture,
        transform::InstanceRaw,
    },
    pipelines::{
        basic::{mk_basic_pipeline, mk_scene_layout},
        light::LightUniform,
        post::{PostResources, draw_fullscreen},
        shadow::mk_shadow_pipeline,
        transparent::mk_transparent_pipeline,
    },
    world::World,
};

const SHAPE_SPECULAR: f32 = 0.5;
const LABEL_SHININESS: f32 = 30.0;
const LABEL_SPECULAR: f32 = 0.3;

/// A scene node uploaded to the GPU.
struct GpuNode {
    mesh: Mesh,
    material: Material,
    instance_buffer: wgpu::Buffer,
    shadow_buffer: wgpu::Buffer,
    shadow_count: u32,
}

impl GpuNode {
    fn new(
        device: &wgpu::Device,
        name: &str,
        geometry: &Geometry,
        uniform: MaterialUniform,
        texture: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let mesh = Mesh::new(device, name, geometry);
        let material = Material::new(device, name, uniform, texture, layout);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Instance Buffer")),
            contents: bytemuck::cast_slice(&[InstanceRaw::from_matrix(cgmath::Matrix4::from_scale(
                1.0,
            ))]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let shadow_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name} Shadow Instance Buffer")),
            size: (std::mem::size_of::<InstanceRaw>() * MAX_POINT_LIGHTS) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            mesh,
            material,
            instance_buffer,
            shadow_buffer,
            shadow_count: 0,
        }
    }

    /// Upload the node's model matrix and one flattened copy per light that
    /// shadows it onto the ground.
    fn write_instances(&mut self, queue: &wgpu::Queue, node: &dyn SceneNode, world: &World) {
        let model = node.transform().to_matrix();
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[InstanceRaw::from_matrix(model)]),
        );

        let shadows = shadow_instances(node, world);
        self.shadow_count = shadows.len() as u32;
        if !shadows.is_empty() {
            queue.write_buffer(&self.shadow_buffer, 0, bytemuck::cast_slice(&shadows));
        }
    }

    fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        camera: &'a wgpu::BindGroup,
        light: &'a wgpu::BindGroup,
    ) {
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.draw_mesh_instanced(&self.mesh, &self.material, 0..1, camera, light);
    }

    fn draw_shadows<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        camera: &'a wgpu::BindGroup,
        light: &'a wgpu::BindGroup,
    ) {
        if self.shadow_count == 0 {
            return;
        }
        pass.set_vertex_buffer(1, self.shadow_buffer.slice(..));
        pass.draw_mesh_instanced(
            &self.mesh,
            &self.material,
            0..self.shadow_count,
            camera,
            light,
        );
    }
}

/// Flattened model matrices of `node` for every light allowed to shadow it.
///
/// Shadows need a lit scene, a shadow-receiving ground in the scene and a
/// casting node; lights whose shadow range does not reach the node are
/// skipped.
pub fn shadow_instances(node: &dyn SceneNode, world: &World) -> Vec<InstanceRaw> {
    let Some(ground) = world.ground() else {
        return Vec::new();
    };
    let scene = world.scene();
    if !node.shadows().cast
        || !ground.shadows().receive
        || !scene.lights_attached()
        || !scene.contains(NodeId::Ground)
    {
        return Vec::new();
    }
    let model = node.transform().to_matrix();
    let position: Vector3<f32> = node.transform().position;
    world
        .lighting()
        .shadow_casters()
        .filter(|light| light.shadows_point(position))
        .filter_map(|light| light.planar_shadow_matrix(ground.height()))
        .take(MAX_POINT_LIGHTS)
        .map(|flatten| InstanceRaw::from_matrix(flatten * model))
        .collect()
}

/// Offscreen textures sized to the viewport.
struct Targets {
    depth: Texture,
    scene: Texture,
    ping: Texture,
    glitch: wgpu::BindGroup,
    bokeh: wgpu::BindGroup,
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        post: &PostResources,
        size: [u32; 2],
        format: wgpu::TextureFormat,
        glitch_first: bool,
    ) -> Self {
        let depth = Texture::create_depth_texture(device, size, "depth_texture");
        let scene = Texture::create_render_target(device, size, format, "scene target");
        let ping = Texture::create_render_target(device, size, format, "ping target");
        let glitch = post.glitch_bind_group(device, &scene);
        // bokeh reads the glitch output when the glitch runs before it
        let bokeh_source = if glitch_first { &ping } else { &scene };
        let bokeh = post.bokeh_bind_group(device, bokeh_source, &depth);
        Self {
            depth,
            scene,
            ping,
            glitch,
            bokeh,
        }
    }
}

pub struct Renderer {
    basic_pipeline: wgpu::RenderPipeline,
    label_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    post: PostResources,
    shape: GpuNode,
    ground: Option<GpuNode>,
    labels: Vec<Option<GpuNode>>,
    targets: Targets,
}

impl Renderer {
    /// Create pipelines and upload the world's synchronous nodes. Labels are
    /// uploaded lazily once their text is ready.
    pub fn new(ctx: &Context, world: &mut World) -> anyhow::Result<Self> {
        let device = &ctx.device;
        let material_layout = material_bind_group_layout(device);
        let layout = mk_scene_layout(
            device,
            &ctx.camera.bind_group_layout,
            &ctx.light.bind_group_layout,
            &material_layout,
        );
        let format = ctx.format();
        let basic_pipeline = mk_basic_pipeline(device, &layout, format);
        let label_pipeline = mk_transparent_pipeline(device, &layout, format);
        let shadow_pipeline = mk_shadow_pipeline(device, &layout, format);

        let displacement = world.compositor_mut().glitch_mut().displacement_map();
        let post = PostResources::new(device, &ctx.queue, format, displacement)?;
        let white = Texture::create_white(device, &ctx.queue);

        let shape = world.shape();
        let shape_geometry = shape.geometry().context("shape has no geometry")?;
        let shape = GpuNode::new(
            device,
            "shape",
            shape_geometry,
            MaterialUniform::new(shape.color(), world.config().shape.shininess, SHAPE_SPECULAR),
            white.clone(),
            &material_layout,
        );
        let ground = match world.ground() {
            Some(ground) => {
                let geometry = ground.geometry().context("ground has no geometry")?;
                Some(GpuNode::new(
                    device,
                    "ground",
                    geometry,
                    MaterialUniform::new(ground.color(), 1.0, 0.0),
                    white.clone(),
                    &material_layout,
                ))
            }
            None => None,
        };
        let labels = world.labels().iter().map(|_| None).collect();

        let (width, height) = ctx.size();
        let targets = Targets::new(
            device,
            &post,
            [width, height],
            format,
            world.compositor().chain().contains(PassKind::Glitch),
        );

        Ok(Self {
            basic_pipeline,
            label_pipeline,
            shadow_pipeline,
            material_layout,
            post,
            shape,
            ground,
            labels,
            targets,
        })
    }

    /// Recreate the size-dependent targets. Zero dimensions are ignored.
    pub fn resize(&mut self, ctx: &Context, world: &World) -> bool {
        let (width, height) = ctx.size();
        if width == 0 || height == 0 {
            return false;
        }
        self.targets = Targets::new(
            &ctx.device,
            &self.post,
            [width, height],
            ctx.format(),
            world.compositor().chain().contains(PassKind::Glitch),
        );
        true
    }

    /// Number of labels whose quad has been uploaded.
    pub fn uploaded_labels(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    /// Push this frame's uniforms and instances.
    pub fn prepare(&mut self, ctx: &Context, world: &World) -> anyhow::Result<()> {
        let queue = &ctx.queue;
        ctx.camera.write(queue, world.camera(), world.projection());
        let ground_color = world.ground().map(|g| g.color());
        ctx.light.write(
            queue,
            &LightUniform::from_scene(world.scene(), world.lighting(), ground_color),
        );

        self.shape.write_instances(queue, world.shape(), world);
        if let (Some(gpu), Some(ground)) = (self.ground.as_mut(), world.ground()) {
            gpu.write_instances(queue, ground, world);
        }

        for (index, label) in world.labels().iter().enumerate() {
            let Some(slot) = self.labels.get_mut(index) else {
                continue;
            };
            if slot.is_none() {
                let (Some(layout), Some(geometry)) = (label.layout(), label.geometry()) else {
                    continue;
                };
                let name = format!("label {index}");
                let mask = Texture::from_coverage(
                    &ctx.device,
                    queue,
                    layout.width,
                    layout.height,
                    &layout.coverage,
                    &name,
                )?;
                log::debug!("uploading {name} ({}x{})", layout.width, layout.height);
                *slot = Some(GpuNode::new(
                    &ctx.device,
                    &name,
                    geometry,
                    MaterialUniform::new(label.color(), LABEL_SHININESS, LABEL_SPECULAR),
                    mask,
                    &self.material_layout,
                ));
            }
            if let Some(gpu) = slot.as_mut() {
                gpu.material.write_color(queue, label.color());
                gpu.write_instances(queue, label, world);
            }
        }

        if world.is_compositor_attached() {
            let compositor = world.compositor();
            self.post.write_glitch(queue, compositor.glitch().uniform());
            let projection = world.projection();
            self.post.write_bokeh(
                queue,
                &BokehUniform::new(
                    compositor.bokeh(),
                    projection.aspect(),
                    projection.near(),
                    projection.far(),
                ),
            );
        }
        Ok(())
    }

    /// Render one frame to the window surface.
    pub fn render(&mut self, ctx: &Context, world: &World) -> Result<(), wgpu::SurfaceError> {
        let Some(surface) = ctx.surface.as_ref() else {
            return Ok(());
        };
        let output = surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Err(err) = self.prepare(ctx, world) {
            log::error!("Unable to prepare frame: {err:#}");
        }
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.encode(ctx, world, &mut encoder, &view);
        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Record the scene and postprocessing passes into `encoder`, ending in
    /// `output`.
    pub fn encode(
        &self,
        ctx: &Context,
        world: &World,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
    ) {
        let chain = world.compositor().chain();
        if chain.is_direct() || !world.is_compositor_attached() {
            self.scene_pass(ctx, world, encoder, output);
            return;
        }

        self.scene_pass(ctx, world, encoder, &self.targets.scene.view);
        let post = &chain.passes()[1..];
        for (i, pass) in post.iter().enumerate() {
            let target = if i + 1 == post.len() {
                output
            } else {
                &self.targets.ping.view
            };
            let (label, pipeline, bind_group) = match pass {
                PassKind::Glitch => (
                    "Glitch Pass",
                    &self.post.glitch_pipeline,
                    &self.targets.glitch,
                ),
                PassKind::Bokeh => ("Bokeh Pass", &self.post.bokeh_pipeline, &self.targets.bokeh),
                PassKind::Render => continue,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            draw_fullscreen(&mut render_pass, pipeline, bind_group);
        }
    }

    fn scene_pass(
        &self,
        ctx: &Context,
        world: &World,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let scene = world.scene();
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        let camera = &ctx.camera.bind_group;
        let light = &ctx.light.bind_group;

        let labels: Vec<&GpuNode> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(i, _)| scene.contains(NodeId::Label(*i)))
            .filter_map(|(_, gpu)| gpu.as_ref())
            .collect();
        let shape = scene.contains(NodeId::Shape).then_some(&self.shape);
        let ground = self
            .ground
            .as_ref()
            .filter(|_| scene.contains(NodeId::Ground));

        render_pass.set_pipeline(&self.basic_pipeline);
        for node in ground.iter().chain(shape.iter()) {
            node.draw(&mut render_pass, camera, light);
        }

        if ground.is_some() {
            render_pass.set_pipeline(&self.shadow_pipeline);
            for node in shape.iter().chain(labels.iter()) {
                node.draw_shadows(&mut render_pass, camera, light);
            }
        }

        render_pass.set_pipeline(&self.label_pipeline);
        for node in &labels {
            node.draw(&mut render_pass, camera, light);
        }
    }

    /// Render one frame offscreen and read it back as RGBA.
    pub async fn capture(&mut self, ctx: &Context, world: &World) -> anyhow::Result<image::RgbaImage> {
        let (width, height) = ctx.size();
        let format = ctx.format();
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.prepare(ctx, world)?;
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        self.encode(ctx, world, &mut encoder, &view);

        // Rows of a texture copy must be 256-byte aligned.
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;
        let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Buffer"),
            size: (padded * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        ctx.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        rx.receive()
            .await
            .context("capture buffer was dropped before mapping")??;

        let swap = matches!(
            format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        );
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        {
            let data = buffer_slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        output_buffer.unmap();
        if swap {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        image::RgbaImage::from_raw(width, height, pixels).context("capture has the wrong size")
    }
}
