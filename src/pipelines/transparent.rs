use crate::{
    data_structures::{geometry::Vertex, texture::Texture, transform::InstanceRaw},
    pipelines::basic::{PipelineState, mesh_shader, mk_render_pipeline},
};

/**
 * Pipeline for the text labels.
 *
 * Labels are flat quads whose alpha comes from the rasterized glyph coverage,
 * so they are blended, drawn from both sides and drawn after the opaque
 * meshes. Depth writes stay on; the fragment shader discards uncovered texels
 * so the empty parts of a quad never occlude anything.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(
        device,
        "Label Pipeline",
        layout,
        color_format,
        PipelineState {
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            cull_mode: None,
            depth_write: true,
        },
        Some(Texture::DEPTH_FORMAT),
        &[Vertex::desc(), InstanceRaw::desc()],
        mesh_shader(),
        "fs_label",
    )
}
