use crate::{
    data_structures::{geometry::Vertex, texture::Texture, transform::InstanceRaw},
    pipelines::basic::{PipelineState, mesh_shader, mk_render_pipeline},
};

/// Planar shadows.
///
/// Casters are drawn a second time with their model matrix pre-multiplied by
/// a light's flattening matrix, which squashes them onto the ground. The
/// blend takes the per-channel minimum of the ambient-only ground color and
/// what is already there, so overlapping triangles and overlapping casters
/// never darken a spot twice.
pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let min = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Min,
    };
    mk_render_pipeline(
        device,
        "Shadow Pipeline",
        layout,
        color_format,
        PipelineState {
            blend: Some(wgpu::BlendState {
                color: min,
                alpha: wgpu::BlendComponent::REPLACE,
            }),
            // flattening can flip the winding
            cull_mode: None,
            depth_write: false,
        },
        Some(Texture::DEPTH_FORMAT),
        &[Vertex::desc(), InstanceRaw::desc()],
        mesh_shader(),
        "fs_shadow",
    )
}
