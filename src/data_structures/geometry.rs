//! CPU-side geometry for the primitives the scene is built from.
//!
//! Every generator produces counter-clockwise front faces, matching the
//! `FrontFace::Ccw` / back-face culling state of the mesh pipelines.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3};

/// A single vertex as stored in GPU vertex buffers.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// An axis-aligned box centered on the origin, one quad per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
        let mut geometry = Geometry::default();
        // (normal, u, v, half extent along normal, half extent along u, half extent along v)
        let faces = [
            (Vector3::unit_x(), -Vector3::unit_z(), Vector3::unit_y(), hw, hd, hh),
            (-Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y(), hw, hd, hh),
            (Vector3::unit_y(), Vector3::unit_x(), -Vector3::unit_z(), hh, hw, hd),
            (-Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z(), hh, hw, hd),
            (Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y(), hd, hw, hh),
            (-Vector3::unit_z(), -Vector3::unit_x(), Vector3::unit_y(), hd, hw, hh),
        ];
        for (normal, u, v, n_ext, u_ext, v_ext) in faces {
            geometry.push_face(normal * n_ext, normal, u * u_ext, v * v_ext);
        }
        geometry
    }

    /// A UV sphere. Segment counts below 3 (around) or 2 (top to bottom)
    /// are raised to those minimums.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let position = Vector3::new(
                    -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
                );
                let normal = if position.magnitude2() > 0.0 {
                    position.normalize()
                } else {
                    Vector3::unit_y()
                };
                vertices.push(Vertex {
                    position: position.into(),
                    normal: normal.into(),
                    tex_coords: [u, v],
                });
            }
        }

        let row = ws + 1;
        let mut indices = Vec::with_capacity((ws * (hs - 1) * 6) as usize);
        for iy in 0..hs {
            for ix in 0..ws {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // the pole rows collapse into triangle fans
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// A single quad in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let mut geometry = Geometry::default();
        geometry.push_face(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::unit_z(),
            Vector3::unit_x() * (width / 2.0),
            Vector3::unit_y() * (height / 2.0),
        );
        geometry
    }

    fn push_face(
        &mut self,
        center: Vector3<f32>,
        normal: Vector3<f32>,
        half_u: Vector3<f32>,
        half_v: Vector3<f32>,
    ) {
        let base = self.vertices.len() as u32;
        let corners = [
            (center - half_u + half_v, [0.0, 0.0]),
            (center + half_u + half_v, [1.0, 0.0]),
            (center + half_u - half_v, [1.0, 1.0]),
            (center - half_u - half_v, [0.0, 1.0]),
        ];
        for (position, tex_coords) in corners {
            self.vertices.push(Vertex {
                position: position.into(),
                normal: normal.into(),
                tex_coords,
            });
        }
        // bottom-left, bottom-right, top-right / bottom-left, top-right, top-left
        self.indices
            .extend_from_slice(&[base + 3, base + 2, base + 1, base + 3, base + 1, base]);
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for empty geometry.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(mut min, mut max), v| {
            for axis in 0..3 {
                min[axis] = min[axis].min(v.position[axis]);
                max[axis] = max[axis].max(v.position[axis]);
            }
            (min, max)
        }))
    }

    pub fn translate(&mut self, offset: [f32; 3]) {
        for v in &mut self.vertices {
            for axis in 0..3 {
                v.position[axis] += offset[axis];
            }
        }
    }

    /// Move the geometry so that its bounding box is centered on the origin.
    /// Returns the applied offset.
    pub fn center(&mut self) -> [f32; 3] {
        let Some((min, max)) = self.bounds() else {
            return [0.0; 3];
        };
        let offset = [
            -(min[0] + max[0]) / 2.0,
            -(min[1] + max[1]) / 2.0,
            -(min[2] + max[2]) / 2.0,
        ];
        self.translate(offset);
        offset
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
