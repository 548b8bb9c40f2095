//! Engine data structures: colors, geometry, transforms, GPU meshes, textures
//! and the scene graph.
//!
//! - `color` holds RGB colors and the HSL conversion used for hue cycling
//! - `geometry` generates CPU-side boxes, spheres and planes
//! - `transform` holds per-node transforms and their GPU instance layout
//! - `model` uploads geometry/materials to the GPU and draws them
//! - `texture` wraps GPU textures (depth, render targets, text coverage)
//! - `scene_graph` defines scene nodes, fog and the scene container

pub mod color;
pub mod geometry;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
