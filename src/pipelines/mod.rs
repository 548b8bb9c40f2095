//! Render pipelines.
//!
//! - `basic`: opaque lit meshes and the shared pipeline builder
//! - `transparent`: alpha-masked text labels
//! - `shadow`: planar shadows flattened onto the ground
//! - `light`: the light/fog uniform shared by the scene pipelines
//! - `post`: the fullscreen glitch and bokeh passes

pub mod basic;
pub mod light;
pub mod post;
pub mod shadow;
pub mod transparent;
