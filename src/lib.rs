//! quote-ngin
//!
//! A floating-quote scene on wgpu for native and WASM: a rotating or
//! pulsing shape, quote lines whose color cycles through hue, a ground plane
//! that catches planar shadows, an ambient plus point-light rig, fog and an
//! optional glitch and bokeh postprocessing chain.
//!
//! High-level modules
//! - `config`: scene configuration, presets and named constants
//! - `world`: the scene orchestrator, its readiness barrier and frame hooks
//! - `objects`: shape, labels, ground and lighting rig
//! - `compositor`: the pass chain and per-frame glitch/bokeh state
//! - `camera`: camera, projection and the camera uniform
//! - `data_structures`: colors, geometry, transforms, meshes, textures and the scene graph
//! - `resources`: asset loading, fonts and text layout
//! - `context`: GPU device, queue and surface
//! - `pipelines`: the render pipelines and shaders
//! - `render`: drawing and compositing a world, frame capture
//! - `runtime`: the winit event loop
//!

pub mod camera;
pub mod compositor;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod objects;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod runtime;
pub mod world;

// Re-exports commonly used types for convenience in downstream code.
pub use config::WorldConfig;
pub use error::{EngineError, ResourceLoadError};
pub use runtime::run;
pub use world::{TickOutcome, World, WorldState};
