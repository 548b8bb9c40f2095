//! The scene's objects: the animated shape, the ground, the quote labels and
//! the lighting rig.

pub mod ground;
pub mod label;
pub mod lighting;
pub mod shape;
