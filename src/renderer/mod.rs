//! Rendering module
//!
//! Reads sim state and draws it. Never mutates the sim.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderState, Viewport};
