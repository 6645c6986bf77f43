//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.133, 0.133, 0.133, 1.0]; // #222
    pub const WALL: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
    pub const SPAWN_ZONE: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
    pub const SPAWN_GUIDE: [f32; 4] = [1.0, 1.0, 1.0, 0.35];
    pub const OUTLINE: [f32; 4] = [0.0, 0.0, 0.0, 0.35];
    /// Letterbox bars outside the playfield
    pub const CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    pub const HIGH_CONTRAST_WALL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const HIGH_CONTRAST_BACKGROUND: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    /// Darken a color for rims and the pending-drop preview
    pub fn shade(color: [f32; 4], factor: f32) -> [f32; 4] {
        [color[0] * factor, color[1] * factor, color[2] * factor, color[3]]
    }
}
