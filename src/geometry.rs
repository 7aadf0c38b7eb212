//! Quad geometry and vertex layouts for instanced splat billboards.

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
}

/// One unit quad, stretched per instance in the vertex shader.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [1.0, -1.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
    },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

impl QuadVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        }
    }
}

/// Per-instance attribute layouts, one tightly packed buffer each.
/// Slot order matches the draw call: center, scale, color, rotation.
pub fn instance_layouts() -> [wgpu::VertexBufferLayout<'static>; 4] {
    [
        wgpu::VertexBufferLayout {
            array_stride: (3 * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![1 => Float32x3],
        },
        wgpu::VertexBufferLayout {
            array_stride: (3 * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![2 => Float32x3],
        },
        wgpu::VertexBufferLayout {
            array_stride: (4 * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![3 => Float32x4],
        },
        wgpu::VertexBufferLayout {
            array_stride: (4 * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![4 => Float32x4],
        },
    ]
}
