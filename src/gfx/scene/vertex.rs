//! # Vertex Data Structures
//!
//! GPU-compatible vertex formats used by meshes.

use crate::gfx::resources::{BufferElement, ElementType, VertexBufferLayout};

/// A 3D vertex with position, normal and texture coordinates.
///
/// `#[repr(C)]` keeps the field order, which is what [`Vertex3D::layout`]
/// describes to the shader's input stage.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Texture coordinates [u, v]
    pub uv: [f32; 2],
}

impl Vertex3D {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Buffer layout matching the struct:
    /// - location 0: position (Float3)
    /// - location 1: normal (Float3)
    /// - location 2: texture coordinates (Float2)
    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout::new(vec![
            BufferElement::new("position", ElementType::Float3, false),
            BufferElement::new("normal", ElementType::Float3, false),
            BufferElement::new("texcoord", ElementType::Float2, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_struct() {
        let layout = Vertex3D::layout();
        assert_eq!(layout.stride() as usize, std::mem::size_of::<Vertex3D>());
        assert_eq!(layout.elements()[2].offset(), 24);
    }
}
