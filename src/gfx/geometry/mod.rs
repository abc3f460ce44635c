//! # Procedural Geometry Generation
//!
//! Functions that build common primitive shapes on the CPU, so basic scenes
//! need no model files. Shapes use a Z-up convention and counter-clockwise
//! winding seen from the side the normals point to.
//!
//! ```no_run
//! use loco::gfx::context::GraphicsContext;
//! use loco::gfx::geometry::{create_box, create_plane, create_sphere};
//!
//! let ctx = GraphicsContext::headless();
//! let cube = create_box(2.0, 2.0, 2.0);
//! let vertex_array = cube.build_vertex_array(&ctx).unwrap();
//! let sphere = create_sphere(1.0, 32, 16);
//! let floor = create_plane(10.0, 10.0, 4, 4);
//! ```

pub mod primitives;

use std::rc::Rc;

use cgmath::{InnerSpace, Vector3};

use crate::error::Result;
use crate::gfx::backend::BufferUsage;
use crate::gfx::context::GraphicsContext;
use crate::gfx::resources::{IndexBuffer, VertexArray, VertexBuffer};
use crate::gfx::scene::vertex::Vertex3D;

pub use primitives::*;

/// Generated geometry ready for GPU upload.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub vertices: Vec<Vertex3D>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of the positions, `None` when empty.
    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first = self.vertices.first()?;
        let start = (Vector3::from(first.position), Vector3::from(first.position));
        Some(self.vertices.iter().fold(start, |(min, max), v| {
            let p = Vector3::from(v.position);
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// Uploads the data into static buffers wrapped in a vertex array.
    pub fn build_vertex_array(&self, ctx: &GraphicsContext) -> Result<VertexArray> {
        let vertex_buffer = VertexBuffer::from_vertices(
            ctx,
            Vertex3D::layout(),
            BufferUsage::Static,
            &self.vertices,
        )?;
        let index_buffer = IndexBuffer::new(ctx, BufferUsage::Static, &self.indices)?;
        VertexArray::with_buffers(ctx, Rc::new(vertex_buffer), Rc::new(index_buffer))
    }

    /// Smooth per-vertex normals averaged from the faces using each vertex.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= accum.len() || b >= accum.len() || c >= accum.len() {
                continue;
            }
            let p0 = Vector3::from(self.vertices[a].position);
            let p1 = Vector3::from(self.vertices[b].position);
            let p2 = Vector3::from(self.vertices[c].position);
            let face = (p1 - p0).cross(p2 - p0);
            for i in [a, b, c] {
                accum[i] += face;
            }
        }
        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            vertex.normal = if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 1.0]
            };
        }
    }
}
