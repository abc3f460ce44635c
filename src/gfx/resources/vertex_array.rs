//! Vertex arrays: vertex buffers bound to sequential attribute slots plus an
//! optional index buffer.

use std::rc::Rc;

use crate::error::Result;
use crate::gfx::backend::GpuHandle;
use crate::gfx::context::{ContextRef, GraphicsContext};

use super::buffer::{IndexBuffer, VertexBuffer};

/// Vertex buffers plus an index buffer, bound together for drawing.
///
/// Each attached vertex buffer occupies consecutive attribute slots starting
/// after the previous buffer's, so the first buffer's first element is
/// location 0. The array shares ownership of its buffers.
pub struct VertexArray {
    handle: GpuHandle,
    ctx: ContextRef,
    vertex_buffers: Vec<Rc<VertexBuffer>>,
    index_buffer: Option<Rc<IndexBuffer>>,
    next_slot: u32,
}

impl VertexArray {
    pub fn new(ctx: &GraphicsContext) -> Result<Self> {
        let handle = ctx.backend().create_vertex_array()?;
        Ok(Self {
            handle,
            ctx: ctx.downgrade(),
            vertex_buffers: Vec::new(),
            index_buffer: None,
            next_slot: 0,
        })
    }

    /// Convenience for the common single-buffer case.
    pub fn with_buffers(
        ctx: &GraphicsContext,
        vertex_buffer: Rc<VertexBuffer>,
        index_buffer: Rc<IndexBuffer>,
    ) -> Result<Self> {
        let mut vertex_array = Self::new(ctx)?;
        vertex_array.add_vertex_buffer(vertex_buffer);
        vertex_array.set_index_buffer(index_buffer);
        Ok(vertex_array)
    }

    /// Attaches a vertex buffer and returns the first attribute slot it
    /// occupies.
    pub fn add_vertex_buffer(&mut self, buffer: Rc<VertexBuffer>) -> u32 {
        let base_slot = self.next_slot;
        self.ctx.live("vertex array").backend().attach_vertex_buffer(
            self.handle,
            buffer.handle(),
            base_slot,
            buffer.layout(),
        );
        self.next_slot += buffer.layout().len() as u32;
        self.vertex_buffers.push(buffer);
        base_slot
    }

    /// Replaces the index buffer.
    pub fn set_index_buffer(&mut self, buffer: Rc<IndexBuffer>) {
        self.ctx.live("vertex array").backend().attach_index_buffer(
            self.handle,
            buffer.handle(),
            buffer.count(),
        );
        self.index_buffer = Some(buffer);
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    pub fn vertex_buffers(&self) -> &[Rc<VertexBuffer>] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<&Rc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.as_ref().map_or(0, |ib| ib.count())
    }

    /// Number of attribute slots in use.
    pub fn attribute_count(&self) -> u32 {
        self.next_slot
    }

    /// Whether a draw from this array can succeed.
    pub fn is_drawable(&self) -> bool {
        self.index_count() > 0 && !self.vertex_buffers.is_empty()
    }

    pub fn bind(&self) {
        self.ctx
            .live("vertex array")
            .backend()
            .bind_vertex_array(self.handle);
    }

    pub fn unbind(&self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().bind_vertex_array(GpuHandle::NONE);
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().destroy_vertex_array(self.handle);
        }
        self.handle = GpuHandle::NONE;
    }
}

impl std::fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexArray")
            .field("handle", &self.handle)
            .field("vertex_buffers", &self.vertex_buffers.len())
            .field("index_count", &self.index_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{BindingSlot, BufferUsage};
    use crate::gfx::resources::layout::{BufferElement, ElementType, VertexBufferLayout};

    #[test]
    fn test_slots_accumulate_across_buffers() {
        let ctx = GraphicsContext::headless();
        let positions = VertexBufferLayout::new(vec![
            BufferElement::new("position", ElementType::Float3, false),
            BufferElement::new("normal", ElementType::Float3, false),
        ]);
        let uvs = VertexBufferLayout::new(vec![BufferElement::new("uv", ElementType::Float2, false)]);

        let mut vertex_array = VertexArray::new(&ctx).unwrap();
        let first = vertex_array.add_vertex_buffer(Rc::new(
            VertexBuffer::new(&ctx, positions, BufferUsage::Static, &[0u8; 24]).unwrap(),
        ));
        let second = vertex_array.add_vertex_buffer(Rc::new(
            VertexBuffer::new(&ctx, uvs, BufferUsage::Static, &[0u8; 8]).unwrap(),
        ));

        assert_eq!(first, 0);
        assert_eq!(second, 2);
        assert_eq!(vertex_array.attribute_count(), 3);
    }

    #[test]
    fn test_index_count_and_binding() {
        let ctx = GraphicsContext::headless();
        let layout = VertexBufferLayout::new(vec![BufferElement::new(
            "position",
            ElementType::Float2,
            false,
        )]);
        let vb = Rc::new(VertexBuffer::new(&ctx, layout, BufferUsage::Static, &[0u8; 24]).unwrap());
        let ib = Rc::new(IndexBuffer::new(&ctx, BufferUsage::Static, &[0, 1, 2]).unwrap());

        let vertex_array = VertexArray::with_buffers(&ctx, vb, ib).unwrap();
        assert_eq!(vertex_array.index_count(), 3);
        assert!(vertex_array.is_drawable());

        vertex_array.bind();
        assert_eq!(ctx.current_binding(BindingSlot::VertexArray), vertex_array.handle());
        vertex_array.unbind();
        assert!(ctx.current_binding(BindingSlot::VertexArray).is_none());
    }

    #[test]
    fn test_empty_array_is_not_drawable() {
        let ctx = GraphicsContext::headless();
        let vertex_array = VertexArray::new(&ctx).unwrap();
        assert!(!vertex_array.is_drawable());
        assert_eq!(vertex_array.index_count(), 0);
    }
}
