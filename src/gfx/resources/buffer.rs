//! Vertex and index buffers
//!
//! Buffer contents are uploaded at creation. Only buffers created with
//! [`BufferUsage::Dynamic`] may be updated afterwards; updating a static
//! buffer is a programming error.

use bytemuck::Pod;

use crate::error::Result;
use crate::gfx::backend::{BufferTarget, BufferUsage, GpuHandle};
use crate::gfx::context::{ContextRef, GraphicsContext};

use super::layout::VertexBufferLayout;

/// Handle, usage and size common to both buffer kinds.
struct BufferObject {
    target: BufferTarget,
    usage: BufferUsage,
    handle: GpuHandle,
    ctx: ContextRef,
    size: u64,
}

impl BufferObject {
    fn create(
        ctx: &GraphicsContext,
        target: BufferTarget,
        usage: BufferUsage,
        size: u64,
        data: Option<&[u8]>,
    ) -> Result<Self> {
        let handle = ctx.backend().create_buffer(target, usage, size, data)?;
        Ok(Self {
            target,
            usage,
            handle,
            ctx: ctx.downgrade(),
            size,
        })
    }

    fn bind(&self) {
        self.ctx
            .live("buffer")
            .backend()
            .bind_buffer(self.target, self.handle);
    }

    fn unbind(&self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().bind_buffer(self.target, GpuHandle::NONE);
        }
    }

    fn update(&self, offset: u64, data: &[u8]) {
        assert_eq!(
            self.usage,
            BufferUsage::Dynamic,
            "only dynamic buffers can be updated"
        );
        assert!(
            offset
                .checked_add(data.len() as u64)
                .is_some_and(|end| end <= self.size),
            "update of {} bytes at offset {} overflows a {} byte buffer",
            data.len(),
            offset,
            self.size
        );
        self.ctx
            .live("buffer")
            .backend()
            .update_buffer(self.handle, offset, data);
    }

    fn read_back(&self) -> Option<Vec<u8>> {
        self.ctx
            .upgrade()
            .and_then(|ctx| ctx.backend().read_buffer(self.handle))
    }
}

impl Drop for BufferObject {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().destroy_buffer(self.handle);
        }
        self.handle = GpuHandle::NONE;
    }
}

/// Interleaved vertex data described by a [`VertexBufferLayout`].
pub struct VertexBuffer {
    buffer: BufferObject,
    layout: VertexBufferLayout,
}

impl VertexBuffer {
    /// # Panics
    ///
    /// If the layout is empty.
    pub fn new(
        ctx: &GraphicsContext,
        layout: VertexBufferLayout,
        usage: BufferUsage,
        data: &[u8],
    ) -> Result<Self> {
        assert!(!layout.is_empty(), "vertex buffer layout has no attributes");
        let buffer = BufferObject::create(
            ctx,
            BufferTarget::Vertex,
            usage,
            data.len() as u64,
            Some(data),
        )?;
        Ok(Self { buffer, layout })
    }

    pub fn from_vertices<T: Pod>(
        ctx: &GraphicsContext,
        layout: VertexBufferLayout,
        usage: BufferUsage,
        vertices: &[T],
    ) -> Result<Self> {
        Self::new(ctx, layout, usage, bytemuck::cast_slice(vertices))
    }

    /// Zero-initialised dynamic buffer of `size` bytes.
    pub fn with_size(ctx: &GraphicsContext, layout: VertexBufferLayout, size: u64) -> Result<Self> {
        assert!(!layout.is_empty(), "vertex buffer layout has no attributes");
        let buffer = BufferObject::create(ctx, BufferTarget::Vertex, BufferUsage::Dynamic, size, None)?;
        Ok(Self { buffer, layout })
    }

    pub fn handle(&self) -> GpuHandle {
        self.buffer.handle
    }

    pub fn layout(&self) -> &VertexBufferLayout {
        &self.layout
    }

    pub fn usage(&self) -> BufferUsage {
        self.buffer.usage
    }

    pub fn size(&self) -> u64 {
        self.buffer.size
    }

    pub fn vertex_count(&self) -> u64 {
        match self.layout.stride() {
            0 => 0,
            stride => self.buffer.size / stride as u64,
        }
    }

    pub fn bind(&self) {
        self.buffer.bind();
    }

    pub fn unbind(&self) {
        self.buffer.unbind();
    }

    /// # Panics
    ///
    /// If the buffer is static or the write runs past its end.
    pub fn update(&self, offset: u64, data: &[u8]) {
        self.buffer.update(offset, data);
    }

    pub fn read_back(&self) -> Option<Vec<u8>> {
        self.buffer.read_back()
    }
}

/// 32-bit triangle-list indices.
pub struct IndexBuffer {
    buffer: BufferObject,
    count: u32,
}

impl IndexBuffer {
    pub fn new(ctx: &GraphicsContext, usage: BufferUsage, indices: &[u32]) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer = BufferObject::create(
            ctx,
            BufferTarget::Index,
            usage,
            bytes.len() as u64,
            Some(bytes),
        )?;
        Ok(Self {
            buffer,
            count: indices.len() as u32,
        })
    }

    pub fn handle(&self) -> GpuHandle {
        self.buffer.handle
    }

    pub fn usage(&self) -> BufferUsage {
        self.buffer.usage
    }

    /// Number of indices.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn bind(&self) {
        self.buffer.bind();
    }

    pub fn unbind(&self) {
        self.buffer.unbind();
    }

    /// Overwrites indices starting at index `first`.
    ///
    /// # Panics
    ///
    /// If the buffer is static or the write runs past its end.
    pub fn update(&self, first: u32, indices: &[u32]) {
        self.buffer
            .update(first as u64 * 4, bytemuck::cast_slice(indices));
    }

    pub fn read_back(&self) -> Option<Vec<u32>> {
        self.buffer
            .read_back()
            .map(|bytes| {
                bytes
                    .chunks_exact(4)
                    .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::gfx::backend::{BindingSlot, HeadlessBackend};
    use crate::gfx::resources::layout::{BufferElement, ElementType};

    fn setup() -> (GraphicsContext, Rc<HeadlessBackend>) {
        let backend = Rc::new(HeadlessBackend::new());
        (GraphicsContext::new(backend.clone()), backend)
    }

    fn position_layout() -> VertexBufferLayout {
        VertexBufferLayout::new(vec![BufferElement::new("position", ElementType::Float3, false)])
    }

    #[test]
    fn test_vertex_buffer_round_trip() {
        let (ctx, _) = setup();
        let vertices: [f32; 9] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let buffer =
            VertexBuffer::from_vertices(&ctx, position_layout(), BufferUsage::Static, &vertices)
                .unwrap();

        assert_eq!(buffer.size(), 36);
        assert_eq!(buffer.vertex_count(), 3);
        let bytes = buffer.read_back().unwrap();
        assert_eq!(bytemuck::cast_slice::<u8, f32>(&bytes), &vertices);
    }

    #[test]
    fn test_dynamic_update_overwrites_range() {
        let (ctx, _) = setup();
        let buffer = IndexBuffer::new(&ctx, BufferUsage::Dynamic, &[0, 1, 2, 3]).unwrap();
        buffer.update(2, &[7, 8]);
        assert_eq!(buffer.read_back().unwrap(), vec![0, 1, 7, 8]);
    }

    #[test]
    #[should_panic(expected = "only dynamic buffers")]
    fn test_updating_static_buffer_panics() {
        let (ctx, _) = setup();
        let buffer = IndexBuffer::new(&ctx, BufferUsage::Static, &[0, 1, 2]).unwrap();
        buffer.update(0, &[2, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_update_past_end_panics() {
        let (ctx, _) = setup();
        let buffer = VertexBuffer::with_size(&ctx, position_layout(), 12).unwrap();
        buffer.update(4, &[0u8; 12]);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_update_at_huge_offset_panics() {
        let (ctx, _) = setup();
        let buffer = VertexBuffer::with_size(&ctx, position_layout(), 12).unwrap();
        buffer.update(u64::MAX - 3, &[0u8; 8]);
    }

    #[test]
    fn test_bind_sets_target_slot() {
        let (ctx, _) = setup();
        let buffer = IndexBuffer::new(&ctx, BufferUsage::Static, &[0, 1, 2]).unwrap();
        buffer.bind();
        assert_eq!(
            ctx.current_binding(BindingSlot::Buffer(BufferTarget::Index)),
            buffer.handle()
        );
        buffer.unbind();
        assert!(ctx
            .current_binding(BindingSlot::Buffer(BufferTarget::Index))
            .is_none());
    }

    #[test]
    fn test_drop_after_shutdown_skips_backend() {
        let (ctx, backend) = setup();
        let buffer = IndexBuffer::new(&ctx, BufferUsage::Static, &[0, 1, 2]).unwrap();
        let handle = buffer.handle();
        ctx.shutdown();
        drop(buffer);
        assert!(backend.buffer_contents(handle).is_some());
    }
}
