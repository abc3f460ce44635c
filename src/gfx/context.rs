//! Graphics context
//!
//! The context owns the backend. Resource wrappers keep a weak
//! [`ContextRef`] back to it so that dropping a resource after the context is
//! gone (or after [`GraphicsContext::shutdown`]) skips the backend release
//! instead of touching a dead device.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use cgmath::Matrix4;

use crate::error::{GfxError, Result};
use crate::gfx::backend::{
    Backend, BackendKind, BindingSlot, ClearState, FrameStats, GpuHandle, HeadlessBackend,
};
use crate::gfx::resources::VertexArray;

struct ContextInner {
    backend: Rc<dyn Backend>,
    alive: Cell<bool>,
    in_frame: Cell<bool>,
    frame_index: Cell<u64>,
}

/// Shared handle to the active backend.
///
/// Cloning is cheap; all clones refer to the same backend.
#[derive(Clone)]
pub struct GraphicsContext {
    inner: Rc<ContextInner>,
}

impl GraphicsContext {
    pub fn new(backend: Rc<dyn Backend>) -> Self {
        log::info!("graphics context created ({} backend)", backend.kind());
        Self {
            inner: Rc::new(ContextInner {
                backend,
                alive: Cell::new(true),
                in_frame: Cell::new(false),
                frame_index: Cell::new(0),
            }),
        }
    }

    /// Context over a fresh in-memory backend.
    pub fn headless() -> Self {
        Self::new(Rc::new(HeadlessBackend::new()))
    }

    pub fn backend(&self) -> &dyn Backend {
        self.inner.backend.as_ref()
    }

    pub fn kind(&self) -> BackendKind {
        self.inner.backend.kind()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    /// Marks the context as torn down. Resources released afterwards no
    /// longer reach the backend.
    pub fn shutdown(&self) {
        if self.inner.alive.replace(false) {
            log::info!("graphics context shut down");
        }
    }

    pub fn downgrade(&self) -> ContextRef {
        ContextRef {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn in_frame(&self) -> bool {
        self.inner.in_frame.get()
    }

    /// Number of frames completed so far.
    pub fn frame_index(&self) -> u64 {
        self.inner.frame_index.get()
    }

    /// Fails with [`GfxError::ContextLost`] once the context is shut down.
    ///
    /// # Panics
    ///
    /// If a frame is already in progress.
    pub fn begin_frame(&self, clear: ClearState) -> Result<()> {
        assert!(!self.in_frame(), "begin_frame called twice without end_frame");
        if !self.is_alive() {
            return Err(GfxError::ContextLost);
        }
        self.backend().begin_frame(clear)?;
        self.inner.in_frame.set(true);
        Ok(())
    }

    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn end_frame(&self) -> Result<()> {
        assert!(self.in_frame(), "end_frame called without begin_frame");
        self.inner.in_frame.set(false);
        self.inner.frame_index.set(self.frame_index() + 1);
        self.backend().end_frame()
    }

    /// Draws every index of the given vertex array with the current program.
    ///
    /// # Panics
    ///
    /// If the vertex array is not the current binding or has no indices.
    pub fn draw_indexed(&self, vertex_array: &VertexArray) -> Result<()> {
        if !self.is_alive() {
            return Err(GfxError::ContextLost);
        }
        assert_eq!(
            self.current_binding(BindingSlot::VertexArray),
            vertex_array.handle(),
            "draw_indexed requires the vertex array to be bound"
        );
        let count = vertex_array.index_count();
        assert!(count > 0, "draw_indexed requires a non-empty index buffer");
        self.backend().draw_indexed(count)
    }

    pub fn current_binding(&self, slot: BindingSlot) -> GpuHandle {
        self.backend().current_binding(slot)
    }

    pub fn stats(&self) -> FrameStats {
        self.backend().stats()
    }

    pub fn clip_correction(&self) -> Matrix4<f32> {
        self.backend().clip_correction()
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.backend().resize(width, height);
    }

    pub fn ptr_eq(&self, other: &GraphicsContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("backend", &self.kind())
            .field("alive", &self.is_alive())
            .field("frame_index", &self.frame_index())
            .finish()
    }
}

/// Weak back-reference from a resource to the context that created it.
#[derive(Clone, Default)]
pub struct ContextRef {
    inner: Weak<ContextInner>,
}

impl ContextRef {
    /// A reference to no context, held by resources that never reached the
    /// backend.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// The context, if it still exists and has not been shut down.
    pub fn upgrade(&self) -> Option<GraphicsContext> {
        self.inner
            .upgrade()
            .filter(|inner| inner.alive.get())
            .map(|inner| GraphicsContext { inner })
    }

    /// # Panics
    ///
    /// If the context is gone; using a resource past its context is a
    /// programming error.
    pub(crate) fn live(&self, what: &str) -> GraphicsContext {
        self.upgrade()
            .unwrap_or_else(|| panic!("{} used after its graphics context was torn down", what))
    }

    pub fn is_same(&self, ctx: &GraphicsContext) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&ctx.inner))
    }
}

impl std::fmt::Debug for ContextRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContextRef(live: {})", self.upgrade().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_ref_dies_with_context() {
        let ctx = GraphicsContext::headless();
        let weak = ctx.downgrade();
        assert!(weak.upgrade().is_some());
        assert!(weak.is_same(&ctx));

        drop(ctx);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_shutdown_invalidates_refs() {
        let ctx = GraphicsContext::headless();
        let weak = ctx.downgrade();
        ctx.shutdown();
        assert!(!ctx.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_frame_counter_advances() {
        let ctx = GraphicsContext::headless();
        ctx.begin_frame(ClearState::default()).unwrap();
        assert!(ctx.in_frame());
        ctx.end_frame().unwrap();
        assert_eq!(ctx.frame_index(), 1);
    }

    #[test]
    #[should_panic(expected = "begin_frame called twice")]
    fn test_nested_begin_frame_panics() {
        let ctx = GraphicsContext::headless();
        ctx.begin_frame(ClearState::default()).unwrap();
        let _ = ctx.begin_frame(ClearState::default());
    }

    #[test]
    fn test_frame_on_shut_down_context_fails() {
        let ctx = GraphicsContext::headless();
        ctx.shutdown();
        let err = ctx.begin_frame(ClearState::default()).unwrap_err();
        assert!(matches!(err, GfxError::ContextLost));
        assert!(!ctx.in_frame());
        assert_eq!(ctx.frame_index(), 0);
    }

    #[test]
    fn test_detached_ref_is_dead() {
        assert!(ContextRef::detached().upgrade().is_none());
    }
}
