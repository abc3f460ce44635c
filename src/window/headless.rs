use std::rc::Rc;

use crate::gfx::backend::HeadlessBackend;
use crate::gfx::context::GraphicsContext;
use crate::input::InputEvent;

use super::WindowImpl;

/// A window with no platform surface, drawing into a [`HeadlessBackend`].
/// Events only arrive through [`super::Window::inject_event`].
pub struct HeadlessWindow {
    backend: Rc<HeadlessBackend>,
    ctx: GraphicsContext,
    open: bool,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_backend(Rc::new(HeadlessBackend::with_size(width.max(1), height.max(1))))
    }

    /// Wraps an existing backend, so callers can keep inspecting it.
    pub fn with_backend(backend: Rc<HeadlessBackend>) -> Self {
        let ctx = GraphicsContext::new(backend.clone());
        Self {
            backend,
            ctx,
            open: true,
        }
    }

    pub fn backend(&self) -> &Rc<HeadlessBackend> {
        &self.backend
    }
}

impl WindowImpl for HeadlessWindow {
    fn context(&self) -> &GraphicsContext {
        &self.ctx
    }

    fn size(&self) -> (u32, u32) {
        self.backend.size()
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn poll_events(&mut self, _events: &mut Vec<InputEvent>) {}
}
