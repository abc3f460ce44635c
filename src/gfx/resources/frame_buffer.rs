use std::rc::Rc;

use crate::error::{GfxError, Result};
use crate::gfx::backend::GpuHandle;
use crate::gfx::context::{ContextRef, GraphicsContext};

use super::texture::Texture;
use super::texture_data::TextureFormat;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBufferConfig {
    pub width: u32,
    pub height: u32,
    pub color: bool,
    pub depth: bool,
}

impl FrameBufferConfig {
    pub fn color_depth(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: true,
            depth: true,
        }
    }
}

/// An offscreen render target with owned color and depth attachments.
///
/// While bound, draws go to the attachments instead of the window surface.
pub struct FrameBuffer {
    handle: GpuHandle,
    ctx: ContextRef,
    config: FrameBufferConfig,
    color: Option<Rc<Texture>>,
    depth: Option<Rc<Texture>>,
}

impl FrameBuffer {
    pub fn new(ctx: &GraphicsContext, config: FrameBufferConfig) -> Result<Self> {
        if !config.color && !config.depth {
            return Err(GfxError::creation("framebuffer", "no attachments requested"));
        }
        if config.width == 0 || config.height == 0 {
            return Err(GfxError::creation(
                "framebuffer",
                format!("invalid size {}x{}", config.width, config.height),
            ));
        }

        let color = if config.color {
            Some(Rc::new(Texture::empty(
                ctx,
                "framebuffer color",
                config.width,
                config.height,
                TextureFormat::Rgba,
                true,
            )?))
        } else {
            None
        };
        let depth = if config.depth {
            Some(Rc::new(Texture::empty(
                ctx,
                "framebuffer depth",
                config.width,
                config.height,
                TextureFormat::Depth,
                true,
            )?))
        } else {
            None
        };

        let handle = ctx.backend().create_framebuffer(
            color.as_ref().map(|t| t.handle()),
            depth.as_ref().map(|t| t.handle()),
        )?;
        log::debug!(
            "framebuffer {} created ({}x{})",
            handle,
            config.width,
            config.height
        );

        Ok(Self {
            handle,
            ctx: ctx.downgrade(),
            config,
            color,
            depth,
        })
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    pub fn config(&self) -> FrameBufferConfig {
        self.config
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn color_attachment(&self) -> Option<&Rc<Texture>> {
        self.color.as_ref()
    }

    pub fn depth_attachment(&self) -> Option<&Rc<Texture>> {
        self.depth.as_ref()
    }

    pub fn bind(&self) {
        self.ctx
            .live("framebuffer")
            .backend()
            .bind_framebuffer(self.handle);
    }

    /// Restores the window surface as the render target.
    pub fn unbind(&self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().bind_framebuffer(GpuHandle::NONE);
        }
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().destroy_framebuffer(self.handle);
        }
        self.handle = GpuHandle::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::BindingSlot;

    #[test]
    fn test_framebuffer_owns_attachments() {
        let ctx = GraphicsContext::headless();
        let fb = FrameBuffer::new(&ctx, FrameBufferConfig::color_depth(64, 32)).unwrap();

        let color = fb.color_attachment().unwrap();
        assert_eq!((color.width(), color.height()), (64, 32));
        assert_eq!(fb.depth_attachment().unwrap().format(), TextureFormat::Depth);
    }

    #[test]
    fn test_bind_redirects_output() {
        let ctx = GraphicsContext::headless();
        let fb = FrameBuffer::new(&ctx, FrameBufferConfig::color_depth(8, 8)).unwrap();
        fb.bind();
        assert_eq!(ctx.current_binding(BindingSlot::Framebuffer), fb.handle());
        fb.unbind();
        assert!(ctx.current_binding(BindingSlot::Framebuffer).is_none());
    }

    #[test]
    fn test_no_attachments_is_an_error() {
        let ctx = GraphicsContext::headless();
        let config = FrameBufferConfig {
            width: 8,
            height: 8,
            color: false,
            depth: false,
        };
        assert!(FrameBuffer::new(&ctx, config).is_err());
    }
}
