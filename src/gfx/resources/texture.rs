//! 2D textures and cube maps
//!
//! Textures are immutable once uploaded; only their sampler state changes.
//! Sampler setters take effect immediately. A texture that could not be
//! loaded is still a value: it is *invalid*, holds no backend object and is
//! skipped by materials instead of aborting the frame.

use std::cell::Cell;
use std::path::Path;

use crate::error::{GfxError, Result};
use crate::gfx::backend::{GpuHandle, TextureDescriptor, TextureKind};
use crate::gfx::context::{ContextRef, GraphicsContext};

use super::texture_data::{TextureData, TextureFormat};

/// Texture coordinate addressing outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    Repeat,
    RepeatMirror,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

/// Filtering and addressing used when sampling a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    pub wrap_u: TextureWrap,
    pub wrap_v: TextureWrap,
    pub wrap_w: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    /// Used with [`TextureWrap::ClampToBorder`].
    pub border_color: [f32; 4],
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            wrap_u: TextureWrap::Repeat,
            wrap_v: TextureWrap::Repeat,
            wrap_w: TextureWrap::Repeat,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            border_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SamplerState {
    /// Clamp on every axis, as cube maps and render targets want.
    pub fn clamped() -> Self {
        Self {
            wrap_u: TextureWrap::ClampToEdge,
            wrap_v: TextureWrap::ClampToEdge,
            wrap_w: TextureWrap::ClampToEdge,
            ..Self::default()
        }
    }

    pub fn nearest() -> Self {
        Self {
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            ..Self::default()
        }
    }
}

/// State shared by 2D textures and cube maps.
struct TextureObject {
    name: String,
    kind: TextureKind,
    handle: GpuHandle,
    ctx: ContextRef,
    width: u32,
    height: u32,
    format: TextureFormat,
    sampler: Cell<SamplerState>,
}

impl TextureObject {
    fn create(
        ctx: &GraphicsContext,
        name: &str,
        desc: TextureDescriptor,
        layers: &[&[u8]],
        sampler: SamplerState,
    ) -> Result<Self> {
        let handle = ctx.backend().create_texture(&desc, layers, &sampler)?;
        log::debug!(
            "texture '{}' created ({}x{} {:?}, {})",
            name,
            desc.width,
            desc.height,
            desc.kind,
            handle
        );
        Ok(Self {
            name: name.to_string(),
            kind: desc.kind,
            handle,
            ctx: ctx.downgrade(),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            sampler: Cell::new(sampler),
        })
    }

    fn invalid(name: &str, kind: TextureKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            handle: GpuHandle::NONE,
            ctx: ContextRef::detached(),
            width: 0,
            height: 0,
            format: TextureFormat::Rgba,
            sampler: Cell::new(SamplerState::default()),
        }
    }

    fn is_valid(&self) -> bool {
        !self.handle.is_none()
    }

    fn bind(&self, unit: u32) {
        assert!(self.is_valid(), "cannot bind invalid texture '{}'", self.name);
        self.ctx
            .live("texture")
            .backend()
            .bind_texture(unit, self.kind, self.handle);
    }

    fn unbind(&self, unit: u32) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().bind_texture(unit, self.kind, GpuHandle::NONE);
        }
    }

    fn update_sampler(&self, edit: impl FnOnce(&mut SamplerState)) {
        let mut sampler = self.sampler.get();
        edit(&mut sampler);
        self.sampler.set(sampler);
        if let (true, Some(ctx)) = (self.is_valid(), self.ctx.upgrade()) {
            ctx.backend().set_sampler(self.handle, &sampler);
        }
    }
}

impl Drop for TextureObject {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        match self.ctx.upgrade() {
            Some(ctx) => ctx.backend().destroy_texture(self.handle),
            None => log::trace!("texture '{}' outlived its context", self.name),
        }
        self.handle = GpuHandle::NONE;
    }
}

macro_rules! sampler_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn name(&self) -> &str {
                &self.object.name
            }

            pub fn handle(&self) -> GpuHandle {
                self.object.handle
            }

            pub fn is_valid(&self) -> bool {
                self.object.is_valid()
            }

            pub fn width(&self) -> u32 {
                self.object.width
            }

            pub fn height(&self) -> u32 {
                self.object.height
            }

            pub fn format(&self) -> TextureFormat {
                self.object.format
            }

            pub fn sampler(&self) -> SamplerState {
                self.object.sampler.get()
            }

            /// # Panics
            ///
            /// If the texture is invalid or its context is gone.
            pub fn bind(&self, unit: u32) {
                self.object.bind(unit);
            }

            pub fn unbind(&self, unit: u32) {
                self.object.unbind(unit);
            }

            pub fn set_wrap_u(&self, wrap: TextureWrap) {
                self.object.update_sampler(|s| s.wrap_u = wrap);
            }

            pub fn set_wrap_v(&self, wrap: TextureWrap) {
                self.object.update_sampler(|s| s.wrap_v = wrap);
            }

            pub fn set_wrap(&self, wrap: TextureWrap) {
                self.object.update_sampler(|s| {
                    s.wrap_u = wrap;
                    s.wrap_v = wrap;
                    s.wrap_w = wrap;
                });
            }

            pub fn set_filter(&self, min: TextureFilter, mag: TextureFilter) {
                self.object.update_sampler(|s| {
                    s.min_filter = min;
                    s.mag_filter = mag;
                });
            }

            pub fn set_border_color(&self, color: [f32; 4]) {
                self.object.update_sampler(|s| s.border_color = color);
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("name", &self.object.name)
                    .field("handle", &self.object.handle)
                    .field("size", &(self.object.width, self.object.height))
                    .field("format", &self.object.format)
                    .finish()
            }
        }
    };
}

/// A sampled 2D texture.
pub struct Texture {
    object: TextureObject,
}

sampler_accessors!(Texture);

impl Texture {
    /// Uploads decoded data.
    pub fn from_data(
        ctx: &GraphicsContext,
        name: &str,
        data: &TextureData,
        sampler: SamplerState,
    ) -> Result<Self> {
        if !data.is_valid() {
            return Err(GfxError::creation("texture", format!("'{}' has no pixel data", name)));
        }
        let desc = TextureDescriptor {
            kind: TextureKind::Texture2D,
            width: data.width,
            height: data.height,
            format: data.format,
            render_target: false,
        };
        let object = TextureObject::create(ctx, name, desc, &[&data.data], sampler)?;
        Ok(Self { object })
    }

    /// Decodes and uploads an image file. Failures produce an invalid
    /// texture and a warning.
    pub fn load(ctx: &GraphicsContext, path: impl AsRef<Path>, sampler: SamplerState) -> Self {
        let path = path.as_ref();
        let name = path.display().to_string();
        let data = TextureData::load_or_empty(path);
        if !data.is_valid() {
            return Self::invalid(&name);
        }
        Self::from_data(ctx, &name, &data, sampler).unwrap_or_else(|err| {
            log::warn!("{}", err);
            Self::invalid(&name)
        })
    }

    /// An uninitialised texture, typically a framebuffer attachment.
    pub fn empty(
        ctx: &GraphicsContext,
        name: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        render_target: bool,
    ) -> Result<Self> {
        let desc = TextureDescriptor {
            kind: TextureKind::Texture2D,
            width,
            height,
            format,
            render_target,
        };
        let object = TextureObject::create(ctx, name, desc, &[], SamplerState::clamped())?;
        Ok(Self { object })
    }

    /// A 1x1 texture of one color.
    pub fn solid_color(ctx: &GraphicsContext, name: &str, rgba: [u8; 4]) -> Result<Self> {
        let data = TextureData::from_raw(1, 1, TextureFormat::Rgba, rgba.to_vec());
        Self::from_data(ctx, name, &data, SamplerState::nearest())
    }

    pub fn invalid(name: &str) -> Self {
        Self {
            object: TextureObject::invalid(name, TextureKind::Texture2D),
        }
    }
}

/// Cube map face order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// A six-faced cube map, sampled by direction.
pub struct TextureCube {
    object: TextureObject,
}

sampler_accessors!(TextureCube);

impl TextureCube {
    /// # Errors
    ///
    /// When any face is empty or the faces disagree in size or format.
    pub fn from_faces(
        ctx: &GraphicsContext,
        name: &str,
        faces: [&TextureData; 6],
        sampler: SamplerState,
    ) -> Result<Self> {
        let first = faces[0];
        for (face, data) in CUBE_FACES.iter().zip(faces.iter()) {
            if !data.is_valid() {
                return Err(GfxError::creation(
                    "cube map",
                    format!("'{}' face {} has no pixel data", name, face),
                ));
            }
            if (data.width, data.height, data.format) != (first.width, first.height, first.format)
            {
                return Err(GfxError::creation(
                    "cube map",
                    format!("'{}' face {} does not match the other faces", name, face),
                ));
            }
        }

        let desc = TextureDescriptor {
            kind: TextureKind::Cube,
            width: first.width,
            height: first.height,
            format: first.format,
            render_target: false,
        };
        let layers: Vec<&[u8]> = faces.iter().map(|data| data.data.as_slice()).collect();
        let object = TextureObject::create(ctx, name, desc, &layers, sampler)?;
        Ok(Self { object })
    }

    /// Loads six face images in [`CUBE_FACES`] order. Failures produce an
    /// invalid cube map and a warning.
    pub fn load<P: AsRef<Path>>(ctx: &GraphicsContext, name: &str, paths: [P; 6]) -> Self {
        let faces: Vec<TextureData> = paths.iter().map(TextureData::load_or_empty).collect();
        let refs = [&faces[0], &faces[1], &faces[2], &faces[3], &faces[4], &faces[5]];
        Self::from_faces(ctx, name, refs, SamplerState::clamped()).unwrap_or_else(|err| {
            log::warn!("{}", err);
            Self::invalid(name)
        })
    }

    pub fn invalid(name: &str) -> Self {
        Self {
            object: TextureObject::invalid(name, TextureKind::Cube),
        }
    }
}
