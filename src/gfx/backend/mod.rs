//! # Backend Abstraction
//!
//! The rendering core never talks to a graphics API directly. Every GPU object
//! is created, bound and destroyed through the [`Backend`] trait, which models
//! a small bind-to-edit state machine: resources are made *current* with a
//! `bind_*` call and cleared by binding [`GpuHandle::NONE`].
//!
//! Two implementations exist and one is chosen once, at context creation, via
//! [`BackendKind`]:
//!
//! - [`headless::HeadlessBackend`] - in-memory backend that validates and
//!   records every call. Used by tests and by the headless window.
//! - [`wgpu_backend::WgpuBackend`] - renders through wgpu onto a window surface.

pub mod headless;
pub mod wgpu_backend;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use cgmath::Matrix4;
use slotmap::{Key, KeyData};

use crate::error::{GfxError, Result};
use crate::gfx::resources::layout::VertexBufferLayout;
use crate::gfx::resources::texture::SamplerState;
use crate::gfx::resources::texture_data::TextureFormat;
use crate::gfx::shader::reflect::ProgramLayout;
use crate::gfx::shader::{ShaderSources, UniformLocation, UniformValue};

pub use headless::{BackendCall, DrawRecord, HeadlessBackend};
pub use wgpu_backend::WgpuBackend;

/// Opaque backend-assigned identifier of a live GPU object.
///
/// Zero is the "none" sentinel: it is what a wrapper holds before creation and
/// after destruction, and binding it clears the current binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct GpuHandle(u64);

impl GpuHandle {
    pub const NONE: GpuHandle = GpuHandle(0);

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn from_key<K: Key>(key: K) -> Self {
        // Occupied slotmap versions are odd, so a live key never encodes to 0.
        Self(key.data().as_ffi())
    }

    pub(crate) fn to_key<K: Key>(self) -> Option<K> {
        if self.is_none() {
            None
        } else {
            Some(KeyData::from_ffi(self.0).into())
        }
    }
}

impl fmt::Display for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "<none>")
        } else {
            write!(f, "#{:x}", self.0)
        }
    }
}

/// Backend selection, resolved once when the context is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    Headless,
    #[default]
    Wgpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Headless => write!(f, "headless"),
            BackendKind::Wgpu => write!(f, "wgpu"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headless" | "null" => Ok(BackendKind::Headless),
            "wgpu" | "gpu" => Ok(BackendKind::Wgpu),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Usage hint given at buffer creation. Only dynamic buffers accept updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    Cube,
}

impl TextureKind {
    pub fn layer_count(self) -> usize {
        match self {
            TextureKind::Texture2D => 1,
            TextureKind::Cube => 6,
        }
    }
}

/// Everything a backend needs to allocate a texture object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDescriptor {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Whether the texture may be attached to a framebuffer.
    pub render_target: bool,
}

/// Per-frame clear values applied by `begin_frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    pub color: [f32; 4],
    pub depth: f32,
}

impl Default for ClearState {
    fn default() -> Self {
        Self {
            color: [0.1, 0.2, 0.3, 1.0],
            depth: 1.0,
        }
    }
}

/// Which piece of bind state to query with [`Backend::current_binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSlot {
    Program,
    VertexArray,
    Framebuffer,
    Buffer(BufferTarget),
    Texture(u32),
}

/// Counters for the current frame (reset by `begin_frame`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub indices: u64,
    pub program_binds: u32,
    pub texture_binds: u32,
    pub buffer_updates: u32,
}

/// Graphics backend interface.
///
/// All methods take `&self`: backends are single-threaded and keep their
/// state behind interior mutability, so the context can hand out shared
/// references to every resource wrapper. Creation can fail and returns a
/// `Result`; binding and state calls on stale or mismatched handles are
/// tolerated (logged and ignored), mirroring GPU-API error semantics.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Matrix taking OpenGL-convention clip space into this backend's.
    fn clip_correction(&self) -> Matrix4<f32>;

    fn create_buffer(
        &self,
        target: BufferTarget,
        usage: BufferUsage,
        size: u64,
        data: Option<&[u8]>,
    ) -> Result<GpuHandle>;
    fn update_buffer(&self, buffer: GpuHandle, offset: u64, data: &[u8]);
    /// Reads the full contents of a buffer back, if the backend supports it.
    fn read_buffer(&self, buffer: GpuHandle) -> Option<Vec<u8>>;
    fn bind_buffer(&self, target: BufferTarget, buffer: GpuHandle);
    fn destroy_buffer(&self, buffer: GpuHandle);

    fn create_vertex_array(&self) -> Result<GpuHandle>;
    fn attach_vertex_buffer(
        &self,
        vertex_array: GpuHandle,
        buffer: GpuHandle,
        base_slot: u32,
        layout: &VertexBufferLayout,
    );
    fn attach_index_buffer(&self, vertex_array: GpuHandle, buffer: GpuHandle, count: u32);
    fn bind_vertex_array(&self, vertex_array: GpuHandle);
    fn destroy_vertex_array(&self, vertex_array: GpuHandle);

    /// `layers` holds one tightly packed image per layer (1 for 2D, 6 for
    /// cube maps) or is empty for an uninitialised texture.
    fn create_texture(
        &self,
        desc: &TextureDescriptor,
        layers: &[&[u8]],
        sampler: &SamplerState,
    ) -> Result<GpuHandle>;
    fn set_sampler(&self, texture: GpuHandle, sampler: &SamplerState);
    fn bind_texture(&self, unit: u32, kind: TextureKind, texture: GpuHandle);
    fn destroy_texture(&self, texture: GpuHandle);

    /// Compiles and links a program. On failure returns the info log.
    fn create_program(
        &self,
        label: &str,
        sources: &ShaderSources,
    ) -> std::result::Result<GpuHandle, String>;
    fn uniform_location(&self, program: GpuHandle, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, program: GpuHandle, location: UniformLocation, value: UniformValue);
    fn bind_program(&self, program: GpuHandle);
    fn destroy_program(&self, program: GpuHandle);

    fn create_framebuffer(&self, color: Option<GpuHandle>, depth: Option<GpuHandle>)
        -> Result<GpuHandle>;
    fn bind_framebuffer(&self, framebuffer: GpuHandle);
    fn destroy_framebuffer(&self, framebuffer: GpuHandle);

    fn begin_frame(&self, clear: ClearState) -> Result<()>;
    fn end_frame(&self) -> Result<()>;
    fn resize(&self, width: u32, height: u32);

    /// Issues an indexed triangle-list draw using the current bind state.
    fn draw_indexed(&self, count: u32) -> Result<()>;

    fn current_binding(&self, slot: BindingSlot) -> GpuHandle;
    fn stats(&self) -> FrameStats;
}

/// Bind state shared by both backends.
#[derive(Debug, Default, Clone)]
pub(crate) struct BindState {
    pub program: GpuHandle,
    pub vertex_array: GpuHandle,
    pub framebuffer: GpuHandle,
    pub buffers: HashMap<BufferTarget, GpuHandle>,
    pub textures: HashMap<u32, (TextureKind, GpuHandle)>,
}

impl BindState {
    pub fn get(&self, slot: BindingSlot) -> GpuHandle {
        match slot {
            BindingSlot::Program => self.program,
            BindingSlot::VertexArray => self.vertex_array,
            BindingSlot::Framebuffer => self.framebuffer,
            BindingSlot::Buffer(target) => {
                self.buffers.get(&target).copied().unwrap_or(GpuHandle::NONE)
            }
            BindingSlot::Texture(unit) => self
                .textures
                .get(&unit)
                .map(|(_, handle)| *handle)
                .unwrap_or(GpuHandle::NONE),
        }
    }

    pub fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: GpuHandle) {
        if texture.is_none() {
            self.textures.remove(&unit);
        } else {
            self.textures.insert(unit, (kind, texture));
        }
    }

    /// Drops every reference to a destroyed object.
    pub fn forget(&mut self, handle: GpuHandle) {
        if self.program == handle {
            self.program = GpuHandle::NONE;
        }
        if self.vertex_array == handle {
            self.vertex_array = GpuHandle::NONE;
        }
        if self.framebuffer == handle {
            self.framebuffer = GpuHandle::NONE;
        }
        self.buffers.retain(|_, bound| *bound != handle);
        self.textures.retain(|_, (_, bound)| *bound != handle);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AttachedVertexBuffer {
    pub buffer: GpuHandle,
    pub base_slot: u32,
    pub layout: VertexBufferLayout,
}

/// Vertex-array attachment state shared by both backends.
#[derive(Debug, Clone, Default)]
pub(crate) struct VertexArrayState {
    pub vertex_buffers: Vec<AttachedVertexBuffer>,
    pub index_buffer: Option<(GpuHandle, u32)>,
}

impl VertexArrayState {
    pub fn provides_location(&self, location: u32) -> bool {
        self.vertex_buffers.iter().any(|attached| {
            location >= attached.base_slot
                && location < attached.base_slot + attached.layout.len() as u32
        })
    }
}

/// Draw-time state validation common to every backend.
pub(crate) fn validate_draw(
    frame_active: bool,
    program: Option<&ProgramLayout>,
    vertex_array: Option<&VertexArrayState>,
    count: u32,
) -> Result<()> {
    if !frame_active {
        return Err(GfxError::draw("no active frame"));
    }
    let program = program.ok_or_else(|| GfxError::draw("no valid program bound"))?;
    let vertex_array = vertex_array.ok_or_else(|| GfxError::draw("no vertex array bound"))?;
    let (_, index_count) = vertex_array
        .index_buffer
        .ok_or_else(|| GfxError::draw("bound vertex array has no index buffer"))?;
    if count == 0 {
        return Err(GfxError::draw("index count is zero"));
    }
    if count > index_count {
        return Err(GfxError::draw(format!(
            "requested {} indices but the index buffer holds {}",
            count, index_count
        )));
    }
    if let Some(missing) = program
        .vertex_inputs
        .iter()
        .find(|location| !vertex_array.provides_location(**location))
    {
        return Err(GfxError::draw(format!(
            "program reads vertex location {} which the vertex array does not provide",
            missing
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("headless".parse::<BackendKind>(), Ok(BackendKind::Headless));
        assert_eq!(" WGPU ".parse::<BackendKind>(), Ok(BackendKind::Wgpu));
        assert!("vulkan".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_none_handle() {
        assert!(GpuHandle::NONE.is_none());
        assert_eq!(GpuHandle::NONE.to_key::<slotmap::DefaultKey>(), None);
        assert_eq!(GpuHandle::NONE.to_string(), "<none>");
    }

    #[test]
    fn test_unbinding_texture_clears_unit() {
        let mut state = BindState::default();
        let handle = GpuHandle(3);
        state.bind_texture(2, TextureKind::Texture2D, handle);
        assert_eq!(state.get(BindingSlot::Texture(2)), handle);

        state.bind_texture(2, TextureKind::Texture2D, GpuHandle::NONE);
        assert_eq!(state.get(BindingSlot::Texture(2)), GpuHandle::NONE);
    }
}
