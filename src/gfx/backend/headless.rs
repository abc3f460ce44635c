//! In-memory backend
//!
//! Keeps every object in a slot map, validates handles and bind state the
//! way a GPU driver would, and records each call so tests can assert on what
//! the engine asked for. Buffer contents are kept, so read-back works.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use cgmath::{Matrix4, SquareMatrix};
use slotmap::{new_key_type, SlotMap};

use crate::error::{GfxError, Result};
use crate::gfx::resources::layout::VertexBufferLayout;
use crate::gfx::resources::texture::SamplerState;
use crate::gfx::shader::reflect::{self, ProgramLayout, UniformTarget};
use crate::gfx::shader::{ShaderSources, UniformLocation, UniformValue};

use super::{
    validate_draw, AttachedVertexBuffer, Backend, BackendKind, BindState, BindingSlot,
    BufferTarget, BufferUsage, ClearState, FrameStats, GpuHandle, TextureDescriptor, TextureKind,
    VertexArrayState,
};

new_key_type! {
    struct ObjectKey;
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateBuffer(GpuHandle),
    UpdateBuffer(GpuHandle),
    BindBuffer(BufferTarget, GpuHandle),
    DestroyBuffer(GpuHandle),
    CreateVertexArray(GpuHandle),
    BindVertexArray(GpuHandle),
    DestroyVertexArray(GpuHandle),
    CreateTexture(GpuHandle),
    SetSampler(GpuHandle),
    BindTexture(u32, GpuHandle),
    DestroyTexture(GpuHandle),
    CreateProgram(GpuHandle),
    SetUniform(GpuHandle, String),
    BindProgram(GpuHandle),
    DestroyProgram(GpuHandle),
    CreateFramebuffer(GpuHandle),
    BindFramebuffer(GpuHandle),
    DestroyFramebuffer(GpuHandle),
    BeginFrame,
    EndFrame,
    Draw(u32),
    Resize(u32, u32),
}

/// Bind state captured when a draw was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: GpuHandle,
    pub vertex_array: GpuHandle,
    pub framebuffer: GpuHandle,
    /// Texture bound to each unit the program samples.
    pub textures: BTreeMap<u32, GpuHandle>,
    pub uniforms: HashMap<String, UniformValue>,
    pub count: u32,
}

struct BufferObject {
    target: BufferTarget,
    usage: BufferUsage,
    data: Vec<u8>,
}

struct TextureObject {
    desc: TextureDescriptor,
    sampler: SamplerState,
}

struct ProgramObject {
    label: String,
    layout: ProgramLayout,
    block: Vec<u8>,
    values: HashMap<String, UniformValue>,
}

enum Object {
    Buffer(BufferObject),
    VertexArray(VertexArrayState),
    Texture(TextureObject),
    Program(ProgramObject),
    Framebuffer,
}

impl Object {
    fn type_name(&self) -> &'static str {
        match self {
            Object::Buffer(_) => "buffer",
            Object::VertexArray(_) => "vertex array",
            Object::Texture(_) => "texture",
            Object::Program(_) => "program",
            Object::Framebuffer => "framebuffer",
        }
    }
}

#[derive(Default)]
struct HeadlessState {
    objects: SlotMap<ObjectKey, Object>,
    bind: BindState,
    frame_active: bool,
    size: (u32, u32),
    stats: FrameStats,
    frames: u64,
    calls: Vec<BackendCall>,
    draws: Vec<DrawRecord>,
    errors: Vec<String>,
}

impl HeadlessState {
    fn insert(&mut self, object: Object) -> GpuHandle {
        GpuHandle::from_key(self.objects.insert(object))
    }

    fn get(&self, handle: GpuHandle) -> Option<&Object> {
        handle.to_key::<ObjectKey>().and_then(|key| self.objects.get(key))
    }

    fn get_mut(&mut self, handle: GpuHandle) -> Option<&mut Object> {
        handle
            .to_key::<ObjectKey>()
            .and_then(|key| self.objects.get_mut(key))
    }

    fn error(&mut self, message: String) {
        log::warn!("headless backend: {}", message);
        self.errors.push(message);
    }

    /// Accepts NONE or a live object of the expected type.
    fn check_bindable(&mut self, handle: GpuHandle, expected: &'static str) -> bool {
        if handle.is_none() {
            return true;
        }
        match self.get(handle).map(Object::type_name) {
            Some(found) if found == expected => true,
            Some(found) => {
                self.error(format!("{} {} bound as {}", found, handle, expected));
                false
            }
            None => {
                self.error(format!("stale {} handle {}", expected, handle));
                false
            }
        }
    }

    fn destroy(&mut self, handle: GpuHandle, expected: &'static str) {
        match handle.to_key::<ObjectKey>() {
            Some(key) if self.objects.get(key).map(Object::type_name) == Some(expected) => {
                self.objects.remove(key);
                self.bind.forget(handle);
            }
            Some(_) => self.error(format!("destroying unknown {} {}", expected, handle)),
            None => {}
        }
    }

    fn program(&self, handle: GpuHandle) -> Option<&ProgramObject> {
        match self.get(handle) {
            Some(Object::Program(program)) => Some(program),
            _ => None,
        }
    }

    fn vertex_array(&self, handle: GpuHandle) -> Option<&VertexArrayState> {
        match self.get(handle) {
            Some(Object::VertexArray(state)) => Some(state),
            _ => None,
        }
    }
}

/// Backend that renders nothing and remembers everything.
pub struct HeadlessBackend {
    state: RefCell<HeadlessState>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_size(800, 600)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            state: RefCell::new(HeadlessState {
                size: (width, height),
                ..Default::default()
            }),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    /// Every accepted draw so far.
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    /// Clears the call and draw logs.
    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.clear();
        state.draws.clear();
    }

    /// Drains the errors recorded for tolerated misuse (stale handles, type
    /// mismatches, rejected draws).
    pub fn take_errors(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    pub fn live_objects(&self) -> usize {
        self.state.borrow().objects.len()
    }

    pub fn frames_completed(&self) -> u64 {
        self.state.borrow().frames
    }

    pub fn buffer_contents(&self, buffer: GpuHandle) -> Option<Vec<u8>> {
        match self.state.borrow().get(buffer) {
            Some(Object::Buffer(object)) => Some(object.data.clone()),
            _ => None,
        }
    }

    pub fn texture_sampler(&self, texture: GpuHandle) -> Option<SamplerState> {
        match self.state.borrow().get(texture) {
            Some(Object::Texture(object)) => Some(object.sampler),
            _ => None,
        }
    }

    pub fn texture_descriptor(&self, texture: GpuHandle) -> Option<TextureDescriptor> {
        match self.state.borrow().get(texture) {
            Some(Object::Texture(object)) => Some(object.desc),
            _ => None,
        }
    }

    /// Last value successfully written to a named uniform.
    pub fn uniform(&self, program: GpuHandle, name: &str) -> Option<UniformValue> {
        self.state
            .borrow()
            .program(program)
            .and_then(|p| p.values.get(name).copied())
    }

    pub fn program_layout(&self, program: GpuHandle) -> Option<ProgramLayout> {
        self.state.borrow().program(program).map(|p| p.layout.clone())
    }

    pub fn program_label(&self, program: GpuHandle) -> Option<String> {
        self.state.borrow().program(program).map(|p| p.label.clone())
    }
}

impl Backend for HeadlessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Headless
    }

    fn clip_correction(&self) -> Matrix4<f32> {
        Matrix4::identity()
    }

    fn create_buffer(
        &self,
        target: BufferTarget,
        usage: BufferUsage,
        size: u64,
        data: Option<&[u8]>,
    ) -> Result<GpuHandle> {
        let mut bytes = vec![0u8; size as usize];
        if let Some(data) = data {
            if data.len() as u64 > size {
                return Err(GfxError::creation(
                    "buffer",
                    format!("{} bytes of data for a {} byte buffer", data.len(), size),
                ));
            }
            bytes[..data.len()].copy_from_slice(data);
        }

        let mut state = self.state.borrow_mut();
        let handle = state.insert(Object::Buffer(BufferObject {
            target,
            usage,
            data: bytes,
        }));
        state.calls.push(BackendCall::CreateBuffer(handle));
        Ok(handle)
    }

    fn update_buffer(&self, buffer: GpuHandle, offset: u64, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::UpdateBuffer(buffer));
        let result = match state.get_mut(buffer) {
            Some(Object::Buffer(object)) => {
                let start = offset as usize;
                let end = start + data.len();
                if object.usage != BufferUsage::Dynamic {
                    Err(format!("update of static buffer {}", buffer))
                } else if end > object.data.len() {
                    Err(format!("update past the end of buffer {}", buffer))
                } else {
                    object.data[start..end].copy_from_slice(data);
                    Ok(())
                }
            }
            _ => Err(format!("update of stale buffer {}", buffer)),
        };
        match result {
            Ok(()) => state.stats.buffer_updates += 1,
            Err(message) => state.error(message),
        }
    }

    fn read_buffer(&self, buffer: GpuHandle) -> Option<Vec<u8>> {
        self.buffer_contents(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::BindBuffer(target, buffer));
        if !state.check_bindable(buffer, "buffer") {
            return;
        }
        if let Some(Object::Buffer(object)) = state.get(buffer) {
            if object.target != target {
                let message = format!("{:?} buffer {} bound as {:?}", object.target, buffer, target);
                state.error(message);
                return;
            }
        }
        state.bind.buffers.insert(target, buffer);
    }

    fn destroy_buffer(&self, buffer: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DestroyBuffer(buffer));
        state.destroy(buffer, "buffer");
    }

    fn create_vertex_array(&self) -> Result<GpuHandle> {
        let mut state = self.state.borrow_mut();
        let handle = state.insert(Object::VertexArray(VertexArrayState::default()));
        state.calls.push(BackendCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn attach_vertex_buffer(
        &self,
        vertex_array: GpuHandle,
        buffer: GpuHandle,
        base_slot: u32,
        layout: &VertexBufferLayout,
    ) {
        let mut state = self.state.borrow_mut();
        if !matches!(state.get(buffer), Some(Object::Buffer(_))) {
            state.error(format!("attaching stale buffer {}", buffer));
            return;
        }
        match state.get_mut(vertex_array) {
            Some(Object::VertexArray(va)) => va.vertex_buffers.push(AttachedVertexBuffer {
                buffer,
                base_slot,
                layout: layout.clone(),
            }),
            _ => state.error(format!("attaching to stale vertex array {}", vertex_array)),
        }
    }

    fn attach_index_buffer(&self, vertex_array: GpuHandle, buffer: GpuHandle, count: u32) {
        let mut state = self.state.borrow_mut();
        match state.get_mut(vertex_array) {
            Some(Object::VertexArray(va)) => va.index_buffer = Some((buffer, count)),
            _ => state.error(format!("attaching to stale vertex array {}", vertex_array)),
        }
    }

    fn bind_vertex_array(&self, vertex_array: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::BindVertexArray(vertex_array));
        if state.check_bindable(vertex_array, "vertex array") {
            state.bind.vertex_array = vertex_array;
        }
    }

    fn destroy_vertex_array(&self, vertex_array: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DestroyVertexArray(vertex_array));
        state.destroy(vertex_array, "vertex array");
    }

    fn create_texture(
        &self,
        desc: &TextureDescriptor,
        layers: &[&[u8]],
        sampler: &SamplerState,
    ) -> Result<GpuHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GfxError::creation(
                "texture",
                format!("invalid size {}x{}", desc.width, desc.height),
            ));
        }
        if !layers.is_empty() {
            if layers.len() != desc.kind.layer_count() {
                return Err(GfxError::creation(
                    "texture",
                    format!(
                        "{:?} needs {} layers, got {}",
                        desc.kind,
                        desc.kind.layer_count(),
                        layers.len()
                    ),
                ));
            }
            let expected = (desc.width * desc.height * desc.format.channels()) as usize;
            if let Some(bad) = layers.iter().find(|layer| layer.len() != expected) {
                return Err(GfxError::creation(
                    "texture",
                    format!("layer holds {} bytes, expected {}", bad.len(), expected),
                ));
            }
        }

        let mut state = self.state.borrow_mut();
        let handle = state.insert(Object::Texture(TextureObject {
            desc: *desc,
            sampler: *sampler,
        }));
        state.calls.push(BackendCall::CreateTexture(handle));
        Ok(handle)
    }

    fn set_sampler(&self, texture: GpuHandle, sampler: &SamplerState) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::SetSampler(texture));
        match state.get_mut(texture) {
            Some(Object::Texture(object)) => object.sampler = *sampler,
            _ => state.error(format!("sampler change on stale texture {}", texture)),
        }
    }

    fn bind_texture(&self, unit: u32, kind: TextureKind, texture: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::BindTexture(unit, texture));
        if !state.check_bindable(texture, "texture") {
            return;
        }
        if let Some(Object::Texture(object)) = state.get(texture) {
            if object.desc.kind != kind {
                let message = format!("{:?} texture {} bound as {:?}", object.desc.kind, texture, kind);
                state.error(message);
                return;
            }
        }
        state.bind.bind_texture(unit, kind, texture);
        if !texture.is_none() {
            state.stats.texture_binds += 1;
        }
    }

    fn destroy_texture(&self, texture: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DestroyTexture(texture));
        state.destroy(texture, "texture");
    }

    fn create_program(
        &self,
        label: &str,
        sources: &ShaderSources,
    ) -> std::result::Result<GpuHandle, String> {
        let (_, layout) = reflect::build_program(sources)?;
        let mut state = self.state.borrow_mut();
        let handle = state.insert(Object::Program(ProgramObject {
            label: label.to_string(),
            block: vec![0u8; layout.block_size as usize],
            layout,
            values: HashMap::new(),
        }));
        state.calls.push(BackendCall::CreateProgram(handle));
        Ok(handle)
    }

    fn uniform_location(&self, program: GpuHandle, name: &str) -> Option<UniformLocation> {
        self.state
            .borrow()
            .program(program)
            .and_then(|p| p.layout.find(name))
    }

    fn set_uniform(&self, program: GpuHandle, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let outcome = match state.get_mut(program) {
            Some(Object::Program(object)) => {
                let name = match object.layout.resolve(location) {
                    Some(UniformTarget::Block(info)) => Some(info.name.clone()),
                    Some(UniformTarget::Texture(_, slot)) => Some(slot.name.clone()),
                    None => None,
                };
                match name {
                    Some(name) => {
                        let ProgramObject {
                            label,
                            layout,
                            block,
                            values,
                        } = object;
                        if layout.apply(block, location, value) {
                            values.insert(name.clone(), value);
                            Ok(name)
                        } else {
                            Err(format!(
                                "{:?} does not match uniform '{}' of program '{}'",
                                value, name, label
                            ))
                        }
                    }
                    None => Err(format!("unknown uniform location {:?}", location)),
                }
            }
            _ => Err(format!("uniform write to stale program {}", program)),
        };
        match outcome {
            Ok(name) => state.calls.push(BackendCall::SetUniform(program, name)),
            Err(message) => state.error(message),
        }
    }

    fn bind_program(&self, program: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::BindProgram(program));
        if state.check_bindable(program, "program") {
            state.bind.program = program;
            if !program.is_none() {
                state.stats.program_binds += 1;
            }
        }
    }

    fn destroy_program(&self, program: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DestroyProgram(program));
        state.destroy(program, "program");
    }

    fn create_framebuffer(
        &self,
        color: Option<GpuHandle>,
        depth: Option<GpuHandle>,
    ) -> Result<GpuHandle> {
        let mut state = self.state.borrow_mut();
        for attachment in color.iter().chain(depth.iter()) {
            if !matches!(state.get(*attachment), Some(Object::Texture(_))) {
                return Err(GfxError::creation(
                    "framebuffer",
                    format!("attachment {} is not a live texture", attachment),
                ));
            }
        }
        let handle = state.insert(Object::Framebuffer);
        state.calls.push(BackendCall::CreateFramebuffer(handle));
        Ok(handle)
    }

    fn bind_framebuffer(&self, framebuffer: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::BindFramebuffer(framebuffer));
        if state.check_bindable(framebuffer, "framebuffer") {
            state.bind.framebuffer = framebuffer;
        }
    }

    fn destroy_framebuffer(&self, framebuffer: GpuHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DestroyFramebuffer(framebuffer));
        state.destroy(framebuffer, "framebuffer");
    }

    fn begin_frame(&self, _clear: ClearState) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::BeginFrame);
        state.frame_active = true;
        state.stats = FrameStats::default();
        Ok(())
    }

    fn end_frame(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::EndFrame);
        state.frame_active = false;
        state.frames += 1;
        Ok(())
    }

    fn resize(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::Resize(width, height));
        state.size = (width.max(1), height.max(1));
    }

    fn draw_indexed(&self, count: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let program = state.bind.program;
        let vertex_array = state.bind.vertex_array;

        let verdict = validate_draw(
            state.frame_active,
            state.program(program).map(|p| &p.layout),
            state.vertex_array(vertex_array),
            count,
        );
        if let Err(err) = verdict {
            state.error(err.to_string());
            return Err(err);
        }

        let (textures, uniforms) = match state.program(program) {
            Some(object) => (
                object
                    .layout
                    .textures
                    .iter()
                    .map(|slot| (slot.unit, state.bind.get(BindingSlot::Texture(slot.unit))))
                    .collect(),
                object.values.clone(),
            ),
            None => (BTreeMap::new(), HashMap::new()),
        };

        let record = DrawRecord {
            program,
            vertex_array,
            framebuffer: state.bind.framebuffer,
            textures,
            uniforms,
            count,
        };
        state.draws.push(record);
        state.calls.push(BackendCall::Draw(count));
        state.stats.draw_calls += 1;
        state.stats.indices += count as u64;
        Ok(())
    }

    fn current_binding(&self, slot: BindingSlot) -> GpuHandle {
        self.state.borrow().bind.get(slot)
    }

    fn stats(&self) -> FrameStats {
        self.state.borrow().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::layout::{BufferElement, ElementType};
    use crate::gfx::resources::texture_data::TextureFormat;

    const VS: &str = r#"
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    fn quad(backend: &HeadlessBackend) -> GpuHandle {
        let layout = VertexBufferLayout::new(vec![BufferElement::new(
            "position",
            ElementType::Float2,
            false,
        )]);
        let vb = backend
            .create_buffer(BufferTarget::Vertex, BufferUsage::Static, 32, None)
            .unwrap();
        let ib = backend
            .create_buffer(BufferTarget::Index, BufferUsage::Static, 24, None)
            .unwrap();
        let va = backend.create_vertex_array().unwrap();
        backend.attach_vertex_buffer(va, vb, 0, &layout);
        backend.attach_index_buffer(va, ib, 6);
        va
    }

    #[test]
    fn test_draw_requires_frame_and_program() {
        let backend = HeadlessBackend::new();
        let va = quad(&backend);
        backend.bind_vertex_array(va);

        assert!(backend.draw_indexed(6).is_err());
        backend.begin_frame(ClearState::default()).unwrap();
        assert!(backend.draw_indexed(6).is_err());

        let program = backend.create_program("flat", &ShaderSources::new(VS, FS)).unwrap();
        backend.bind_program(program);
        backend.draw_indexed(6).unwrap();
        backend.end_frame().unwrap();

        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.take_errors().len(), 2);
    }

    #[test]
    fn test_draw_rejects_count_past_index_buffer() {
        let backend = HeadlessBackend::new();
        let va = quad(&backend);
        let program = backend.create_program("flat", &ShaderSources::new(VS, FS)).unwrap();
        backend.begin_frame(ClearState::default()).unwrap();
        backend.bind_program(program);
        backend.bind_vertex_array(va);
        assert!(backend.draw_indexed(7).is_err());
    }

    #[test]
    fn test_stale_handle_is_tolerated() {
        let backend = HeadlessBackend::new();
        let va = backend.create_vertex_array().unwrap();
        backend.destroy_vertex_array(va);
        backend.bind_vertex_array(va);

        assert!(backend.current_binding(BindingSlot::VertexArray).is_none());
        assert_eq!(backend.take_errors().len(), 1);
    }

    #[test]
    fn test_destroy_clears_binding() {
        let backend = HeadlessBackend::new();
        let desc = TextureDescriptor {
            kind: TextureKind::Texture2D,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba,
            render_target: false,
        };
        let texture = backend
            .create_texture(&desc, &[&[0, 0, 0, 255]], &SamplerState::default())
            .unwrap();
        backend.bind_texture(0, TextureKind::Texture2D, texture);
        backend.destroy_texture(texture);
        assert!(backend.current_binding(BindingSlot::Texture(0)).is_none());
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn test_texture_layer_size_is_checked() {
        let backend = HeadlessBackend::new();
        let desc = TextureDescriptor {
            kind: TextureKind::Texture2D,
            width: 2,
            height: 2,
            format: TextureFormat::Rgb,
            render_target: false,
        };
        assert!(backend
            .create_texture(&desc, &[&[0; 4]], &SamplerState::default())
            .is_err());
    }

    #[test]
    fn test_stats_reset_each_frame() {
        let backend = HeadlessBackend::new();
        let program = backend.create_program("flat", &ShaderSources::new(VS, FS)).unwrap();
        backend.begin_frame(ClearState::default()).unwrap();
        backend.bind_program(program);
        assert_eq!(backend.stats().program_binds, 1);
        backend.end_frame().unwrap();
        backend.begin_frame(ClearState::default()).unwrap();
        assert_eq!(backend.stats(), FrameStats::default());
    }
}
