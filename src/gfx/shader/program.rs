use std::cell::RefCell;
use std::collections::HashMap;

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::gfx::backend::GpuHandle;
use crate::gfx::context::{ContextRef, GraphicsContext};

use super::{ShaderSources, UniformLocation, UniformValue};

/// A linked shader program.
///
/// Construction never fails: a program whose stages do not compile or link is
/// *invalid*, keeps the info log and holds no backend object. Uniform setters
/// look the name up once and cache the answer, including misses, so unknown
/// names cost a hash lookup and are otherwise ignored.
pub struct Program {
    name: String,
    handle: GpuHandle,
    ctx: ContextRef,
    info_log: Option<String>,
    locations: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl Program {
    pub fn new(ctx: &GraphicsContext, name: &str, sources: &ShaderSources) -> Self {
        match ctx.backend().create_program(name, sources) {
            Ok(handle) => {
                log::debug!("program '{}' linked ({})", name, handle);
                Self {
                    name: name.to_string(),
                    handle,
                    ctx: ctx.downgrade(),
                    info_log: None,
                    locations: RefCell::new(HashMap::new()),
                }
            }
            Err(log_text) => {
                log::warn!("program '{}' failed to build: {}", name, log_text);
                Self::invalid(name, log_text)
            }
        }
    }

    pub fn from_source(ctx: &GraphicsContext, name: &str, vertex: &str, fragment: &str) -> Self {
        Self::new(ctx, name, &ShaderSources::new(vertex, fragment))
    }

    /// A program that never reached the backend.
    pub fn invalid(name: &str, info_log: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            handle: GpuHandle::NONE,
            ctx: ContextRef::detached(),
            info_log: Some(info_log.into()),
            locations: RefCell::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    pub fn is_valid(&self) -> bool {
        !self.handle.is_none()
    }

    /// Compile or link log of an invalid program.
    pub fn info_log(&self) -> Option<&str> {
        self.info_log.as_deref()
    }

    /// # Panics
    ///
    /// If the program is invalid or its context is gone.
    pub fn bind(&self) {
        assert!(self.is_valid(), "cannot bind invalid program '{}'", self.name);
        self.ctx.live("program").backend().bind_program(self.handle);
    }

    pub fn unbind(&self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().bind_program(GpuHandle::NONE);
        }
    }

    /// Cached uniform lookup.
    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.locations.borrow().get(name) {
            return *cached;
        }

        let location = if self.is_valid() {
            self.ctx
                .upgrade()
                .and_then(|ctx| ctx.backend().uniform_location(self.handle, name))
        } else {
            None
        };
        if location.is_none() {
            log::trace!("program '{}' has no uniform '{}'", self.name, name);
        }
        self.locations
            .borrow_mut()
            .insert(name.to_string(), location);
        location
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.location(name).is_some()
    }

    /// Sets a uniform by name. Unknown names and invalid programs are a
    /// silent no-op.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        let Some(location) = self.location(name) else {
            return;
        };
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.backend().set_uniform(self.handle, location, value.into());
        }
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn set_vec2(&self, name: &str, value: Vector2<f32>) {
        self.set_uniform(name, value);
    }

    pub fn set_vec3(&self, name: &str, value: Vector3<f32>) {
        self.set_uniform(name, value);
    }

    pub fn set_vec4(&self, name: &str, value: Vector4<f32>) {
        self.set_uniform(name, value);
    }

    pub fn set_mat3(&self, name: &str, value: &Matrix3<f32>) {
        self.set_uniform(name, *value);
    }

    pub fn set_mat4(&self, name: &str, value: &Matrix4<f32>) {
        self.set_uniform(name, *value);
    }

    #[cfg(test)]
    pub(crate) fn cached_lookups(&self) -> usize {
        self.locations.borrow().len()
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        match self.ctx.upgrade() {
            Some(ctx) => ctx.backend().destroy_program(self.handle),
            None => log::trace!("program '{}' outlived its context", self.name),
        }
        self.handle = GpuHandle::NONE;
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::gfx::backend::{BackendCall, BindingSlot, HeadlessBackend};

    pub(crate) const FLAT_VS: &str = r#"
struct Uniforms {
    u_mvp: mat4x4<f32>,
    u_color: vec4<f32>,
    u_strength: f32,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.u_mvp * vec4<f32>(position, 1.0);
}
"#;

    pub(crate) const FLAT_FS: &str = r#"
struct Uniforms {
    u_mvp: mat4x4<f32>,
    u_color: vec4<f32>,
    u_strength: f32,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.u_color * u.u_strength;
}
"#;

    fn setup() -> (GraphicsContext, Rc<HeadlessBackend>) {
        let backend = Rc::new(HeadlessBackend::new());
        (GraphicsContext::new(backend.clone()), backend)
    }

    #[test]
    fn test_valid_program_binds() {
        let (ctx, _) = setup();
        let program = Program::from_source(&ctx, "flat", FLAT_VS, FLAT_FS);
        assert!(program.is_valid());
        assert!(program.info_log().is_none());

        program.bind();
        assert_eq!(ctx.current_binding(BindingSlot::Program), program.handle());
        program.unbind();
        assert_eq!(ctx.current_binding(BindingSlot::Program), GpuHandle::NONE);
    }

    #[test]
    fn test_compile_failure_yields_invalid_program() {
        let (ctx, _) = setup();
        let program = Program::from_source(&ctx, "broken", "this is not wgsl", FLAT_FS);
        assert!(!program.is_valid());
        assert!(program.info_log().unwrap().contains("vertex"));
    }

    #[test]
    fn test_set_and_read_back_uniform() {
        let (ctx, backend) = setup();
        let program = Program::from_source(&ctx, "flat", FLAT_VS, FLAT_FS);
        program.set_float("u_strength", 0.5);

        assert_eq!(
            backend.uniform(program.handle(), "u_strength"),
            Some(UniformValue::Float(0.5))
        );
    }

    #[test]
    fn test_unknown_uniform_is_noop() {
        let (ctx, backend) = setup();
        let program = Program::from_source(&ctx, "flat", FLAT_VS, FLAT_FS);
        let calls_before = backend.calls().len();

        program.set_float("u_does_not_exist", 1.0);
        program.set_float("u_does_not_exist", 2.0);

        assert_eq!(backend.calls().len(), calls_before);
        assert_eq!(program.cached_lookups(), 1);
    }

    #[test]
    fn test_type_mismatch_leaves_value_untouched() {
        let (ctx, backend) = setup();
        let program = Program::from_source(&ctx, "flat", FLAT_VS, FLAT_FS);
        program.set_float("u_strength", 2.0);
        program.set_int("u_strength", 7);

        assert_eq!(
            backend.uniform(program.handle(), "u_strength"),
            Some(UniformValue::Float(2.0))
        );
        assert!(!backend.take_errors().is_empty());
    }

    #[test]
    fn test_drop_destroys_program() {
        let (ctx, backend) = setup();
        let program = Program::from_source(&ctx, "flat", FLAT_VS, FLAT_FS);
        let handle = program.handle();
        drop(program);
        assert!(backend
            .calls()
            .contains(&BackendCall::DestroyProgram(handle)));
    }

    #[test]
    fn test_drop_after_context_is_gone() {
        let (ctx, backend) = setup();
        let program = Program::from_source(&ctx, "flat", FLAT_VS, FLAT_FS);
        drop(ctx);
        drop(program);
        assert!(!backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::DestroyProgram(_))));
    }
}
