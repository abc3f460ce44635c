use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::Diagnostic;
use crate::gfx::context::GraphicsContext;
use crate::gfx::rendering::shaders::{self, SKYBOX_SHADER};
use crate::gfx::scene::material::{BASIC_SHADER, PHONG_SHADER};
use crate::gfx::shader::{Program, ShaderSources};

/// Cache of linked programs keyed by shader name.
///
/// Programs are built lazily on first request, from a registered source
/// if one exists, otherwise from `{shaders_dir}/{name}_vs.wgsl` and
/// `{shaders_dir}/{name}_fs.wgsl`. The built-in `phong`, `basic` and
/// `skybox` sources are registered up front.
pub struct ShaderManager {
    ctx: GraphicsContext,
    shaders_dir: PathBuf,
    sources: HashMap<String, ShaderSources>,
    programs: HashMap<String, Rc<Program>>,
    diagnostics: Vec<Diagnostic>,
}

impl ShaderManager {
    pub fn new(ctx: &GraphicsContext, shaders_dir: impl Into<PathBuf>) -> Self {
        let mut manager = Self {
            ctx: ctx.clone(),
            shaders_dir: shaders_dir.into(),
            sources: HashMap::new(),
            programs: HashMap::new(),
            diagnostics: Vec::new(),
        };
        manager.register_source(PHONG_SHADER, shaders::phong_sources());
        manager.register_source(BASIC_SHADER, shaders::basic_sources());
        manager.register_source(SKYBOX_SHADER, shaders::skybox_sources());
        manager
    }

    pub fn shaders_dir(&self) -> &Path {
        &self.shaders_dir
    }

    /// Makes `sources` the recipe for `name`. An already linked program
    /// keeps being served until [`ShaderManager::reload_program`].
    pub fn register_source(&mut self, name: &str, sources: ShaderSources) {
        log::trace!("registered shader source '{}'", name);
        self.sources.insert(name.to_string(), sources);
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// The program for `name`, built on first use. Failures cache an
    /// invalid program and record a diagnostic.
    pub fn get_cached_program(&mut self, name: &str) -> Rc<Program> {
        if let Some(program) = self.programs.get(name) {
            return Rc::clone(program);
        }

        let program = match self.sources.get(name).cloned() {
            Some(sources) => self.build(name, &sources),
            None => {
                let vertex = self.shaders_dir.join(format!("{}_vs.wgsl", name));
                let fragment = self.shaders_dir.join(format!("{}_fs.wgsl", name));
                self.build_from_files(name, &vertex, &fragment)
            }
        };
        self.insert(name, program)
    }

    /// Builds `name` from explicit stage files. A hit returns the cached
    /// program and ignores the paths.
    pub fn load_program(
        &mut self,
        name: &str,
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Rc<Program> {
        if let Some(program) = self.programs.get(name) {
            return Rc::clone(program);
        }
        let program = self.build_from_files(name, vertex.as_ref(), fragment.as_ref());
        self.insert(name, program)
    }

    /// Drops the cached program for `name` and builds it again from its
    /// current recipe. Holders of the old program keep their copy.
    pub fn reload_program(&mut self, name: &str) -> Rc<Program> {
        if self.programs.remove(name).is_some() {
            log::info!("reloading program '{}'", name);
        }
        self.get_cached_program(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn clear(&mut self) {
        log::debug!("clearing program cache ({} programs)", self.programs.len());
        self.programs.clear();
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn build(&mut self, name: &str, sources: &ShaderSources) -> Program {
        let program = Program::new(&self.ctx, name, sources);
        if !program.is_valid() {
            let log_text = program.info_log().unwrap_or("link failed").to_string();
            self.report(name, log_text);
        }
        program
    }

    fn build_from_files(&mut self, name: &str, vertex: &Path, fragment: &Path) -> Program {
        match ShaderSources::from_files(vertex, fragment, None) {
            Ok(sources) => self.build(name, &sources),
            Err(err) => {
                let message = err.to_string();
                self.report(name, message.clone());
                Program::invalid(name, message)
            }
        }
    }

    fn insert(&mut self, name: &str, program: Program) -> Rc<Program> {
        let program = Rc::new(program);
        self.programs.insert(name.to_string(), Rc::clone(&program));
        log::debug!("cached program '{}' (valid: {})", name, program.is_valid());
        program
    }

    fn report(&mut self, name: &str, message: String) {
        log::warn!("shader '{}': {}", name, message);
        self.diagnostics
            .push(Diagnostic::new(format!("shader:{}", name), message));
    }
}

impl std::fmt::Debug for ShaderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderManager")
            .field("shaders_dir", &self.shaders_dir)
            .field("sources", &self.sources.len())
            .field("programs", &self.programs.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::test_support::scratch_dir;

    const FLAT_VS: &str = r#"
struct Uniforms {
    u_color: vec4<f32>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

    const FLAT_FS: &str = r#"
struct Uniforms {
    u_color: vec4<f32>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.u_color;
}
"#;

    #[test]
    fn test_builtin_programs_link() {
        let ctx = GraphicsContext::headless();
        let mut manager = ShaderManager::new(&ctx, "/no/shaders");
        for name in [PHONG_SHADER, BASIC_SHADER, SKYBOX_SHADER] {
            let program = manager.get_cached_program(name);
            assert!(program.is_valid(), "{}: {:?}", name, program.info_log());
        }
        let phong = manager.get_cached_program(PHONG_SHADER);
        assert!(phong.has_uniform("u_material.shininess"));
        assert!(phong.has_uniform("u_point_light.att_quadratic"));
        assert!(phong.has_uniform("u_albedo_map"));
        assert!(manager.diagnostics().is_empty());
    }

    #[test]
    fn test_program_cache_is_idempotent() {
        let ctx = GraphicsContext::headless();
        let mut manager = ShaderManager::new(&ctx, "/no/shaders");
        let first = manager.get_cached_program(BASIC_SHADER);
        let second = manager.get_cached_program(BASIC_SHADER);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_program_from_shader_directory() {
        let dir = scratch_dir("shaders");
        std::fs::write(dir.join("flat_vs.wgsl"), FLAT_VS).unwrap();
        std::fs::write(dir.join("flat_fs.wgsl"), FLAT_FS).unwrap();

        let ctx = GraphicsContext::headless();
        let mut manager = ShaderManager::new(&ctx, &dir);
        let program = manager.get_cached_program("flat");
        assert!(program.is_valid());
        assert!(program.has_uniform("u_color"));
    }

    #[test]
    fn test_missing_shader_is_invalid_with_diagnostic() {
        let ctx = GraphicsContext::headless();
        let mut manager = ShaderManager::new(&ctx, "/no/shaders");
        let program = manager.get_cached_program("ghost");
        assert!(!program.is_valid());
        assert_eq!(manager.diagnostics().len(), 1);
        assert_eq!(manager.diagnostics()[0].source, "shader:ghost");

        // Cached as invalid; no second diagnostic.
        manager.get_cached_program("ghost");
        assert_eq!(manager.diagnostics().len(), 1);
    }

    #[test]
    fn test_link_failure_is_reported_and_reload_picks_up_new_source() {
        let ctx = GraphicsContext::headless();
        let mut manager = ShaderManager::new(&ctx, "/no/shaders");
        manager.register_source("flat", ShaderSources::new("not wgsl", FLAT_FS));
        let broken = manager.get_cached_program("flat");
        assert!(!broken.is_valid());
        assert_eq!(manager.take_diagnostics().len(), 1);

        manager.register_source("flat", ShaderSources::new(FLAT_VS, FLAT_FS));
        assert!(!manager.get_cached_program("flat").is_valid());
        let fixed = manager.reload_program("flat");
        assert!(fixed.is_valid());
        assert!(!broken.is_valid());
    }

    #[test]
    fn test_load_program_from_explicit_paths() {
        let dir = scratch_dir("shader-paths");
        let vs = dir.join("a.wgsl");
        let fs = dir.join("b.wgsl");
        std::fs::write(&vs, FLAT_VS).unwrap();
        std::fs::write(&fs, FLAT_FS).unwrap();

        let ctx = GraphicsContext::headless();
        let mut manager = ShaderManager::new(&ctx, "/no/shaders");
        let program = manager.load_program("custom", &vs, &fs);
        assert!(program.is_valid());
        assert!(Rc::ptr_eq(&program, &manager.get_cached_program("custom")));
    }
}
