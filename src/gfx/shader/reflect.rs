//! WGSL stage compilation and program reflection
//!
//! Both backends compile shader stages through naga so that uniform
//! introspection behaves identically with or without a GPU. Programs follow a
//! fixed binding convention:
//!
//! - `@group(0) @binding(0)`: one `var<uniform>` block. Struct members become
//!   uniforms; nested structs flatten to dotted names (`u_light.color`).
//! - `@group(1)`: texture unit `k` is a texture at binding `2k` paired with
//!   its sampler at binding `2k + 1`.
//! - Entry points are `vs_main` and `fs_main`.

use std::collections::BTreeMap;

use naga::{AddressSpace, Binding, ImageDimension, ScalarKind, ShaderStage, TypeInner, VectorSize};

use crate::gfx::backend::TextureKind;

use super::{UniformLocation, UniformValue};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";
pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

/// Host-settable uniform types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Uint,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformKind {
    /// Bytes occupied inside the uniform block, including column padding.
    pub fn size(self) -> u32 {
        match self {
            UniformKind::Float | UniformKind::Int | UniformKind::Uint => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// A texture unit declared by the program.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    /// Name of the texture variable (or of the sampler if only that exists).
    pub name: String,
    pub sampler_name: Option<String>,
    pub kind: TextureKind,
    /// Unit the slot samples from; defaults to `binding / 2` and can be
    /// re-targeted by setting the slot's name as an integer uniform.
    pub unit: u32,
    pub binding: u32,
}

/// Reflection data of a linked program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramLayout {
    pub uniforms: Vec<UniformInfo>,
    /// Size in bytes of the uniform block (0 when the program has none).
    pub block_size: u32,
    pub textures: Vec<TextureSlot>,
    /// Vertex input locations the vertex stage consumes.
    pub vertex_inputs: Vec<u32>,
}

/// What a [`UniformLocation`] refers to.
#[derive(Debug, Clone, Copy)]
pub enum UniformTarget<'a> {
    Block(&'a UniformInfo),
    Texture(usize, &'a TextureSlot),
}

impl ProgramLayout {
    pub fn find(&self, name: &str) -> Option<UniformLocation> {
        if let Some(index) = self.uniforms.iter().position(|u| u.name == name) {
            return Some(UniformLocation(index as u32));
        }
        self.textures
            .iter()
            .position(|slot| slot.name == name || slot.sampler_name.as_deref() == Some(name))
            .map(|index| UniformLocation((self.uniforms.len() + index) as u32))
    }

    pub fn resolve(&self, location: UniformLocation) -> Option<UniformTarget<'_>> {
        let index = location.0 as usize;
        if index < self.uniforms.len() {
            return Some(UniformTarget::Block(&self.uniforms[index]));
        }
        let texture_index = index - self.uniforms.len();
        self.textures
            .get(texture_index)
            .map(|slot| UniformTarget::Texture(texture_index, slot))
    }

    /// Applies a value to the CPU-side uniform block or the texture-unit
    /// table. Returns `false` (and changes nothing) when the value does not
    /// match the uniform's type.
    pub fn apply(&mut self, block: &mut [u8], location: UniformLocation, value: UniformValue) -> bool {
        match self.resolve(location) {
            Some(UniformTarget::Block(info)) => {
                let Some(bytes) = encode_uniform(info.kind, value) else {
                    return false;
                };
                let start = info.offset as usize;
                let end = start + bytes.len();
                if end > block.len() {
                    return false;
                }
                block[start..end].copy_from_slice(&bytes);
                true
            }
            Some(UniformTarget::Texture(index, _)) => match value {
                UniformValue::Int(unit) if unit >= 0 => {
                    self.textures[index].unit = unit as u32;
                    true
                }
                UniformValue::Uint(unit) => {
                    self.textures[index].unit = unit;
                    true
                }
                _ => false,
            },
            None => false,
        }
    }
}

/// Encodes a value for a uniform of the given kind, following WGSL host
/// layout (matrix columns padded to 16 bytes).
pub fn encode_uniform(kind: UniformKind, value: UniformValue) -> Option<Vec<u8>> {
    let bytes = match (kind, value) {
        (UniformKind::Float, UniformValue::Float(v)) => bytemuck::bytes_of(&v).to_vec(),
        (UniformKind::Int, UniformValue::Int(v)) => bytemuck::bytes_of(&v).to_vec(),
        (UniformKind::Int, UniformValue::Uint(v)) => bytemuck::bytes_of(&(v as i32)).to_vec(),
        (UniformKind::Uint, UniformValue::Uint(v)) => bytemuck::bytes_of(&v).to_vec(),
        (UniformKind::Uint, UniformValue::Int(v)) if v >= 0 => {
            bytemuck::bytes_of(&(v as u32)).to_vec()
        }
        (UniformKind::Vec2, UniformValue::Vec2(v)) => bytemuck::cast_slice(&v).to_vec(),
        (UniformKind::Vec3, UniformValue::Vec3(v)) => bytemuck::cast_slice(&v).to_vec(),
        (UniformKind::Vec4, UniformValue::Vec4(v)) => bytemuck::cast_slice(&v).to_vec(),
        (UniformKind::Mat3, UniformValue::Mat3(m)) => {
            let mut padded = Vec::with_capacity(48);
            for column in m.iter() {
                padded.extend_from_slice(bytemuck::cast_slice(column));
                padded.extend_from_slice(&[0u8; 4]);
            }
            padded
        }
        (UniformKind::Mat4, UniformValue::Mat4(m)) => bytemuck::cast_slice(&m).to_vec(),
        _ => return None,
    };
    Some(bytes)
}

/// Which pipeline stage a source string is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
    Geometry,
}

impl StageKind {
    fn entry_point(self) -> Option<(&'static str, ShaderStage)> {
        match self {
            StageKind::Vertex => Some((VERTEX_ENTRY, ShaderStage::Vertex)),
            StageKind::Fragment => Some((FRAGMENT_ENTRY, ShaderStage::Fragment)),
            StageKind::Geometry => None,
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Vertex => write!(f, "vertex"),
            StageKind::Fragment => write!(f, "fragment"),
            StageKind::Geometry => write!(f, "geometry"),
        }
    }
}

/// A parsed and validated shader stage.
#[derive(Debug)]
pub struct CompiledStage {
    pub kind: StageKind,
    pub module: naga::Module,
}

/// Parses and validates one stage. The error string is the compile log.
pub fn compile_stage(source: &str, kind: StageKind) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| format!("{} stage: {}", kind, err.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| format!("{} stage: validation failed: {}", kind, err))?;

    if let Some((entry, stage)) = kind.entry_point() {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.stage == stage && ep.name == entry);
        if !found {
            return Err(format!("{} stage: missing entry point '{}'", kind, entry));
        }
    }

    Ok(CompiledStage { kind, module })
}

/// Per-stage reflection before linking.
#[derive(Debug, Default)]
struct StageLayout {
    uniforms: Vec<UniformInfo>,
    block_size: u32,
    textures: BTreeMap<u32, TextureSlot>,
    vertex_inputs: Vec<u32>,
}

fn reflect_stage(stage: &CompiledStage) -> Result<StageLayout, String> {
    let module = &stage.module;
    let mut layout = StageLayout::default();
    let mut uniform_blocks = 0;

    for (_, var) in module.global_variables.iter() {
        let var_name = var.name.clone().unwrap_or_default();
        match var.space {
            AddressSpace::Uniform => {
                let binding = var.binding.as_ref().ok_or_else(|| {
                    format!("uniform '{}' has no resource binding", var_name)
                })?;
                if binding.group != UNIFORM_GROUP || binding.binding != 0 {
                    return Err(format!(
                        "uniform '{}' must be declared at @group({}) @binding(0)",
                        var_name, UNIFORM_GROUP
                    ));
                }
                uniform_blocks += 1;
                if uniform_blocks > 1 {
                    return Err("only one uniform block per stage is supported".to_string());
                }

                let inner = &module.types[var.ty].inner;
                layout.block_size = match inner {
                    TypeInner::Struct { span, .. } => *span,
                    other => other.size(module.to_ctx()),
                };
                let prefix = match inner {
                    TypeInner::Struct { .. } => String::new(),
                    _ => var_name.clone(),
                };
                flatten_uniforms(module, var.ty, &prefix, 0, &mut layout.uniforms);
            }
            AddressSpace::Handle => {
                let binding = var
                    .binding
                    .as_ref()
                    .ok_or_else(|| format!("resource '{}' has no resource binding", var_name))?;
                if binding.group != TEXTURE_GROUP {
                    return Err(format!(
                        "texture resource '{}' must live in @group({})",
                        var_name, TEXTURE_GROUP
                    ));
                }
                let unit = binding.binding / 2;
                match &module.types[var.ty].inner {
                    TypeInner::Image { dim, arrayed, .. } => {
                        if binding.binding % 2 != 0 {
                            return Err(format!(
                                "texture '{}' must use an even binding index",
                                var_name
                            ));
                        }
                        let kind = match (dim, arrayed) {
                            (ImageDimension::D2, false) => TextureKind::Texture2D,
                            (ImageDimension::Cube, false) => TextureKind::Cube,
                            _ => {
                                return Err(format!(
                                    "texture '{}' has an unsupported dimension",
                                    var_name
                                ))
                            }
                        };
                        let slot = layout.textures.entry(unit).or_insert_with(|| TextureSlot {
                            name: var_name.clone(),
                            sampler_name: None,
                            kind,
                            unit,
                            binding: binding.binding,
                        });
                        slot.name = var_name.clone();
                        slot.kind = kind;
                        slot.binding = unit * 2;
                    }
                    TypeInner::Sampler { .. } => {
                        if binding.binding % 2 != 1 {
                            return Err(format!(
                                "sampler '{}' must use an odd binding index",
                                var_name
                            ));
                        }
                        let slot = layout.textures.entry(unit).or_insert_with(|| TextureSlot {
                            name: var_name.clone(),
                            sampler_name: None,
                            kind: TextureKind::Texture2D,
                            unit,
                            binding: unit * 2,
                        });
                        slot.sampler_name = Some(var_name.clone());
                    }
                    _ => {
                        return Err(format!("unsupported handle resource '{}'", var_name));
                    }
                }
            }
            _ => {}
        }
    }

    if stage.kind == StageKind::Vertex {
        if let Some(ep) = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == ShaderStage::Vertex && ep.name == VERTEX_ENTRY)
        {
            for argument in &ep.function.arguments {
                match &argument.binding {
                    Some(Binding::Location { location, .. }) => {
                        layout.vertex_inputs.push(*location)
                    }
                    Some(Binding::BuiltIn(_)) => {}
                    None => {
                        if let TypeInner::Struct { members, .. } = &module.types[argument.ty].inner
                        {
                            for member in members {
                                if let Some(Binding::Location { location, .. }) = &member.binding {
                                    layout.vertex_inputs.push(*location);
                                }
                            }
                        }
                    }
                }
            }
            layout.vertex_inputs.sort_unstable();
        }
    }

    Ok(layout)
}

fn flatten_uniforms(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    prefix: &str,
    base_offset: u32,
    out: &mut Vec<UniformInfo>,
) {
    match &module.types[ty].inner {
        TypeInner::Struct { members, .. } => {
            for member in members {
                let member_name = member.name.clone().unwrap_or_default();
                let full_name = if prefix.is_empty() {
                    member_name
                } else {
                    format!("{}.{}", prefix, member_name)
                };
                flatten_uniforms(module, member.ty, &full_name, base_offset + member.offset, out);
            }
        }
        inner => match uniform_kind(inner) {
            Some(kind) => out.push(UniformInfo {
                name: prefix.to_string(),
                kind,
                offset: base_offset,
            }),
            None => log::debug!("uniform '{}' cannot be set from the host; skipped", prefix),
        },
    }
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
            ScalarKind::Float => Some(UniformKind::Float),
            ScalarKind::Sint => Some(UniformKind::Int),
            ScalarKind::Uint => Some(UniformKind::Uint),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => match size {
            VectorSize::Bi => Some(UniformKind::Vec2),
            VectorSize::Tri => Some(UniformKind::Vec3),
            VectorSize::Quad => Some(UniformKind::Vec4),
        },
        TypeInner::Matrix {
            columns: VectorSize::Tri,
            rows: VectorSize::Tri,
            ..
        } => Some(UniformKind::Mat3),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => Some(UniformKind::Mat4),
        _ => None,
    }
}

/// Merges the reflection of all stages into one program layout.
pub fn link(stages: &[CompiledStage]) -> Result<ProgramLayout, String> {
    if let Some(geometry) = stages.iter().find(|s| s.kind == StageKind::Geometry) {
        return Err(format!(
            "{} stage: WGSL has no geometry stage; programs must be vertex + fragment only",
            geometry.kind
        ));
    }
    for required in [StageKind::Vertex, StageKind::Fragment] {
        if !stages.iter().any(|s| s.kind == required) {
            return Err(format!("link: missing {} stage", required));
        }
    }

    let mut program = ProgramLayout::default();
    let mut textures: BTreeMap<u32, TextureSlot> = BTreeMap::new();

    for stage in stages {
        let layout = reflect_stage(stage)?;

        for uniform in layout.uniforms {
            match program.uniforms.iter().find(|u| u.name == uniform.name) {
                Some(existing) if existing != &uniform => {
                    return Err(format!(
                        "link: uniform '{}' is declared differently across stages",
                        uniform.name
                    ));
                }
                Some(_) => {}
                None => program.uniforms.push(uniform),
            }
        }
        program.block_size = program.block_size.max(layout.block_size);

        for (unit, slot) in layout.textures {
            match textures.get_mut(&unit) {
                Some(existing) => {
                    if existing.kind != slot.kind && slot.name != existing.name {
                        return Err(format!(
                            "link: texture unit {} is declared differently across stages",
                            unit
                        ));
                    }
                    if existing.sampler_name.is_none() {
                        existing.sampler_name = slot.sampler_name;
                    }
                }
                None => {
                    textures.insert(unit, slot);
                }
            }
        }

        if stage.kind == StageKind::Vertex {
            program.vertex_inputs = layout.vertex_inputs;
        }
    }

    program.textures = textures.into_values().collect();
    Ok(program)
}

/// Compiles every stage and links them. The error string is the info log.
pub fn build_program(sources: &super::ShaderSources) -> Result<(Vec<CompiledStage>, ProgramLayout), String> {
    let mut stages = vec![
        compile_stage(&sources.vertex, StageKind::Vertex)?,
        compile_stage(&sources.fragment, StageKind::Fragment)?,
    ];
    if let Some(geometry) = &sources.geometry {
        stages.push(CompiledStage {
            kind: StageKind::Geometry,
            module: naga::front::wgsl::parse_str(geometry)
                .map_err(|err| format!("geometry stage: {}", err.emit_to_string(geometry)))?,
        });
    }
    let layout = link(&stages)?;
    Ok((stages, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::shader::ShaderSources;

    const VS: &str = r#"
struct Light {
    direction: vec3<f32>,
    intensity: f32,
}

struct Uniforms {
    u_model: mat4x4<f32>,
    u_tint: vec3<f32>,
    u_time: f32,
    u_light: Light,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = u.u_model * vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}
"#;

    const FS: &str = r#"
struct Light {
    direction: vec3<f32>,
    intensity: f32,
}

struct Uniforms {
    u_model: mat4x4<f32>,
    u_tint: vec3<f32>,
    u_time: f32,
    u_light: Light,
}

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(1) @binding(0) var u_texture: texture_2d<f32>;
@group(1) @binding(1) var u_texture_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(u_texture, u_texture_sampler, uv) * vec4<f32>(u.u_tint, 1.0);
}
"#;

    fn sources() -> ShaderSources {
        ShaderSources::new(VS, FS)
    }

    #[test]
    fn test_reflects_flattened_uniforms() {
        let (_, layout) = build_program(&sources()).expect("program should link");

        let names: Vec<&str> = layout.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["u_model", "u_tint", "u_time", "u_light.direction", "u_light.intensity"]
        );
        assert_eq!(layout.uniforms[1].offset, 64);
        assert_eq!(layout.uniforms[2].offset, 76);
        assert_eq!(layout.uniforms[3].offset, 80);
        assert_eq!(layout.block_size, 96);
        assert_eq!(layout.vertex_inputs, vec![0, 1]);
    }

    #[test]
    fn test_reflects_texture_units() {
        let (_, layout) = build_program(&sources()).expect("program should link");
        assert_eq!(layout.textures.len(), 1);
        let slot = &layout.textures[0];
        assert_eq!(slot.name, "u_texture");
        assert_eq!(slot.sampler_name.as_deref(), Some("u_texture_sampler"));
        assert_eq!(slot.unit, 0);
        assert_eq!(slot.kind, TextureKind::Texture2D);
    }

    #[test]
    fn test_apply_rejects_type_mismatch() {
        let (_, mut layout) = build_program(&sources()).expect("program should link");
        let mut block = vec![0u8; layout.block_size as usize];

        let time = layout.find("u_time").expect("u_time exists");
        assert!(layout.apply(&mut block, time, UniformValue::Float(2.5)));
        assert_eq!(&block[76..80], bytemuck::bytes_of(&2.5f32));

        assert!(!layout.apply(&mut block, time, UniformValue::Vec3([1.0, 2.0, 3.0])));
        assert_eq!(&block[76..80], bytemuck::bytes_of(&2.5f32));
    }

    #[test]
    fn test_setting_texture_name_retargets_unit() {
        let (_, mut layout) = build_program(&sources()).expect("program should link");
        let mut block = vec![0u8; layout.block_size as usize];
        let location = layout.find("u_texture").expect("texture slot exists");

        assert!(layout.apply(&mut block, location, UniformValue::Int(3)));
        assert_eq!(layout.textures[0].unit, 3);
    }

    #[test]
    fn test_missing_entry_point_fails() {
        let broken = VS.replace("vs_main", "main");
        let err = compile_stage(&broken, StageKind::Vertex).unwrap_err();
        assert!(err.contains("vs_main"));
    }

    #[test]
    fn test_syntax_error_reports_log() {
        let err = compile_stage("fn vs_main( {", StageKind::Vertex).unwrap_err();
        assert!(err.starts_with("vertex stage"));
    }

    #[test]
    fn test_geometry_stage_rejected_at_link() {
        let mut with_geometry = sources();
        with_geometry.geometry = Some("fn helper() {}".to_string());
        let err = build_program(&with_geometry).unwrap_err();
        assert!(err.contains("geometry"));
    }

    #[test]
    fn test_mat3_is_column_padded() {
        let bytes = encode_uniform(
            UniformKind::Mat3,
            UniformValue::Mat3([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]),
        )
        .expect("matching kind");
        assert_eq!(bytes.len(), 48);
        let floats: &[f32] = bytemuck::cast_slice(&bytes);
        assert_eq!(floats[4], 4.0);
        assert_eq!(floats[3], 0.0);
    }
}
