//! Materials
//!
//! A material knows which program it renders with and writes its own
//! parameters and texture bindings into that program before a draw.

use std::fmt;
use std::rc::Rc;

use cgmath::Vector3;

use crate::gfx::resources::Texture;
use crate::gfx::shader::Program;

/// Shader name used by [`PhongMaterial`].
pub const PHONG_SHADER: &str = "phong";
/// Shader name used by [`BasicMaterial`].
pub const BASIC_SHADER: &str = "basic";

pub trait Material: fmt::Debug {
    fn name(&self) -> &str;

    /// Name of the program this material is drawn with, as known to the
    /// shader manager.
    fn shader_name(&self) -> &str;

    /// Writes parameters and binds textures for the next draw.
    fn bind(&self, program: &Program);

    /// Releases the texture units taken by [`Material::bind`].
    fn unbind(&self);

    /// One-line human readable summary.
    fn describe(&self) -> String;
}

/// A texture slot; invalid textures are treated as absent.
fn usable(texture: &Option<Rc<Texture>>) -> Option<&Rc<Texture>> {
    texture.as_ref().filter(|t| t.is_valid())
}

/// Binds `texture` to `unit` and points `sampler` at it, or flags the map
/// as missing.
fn bind_map(program: &Program, texture: Option<&Rc<Texture>>, unit: u32, sampler: &str, flag: &str) {
    match texture {
        Some(texture) => {
            texture.bind(unit);
            program.set_int(sampler, unit as i32);
            program.set_bool(flag, true);
        }
        None => program.set_bool(flag, false),
    }
}

/// Blinn-Phong material with optional albedo, specular and normal maps.
#[derive(Debug, Clone)]
pub struct PhongMaterial {
    pub name: String,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
    albedo_map: Option<Rc<Texture>>,
    specular_map: Option<Rc<Texture>>,
    normal_map: Option<Rc<Texture>>,
}

impl PhongMaterial {
    pub const ALBEDO_UNIT: u32 = 0;
    pub const SPECULAR_UNIT: u32 = 1;
    pub const NORMAL_UNIT: u32 = 2;

    pub fn new(
        name: &str,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        shininess: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            ambient,
            diffuse,
            specular,
            shininess,
            albedo_map: None,
            specular_map: None,
            normal_map: None,
        }
    }

    pub fn with_albedo_map(mut self, texture: Rc<Texture>) -> Self {
        self.albedo_map = Some(texture);
        self
    }

    pub fn set_albedo_map(&mut self, texture: Option<Rc<Texture>>) {
        self.albedo_map = texture;
    }

    pub fn set_specular_map(&mut self, texture: Option<Rc<Texture>>) {
        self.specular_map = texture;
    }

    pub fn set_normal_map(&mut self, texture: Option<Rc<Texture>>) {
        self.normal_map = texture;
    }

    pub fn albedo_map(&self) -> Option<&Rc<Texture>> {
        self.albedo_map.as_ref()
    }

    pub fn specular_map(&self) -> Option<&Rc<Texture>> {
        self.specular_map.as_ref()
    }

    pub fn normal_map(&self) -> Option<&Rc<Texture>> {
        self.normal_map.as_ref()
    }
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self::new(
            "default",
            Vector3::new(1.0, 0.5, 0.31),
            Vector3::new(1.0, 0.5, 0.31),
            Vector3::new(0.5, 0.5, 0.5),
            32.0,
        )
    }
}

impl Material for PhongMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn shader_name(&self) -> &str {
        PHONG_SHADER
    }

    fn bind(&self, program: &Program) {
        program.set_vec3("u_material.ambient", self.ambient);
        program.set_vec3("u_material.diffuse", self.diffuse);
        program.set_vec3("u_material.specular", self.specular);
        program.set_float("u_material.shininess", self.shininess);

        bind_map(
            program,
            usable(&self.albedo_map),
            Self::ALBEDO_UNIT,
            "u_albedo_map",
            "u_material.has_albedo_map",
        );
        bind_map(
            program,
            usable(&self.specular_map),
            Self::SPECULAR_UNIT,
            "u_specular_map",
            "u_material.has_specular_map",
        );
        bind_map(
            program,
            usable(&self.normal_map),
            Self::NORMAL_UNIT,
            "u_normal_map",
            "u_material.has_normal_map",
        );
    }

    fn unbind(&self) {
        for (texture, unit) in [
            (&self.albedo_map, Self::ALBEDO_UNIT),
            (&self.specular_map, Self::SPECULAR_UNIT),
            (&self.normal_map, Self::NORMAL_UNIT),
        ] {
            if let Some(texture) = usable(texture) {
                texture.unbind(unit);
            }
        }
    }

    fn describe(&self) -> String {
        let map_name = |t: &Option<Rc<Texture>>| t.as_ref().map_or("none".to_string(), |t| t.name().to_string());
        format!(
            "PhongMaterial '{}': ambient ({:.2}, {:.2}, {:.2}), diffuse ({:.2}, {:.2}, {:.2}), specular ({:.2}, {:.2}, {:.2}), shininess {:.1}, albedo map {}, specular map {}, normal map {}",
            self.name,
            self.ambient.x,
            self.ambient.y,
            self.ambient.z,
            self.diffuse.x,
            self.diffuse.y,
            self.diffuse.z,
            self.specular.x,
            self.specular.y,
            self.specular.z,
            self.shininess,
            map_name(&self.albedo_map),
            map_name(&self.specular_map),
            map_name(&self.normal_map)
        )
    }
}

/// Unlit color, optionally modulated by a texture.
#[derive(Debug, Clone)]
pub struct BasicMaterial {
    pub name: String,
    pub color: Vector3<f32>,
    texture: Option<Rc<Texture>>,
}

impl BasicMaterial {
    pub const TEXTURE_UNIT: u32 = 0;

    pub fn new(name: &str, color: Vector3<f32>) -> Self {
        Self {
            name: name.to_string(),
            color,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Rc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.texture.as_ref()
    }
}

impl Material for BasicMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn shader_name(&self) -> &str {
        BASIC_SHADER
    }

    fn bind(&self, program: &Program) {
        program.set_vec3("u_color", self.color);
        bind_map(
            program,
            usable(&self.texture),
            Self::TEXTURE_UNIT,
            "u_texture",
            "u_has_texture",
        );
    }

    fn unbind(&self) {
        if let Some(texture) = usable(&self.texture) {
            texture.unbind(Self::TEXTURE_UNIT);
        }
    }

    fn describe(&self) -> String {
        format!(
            "BasicMaterial '{}': color ({:.2}, {:.2}, {:.2}), texture {}",
            self.name,
            self.color.x,
            self.color.y,
            self.color.z,
            self.texture.as_ref().map_or("none", |t| t.name())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{BindingSlot, HeadlessBackend};
    use crate::gfx::context::GraphicsContext;
    use crate::gfx::resources::{SamplerState, TextureData, TextureFormat};

    #[test]
    fn test_invalid_texture_is_skipped() {
        let material = BasicMaterial::new("m", Vector3::new(1.0, 0.0, 0.0)).with_texture(Rc::new(Texture::invalid("missing.png")));
        assert!(usable(&material.texture).is_none());
        assert!(material.describe().contains("missing.png"));
    }

    #[test]
    fn test_phong_bind_binds_maps_to_fixed_units() {
        let backend = Rc::new(HeadlessBackend::new());
        let ctx = GraphicsContext::new(backend.clone());
        let data = TextureData::from_raw(1, 1, TextureFormat::Rgba, vec![255; 4]);
        let albedo = Rc::new(Texture::from_data(&ctx, "albedo", &data, SamplerState::default()).unwrap());
        let material = PhongMaterial::default().with_albedo_map(albedo.clone());

        let program = Program::invalid("phong", "not linked");
        material.bind(&program);
        assert_eq!(
            ctx.current_binding(BindingSlot::Texture(PhongMaterial::ALBEDO_UNIT)),
            albedo.handle()
        );
        material.unbind();
        assert!(ctx
            .current_binding(BindingSlot::Texture(PhongMaterial::ALBEDO_UNIT))
            .is_none());
    }
}
