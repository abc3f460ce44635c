//! Light sources
//!
//! Plain data; the renderer writes the first enabled light of each kind into
//! the `u_dir_light`, `u_point_light` and `u_spot_light` uniform structs.

use std::fmt;

use cgmath::{Deg, InnerSpace, Vector3};

use crate::gfx::shader::Program;

/// Distance falloff `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    /// Roughly a 50 unit range.
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
    pub enabled: bool,
}

impl DirectionalLight {
    pub fn new(direction: Vector3<f32>) -> Self {
        Self {
            direction,
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
    pub attenuation: Attenuation,
    pub enabled: bool,
}

impl PointLight {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            attenuation: Attenuation::default(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
    pub attenuation: Attenuation,
    /// Full intensity inside this angle.
    pub inner_cutoff: Deg<f32>,
    /// No light outside this angle.
    pub outer_cutoff: Deg<f32>,
    pub enabled: bool,
}

impl SpotLight {
    pub fn new(position: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            position,
            direction,
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            attenuation: Attenuation::default(),
            inner_cutoff: Deg(12.5),
            outer_cutoff: Deg(17.5),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Name of the uniform struct this kind is written to.
    pub fn uniform_name(self) -> &'static str {
        match self {
            LightKind::Directional => "u_dir_light",
            LightKind::Point => "u_point_light",
            LightKind::Spot => "u_spot_light",
        }
    }

    pub const ALL: [LightKind; 3] = [LightKind::Directional, LightKind::Point, LightKind::Spot];
}

impl Light {
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Directional(_) => LightKind::Directional,
            Light::Point(_) => LightKind::Point,
            Light::Spot(_) => LightKind::Spot,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Light::Directional(l) => l.enabled,
            Light::Point(l) => l.enabled,
            Light::Spot(l) => l.enabled,
        }
    }

    /// Writes this light into its uniform struct.
    pub fn upload(&self, program: &Program) {
        let prefix = self.kind().uniform_name();
        let set_vec3 = |field: &str, value: Vector3<f32>| program.set_vec3(&format!("{}.{}", prefix, field), value);
        let set_float = |field: &str, value: f32| program.set_float(&format!("{}.{}", prefix, field), value);
        let set_attenuation = |att: &Attenuation| {
            set_float("att_constant", att.constant);
            set_float("att_linear", att.linear);
            set_float("att_quadratic", att.quadratic);
        };

        match self {
            Light::Directional(l) => {
                set_vec3("direction", safe_normalize(l.direction));
                set_vec3("color", l.color);
                set_float("intensity", l.intensity);
            }
            Light::Point(l) => {
                set_vec3("position", l.position);
                set_vec3("color", l.color);
                set_float("intensity", l.intensity);
                set_attenuation(&l.attenuation);
            }
            Light::Spot(l) => {
                set_vec3("position", l.position);
                set_vec3("direction", safe_normalize(l.direction));
                set_vec3("color", l.color);
                set_float("intensity", l.intensity);
                set_attenuation(&l.attenuation);
                set_float("inner_cutoff", cgmath::Angle::cos(l.inner_cutoff));
                set_float("outer_cutoff", cgmath::Angle::cos(l.outer_cutoff));
            }
        }
        program.set_bool(&format!("{}.enabled", prefix), self.is_enabled());
    }

    /// Marks a light kind as absent in the program.
    pub fn upload_disabled(kind: LightKind, program: &Program) {
        program.set_bool(&format!("{}.enabled", kind.uniform_name()), false);
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Light::Directional(l) => write!(
                f,
                "DirectionalLight(direction: ({:.2}, {:.2}, {:.2}), intensity: {:.2})",
                l.direction.x, l.direction.y, l.direction.z, l.intensity
            ),
            Light::Point(l) => write!(
                f,
                "PointLight(position: ({:.2}, {:.2}, {:.2}), intensity: {:.2})",
                l.position.x, l.position.y, l.position.z, l.intensity
            ),
            Light::Spot(l) => write!(
                f,
                "SpotLight(position: ({:.2}, {:.2}, {:.2}), cutoff: {:.1}/{:.1} deg)",
                l.position.x, l.position.y, l.position.z, l.inner_cutoff.0, l.outer_cutoff.0
            ),
        }
    }
}

fn safe_normalize(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        Vector3::new(0.0, 0.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_uniform_names() {
        let light: Light = DirectionalLight::new(Vector3::new(-1.0, -2.0, -3.0)).into();
        assert_eq!(light.kind(), LightKind::Directional);
        assert_eq!(light.kind().uniform_name(), "u_dir_light");
        assert!(light.is_enabled());
    }

    #[test]
    fn test_display_mentions_kind() {
        let light: Light = PointLight::new(Vector3::new(0.0, 1.0, 2.0)).into();
        assert!(light.to_string().starts_with("PointLight"));
    }
}
