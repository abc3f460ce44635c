use std::rc::Rc;

use cgmath::Vector3;

use crate::gfx::resources::TextureCube;

use super::light::{Light, LightKind};
use super::model::Model;

/// Exponential-squared distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vector3<f32>,
    pub density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Vector3::new(0.6, 0.65, 0.7),
            density: 0.02,
        }
    }
}

/// Everything drawn in a frame apart from the camera.
///
/// Models draw in insertion order. Only the first enabled light of each
/// kind reaches the shaders.
#[derive(Debug)]
pub struct Scene {
    models: Vec<Model>,
    lights: Vec<Light>,
    pub ambient_light: Vector3<f32>,
    skybox: Option<Rc<TextureCube>>,
    pub fog: Option<Fog>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            lights: Vec::new(),
            ambient_light: Vector3::new(0.1, 0.1, 0.1),
            skybox: None,
            fog: None,
        }
    }

    /// Adds a model and returns its index.
    pub fn add_model(&mut self, model: Model) -> usize {
        log::debug!("scene: added model '{}' ({} meshes)", model.name(), model.meshes().len());
        self.models.push(model);
        self.models.len() - 1
    }

    pub fn remove_model(&mut self, index: usize) -> Option<Model> {
        (index < self.models.len()).then(|| self.models.remove(index))
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    pub fn model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn model_mut(&mut self, index: usize) -> Option<&mut Model> {
        self.models.get_mut(index)
    }

    pub fn find_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.name() == name)
    }

    pub fn mesh_count(&self) -> usize {
        self.models.iter().map(|model| model.meshes().len()).sum()
    }

    pub fn add_light(&mut self, light: impl Into<Light>) -> usize {
        self.lights.push(light.into());
        self.lights.len() - 1
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    /// The light of `kind` the shaders will see.
    pub fn active_light(&self, kind: LightKind) -> Option<&Light> {
        self.lights
            .iter()
            .find(|light| light.kind() == kind && light.is_enabled())
    }

    pub fn set_skybox(&mut self, skybox: Option<Rc<TextureCube>>) {
        self.skybox = skybox;
    }

    pub fn skybox(&self) -> Option<&Rc<TextureCube>> {
        self.skybox.as_ref()
    }

    /// Removes models, lights, skybox and fog.
    pub fn clear(&mut self) {
        self.models.clear();
        self.lights.clear();
        self.skybox = None;
        self.fog = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::light::{DirectionalLight, PointLight};

    #[test]
    fn test_active_light_skips_disabled() {
        let mut scene = Scene::new();
        let mut off = PointLight::new(Vector3::new(1.0, 0.0, 0.0));
        off.enabled = false;
        scene.add_light(off);
        scene.add_light(PointLight::new(Vector3::new(2.0, 0.0, 0.0)));
        scene.add_light(DirectionalLight::new(Vector3::new(0.0, 0.0, -1.0)));

        match scene.active_light(LightKind::Point) {
            Some(Light::Point(light)) => assert_eq!(light.position.x, 2.0),
            other => panic!("unexpected {:?}", other),
        }
        assert!(scene.active_light(LightKind::Spot).is_none());
        assert_eq!(scene.lights().len(), 3);
    }

    #[test]
    fn test_models_keep_insertion_order() {
        let mut scene = Scene::new();
        assert_eq!(scene.add_model(Model::new("a", Vec::new())), 0);
        assert_eq!(scene.add_model(Model::new("b", Vec::new())), 1);
        assert_eq!(scene.models()[1].name(), "b");
        assert!(scene.find_model("a").is_some());
        assert_eq!(scene.mesh_count(), 0);

        assert_eq!(scene.remove_model(0).map(|m| m.name().to_string()), Some("a".to_string()));
        assert!(scene.remove_model(5).is_none());
        scene.clear();
        assert!(scene.models().is_empty());
    }
}
