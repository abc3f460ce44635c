//! Application shell
//!
//! [`Application`] wires a window, the resource managers, a scene, a camera
//! with its controller and the main renderer into a frame loop. Fields are
//! torn down renderer first, then scene and managers, and the window (with
//! the graphics context) last, so every GPU object is released while the
//! context is still alive.

use std::path::Path;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::gfx::assets::{ShaderManager, TextureManager};
use crate::gfx::camera::{Camera, CameraController, CameraControllerKind, ProjectionData};
use crate::gfx::context::GraphicsContext;
use crate::gfx::rendering::{MainRenderer, RenderReport};
use crate::gfx::scene::{Model, Scene};
use crate::input::{Action, InputEvent, Key};
use crate::logging::init_logging;
use crate::window::Window;

/// Longest frame step handed to controllers, in seconds.
const MAX_FRAME_DT: f32 = 0.1;

pub struct Application {
    renderer: MainRenderer,
    scene: Scene,
    camera: Camera,
    controller: CameraControllerKind,
    textures: TextureManager,
    shaders: ShaderManager,
    window: Window,
    config: EngineConfig,
    last_frame: Option<Instant>,
}

impl Application {
    /// Initialises logging and opens a window as configured.
    pub fn new(config: EngineConfig) -> Result<Self> {
        init_logging(config.logging.clone());
        let window = Window::new(&config.window)?;
        Self::with_window(window, config)
    }

    /// Builds the application around an already opened window.
    pub fn with_window(window: Window, config: EngineConfig) -> Result<Self> {
        let ctx = window.context().clone();
        let renderer = MainRenderer::new(&ctx, config.renderer)?;
        let textures = TextureManager::new(&ctx, config.resources.images());
        let shaders = ShaderManager::new(&ctx, config.resources.shaders());

        let camera = Camera::new(
            cgmath::Point3::new(0.0, 0.0, 5.0),
            cgmath::Point3::new(0.0, 0.0, 0.0),
            cgmath::Vector3::unit_y(),
            ProjectionData {
                aspect: window.aspect(),
                ..ProjectionData::default()
            },
        );

        log::info!("application ready (resources at {})", config.resources.root().display());
        Ok(Self {
            renderer,
            scene: Scene::new(),
            camera,
            controller: CameraControllerKind::fixed(),
            textures,
            shaders,
            window,
            config,
            last_frame: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &GraphicsContext {
        self.window.context()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn controller(&self) -> &CameraControllerKind {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CameraControllerKind {
        &mut self.controller
    }

    pub fn set_controller(&mut self, controller: impl Into<CameraControllerKind>) {
        self.controller = controller.into();
        let (width, height) = self.window.size();
        self.controller.on_resize(width, height);
        log::debug!("camera controller: {}", self.controller.name());
    }

    pub fn textures(&mut self) -> &mut TextureManager {
        &mut self.textures
    }

    pub fn shaders(&mut self) -> &mut ShaderManager {
        &mut self.shaders
    }

    pub fn renderer(&self) -> &MainRenderer {
        &self.renderer
    }

    /// Loads an OBJ file into the scene, textures resolved through the
    /// texture manager.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let model = Model::from_obj(self.window.context(), path, &mut self.textures)?;
        Ok(self.scene.add_model(model))
    }

    /// Uses the cube map `name` from the images directory as the skybox.
    /// Returns false (and keeps the previous skybox) when it fails to load.
    pub fn load_skybox(&mut self, name: &str) -> bool {
        let cube = self.textures.get_cached_texture_cube(name);
        if !cube.is_valid() {
            return false;
        }
        self.scene.set_skybox(Some(cube));
        true
    }

    /// Runs one frame: events, controller, `update`, render.
    pub fn step(&mut self, update: &mut impl FnMut(&mut Application, f32)) -> Result<RenderReport> {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32())
            .min(MAX_FRAME_DT);
        self.last_frame = Some(now);

        self.window.begin()?;
        let mut close = false;
        for event in self.window.events() {
            match *event {
                InputEvent::Key {
                    key: Key::Escape,
                    action: Action::Press,
                    ..
                } => close = true,
                InputEvent::Resize { width, height } => self.camera.resize(width, height),
                _ => {}
            }
            self.controller.handle_event(event);
        }
        if close {
            self.window.request_close();
        }

        update(self, dt);
        self.controller.update(&mut self.camera, dt);

        let report = self.renderer.render(&self.scene, &self.camera, &mut self.shaders);
        self.window.end()?;
        Ok(report)
    }

    /// Runs frames until the window closes or the frame limit is reached.
    pub fn run(&mut self, mut update: impl FnMut(&mut Application, f32)) -> Result<()> {
        log::info!("entering frame loop");
        while self.window.active() {
            self.step(&mut update)?;
        }
        log::info!("frame loop finished after {} frames", self.window.frames());
        Ok(())
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        log::debug!(
            "shutting down: {} textures, {} programs cached",
            self.textures.len(),
            self.shaders.len()
        );
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("window", &self.window)
            .field("controller", &self.controller.name())
            .field("models", &self.scene.models().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use cgmath::Vector3;

    use crate::config::WindowConfig;
    use crate::gfx::backend::{BackendKind, HeadlessBackend};
    use crate::gfx::camera::OrbitController;
    use crate::gfx::geometry::create_sphere;
    use crate::gfx::scene::{Mesh, PhongMaterial, PointLight};
    use crate::window::HeadlessWindow;

    fn app_with_backend(frames: u64) -> (Application, Rc<HeadlessBackend>) {
        let backend = Rc::new(HeadlessBackend::with_size(320, 240));
        let config = EngineConfig::default().with_window(
            WindowConfig::default()
                .with_backend(BackendKind::Headless)
                .with_max_frames(frames),
        );
        let window = Window::from_impl(Box::new(HeadlessWindow::with_backend(backend.clone())), &config.window);
        (Application::with_window(window, config).unwrap(), backend)
    }

    #[test]
    fn test_run_draws_every_frame_and_releases_everything() {
        let (mut app, backend) = app_with_backend(3);
        let ctx = app.context().clone();
        let mesh = Mesh::from_geometry(&ctx, "ball", &create_sphere(1.0, 16, 8), Rc::new(PhongMaterial::default())).unwrap();
        app.scene_mut().add_model(Model::from_mesh(mesh));
        app.scene_mut().add_light(PointLight::new(Vector3::new(2.0, 2.0, 2.0)));

        let mut updates = 0;
        app.run(|_, _| updates += 1).unwrap();

        assert_eq!(updates, 3);
        assert_eq!(backend.frames_completed(), 3);
        assert_eq!(backend.draws().len(), 3);
        assert_eq!(app.renderer().last_report().drawn, 1);
        assert!(backend.take_errors().is_empty());

        drop(app);
        assert!(!ctx.is_alive());
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn test_escape_closes_and_resize_reaches_camera() {
        let (mut app, _backend) = app_with_backend(100);
        app.set_controller(OrbitController::new(app.camera(), 320, 240));
        app.window_mut().inject_event(InputEvent::Resize { width: 400, height: 100 });
        app.window_mut().inject_event(InputEvent::Key {
            key: Key::Escape,
            action: Action::Press,
            modifiers: Default::default(),
        });

        app.run(|_, _| {}).unwrap();

        assert_eq!(app.window().frames(), 1);
        assert!((app.camera().proj_data().aspect - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_skybox_is_rejected() {
        let (mut app, _backend) = app_with_backend(1);
        assert!(!app.load_skybox("no-such-sky"));
        assert!(app.scene().skybox().is_none());
        assert!(!app.textures().diagnostics().is_empty());
    }
}
