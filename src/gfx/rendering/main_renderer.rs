use std::collections::HashSet;

use crate::config::RendererConfig;
use crate::error::Result;
use crate::gfx::assets::ShaderManager;
use crate::gfx::backend::ClearState;
use crate::gfx::camera::Camera;
use crate::gfx::context::GraphicsContext;
use crate::gfx::scene::Scene;

use super::mesh_renderer::MeshRenderer;
use super::skybox_renderer::SkyboxRenderer;
use super::RenderReport;

/// Runs the mesh pass and then the skybox pass for a scene.
pub struct MainRenderer {
    ctx: GraphicsContext,
    config: RendererConfig,
    mesh_renderer: MeshRenderer,
    skybox_renderer: SkyboxRenderer,
    /// Diagnostic sources already logged, so a broken mesh warns once
    /// rather than every frame.
    reported: HashSet<String>,
    last_report: RenderReport,
}

impl MainRenderer {
    pub fn new(ctx: &GraphicsContext, config: RendererConfig) -> Result<Self> {
        let skybox_renderer = SkyboxRenderer::new(ctx)?;
        log::debug!("main renderer created ({:?})", config);
        Ok(Self {
            ctx: ctx.clone(),
            config,
            mesh_renderer: MeshRenderer::new(config.frustum_culling),
            skybox_renderer,
            reported: HashSet::new(),
            last_report: RenderReport::default(),
        })
    }

    pub fn config(&self) -> RendererConfig {
        self.config
    }

    pub fn set_config(&mut self, config: RendererConfig) {
        self.config = config;
        self.mesh_renderer.frustum_culling = config.frustum_culling;
    }

    /// Draws the scene into the current frame.
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn render(&mut self, scene: &Scene, camera: &Camera, shaders: &mut ShaderManager) -> RenderReport {
        assert!(self.ctx.in_frame(), "MainRenderer::render called outside a frame");

        let mut report = RenderReport::default();
        self.mesh_renderer
            .render(&self.ctx, scene, camera, shaders, &mut report);

        if self.config.draw_skybox {
            if let Some(skybox) = scene.skybox() {
                self.skybox_renderer
                    .render(&self.ctx, camera, skybox, shaders, &mut report);
            }
        }

        for diagnostic in &report.diagnostics {
            if self.reported.insert(diagnostic.source.clone()) {
                log::warn!("{}", diagnostic);
            }
        }
        log::trace!(
            "frame {}: drawn {}, skipped {}, culled {}",
            self.ctx.frame_index(),
            report.drawn,
            report.skipped,
            report.culled
        );

        self.last_report = report.clone();
        report
    }

    /// Begins a frame, renders the scene and ends the frame.
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        shaders: &mut ShaderManager,
        clear: ClearState,
    ) -> Result<RenderReport> {
        self.ctx.begin_frame(clear)?;
        let report = self.render(scene, camera, shaders);
        self.ctx.end_frame()?;
        Ok(report)
    }

    pub fn last_report(&self) -> &RenderReport {
        &self.last_report
    }
}

impl std::fmt::Debug for MainRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainRenderer")
            .field("config", &self.config)
            .field("last_report", &self.last_report)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use cgmath::Vector3;

    use crate::gfx::backend::HeadlessBackend;
    use crate::gfx::geometry::create_box;
    use crate::gfx::resources::{SamplerState, TextureCube, TextureData, TextureFormat};
    use crate::gfx::scene::{BasicMaterial, DirectionalLight, Mesh, Model, PhongMaterial, PHONG_SHADER};
    use crate::gfx::shader::{ShaderSources, UniformValue};

    struct Fixture {
        backend: Rc<HeadlessBackend>,
        ctx: GraphicsContext,
        shaders: ShaderManager,
        scene: Scene,
        camera: Camera,
    }

    fn fixture() -> Fixture {
        let backend = Rc::new(HeadlessBackend::new());
        let ctx = GraphicsContext::new(backend.clone());
        let shaders = ShaderManager::new(&ctx, "no-such-shader-dir");
        Fixture {
            backend,
            ctx,
            shaders,
            scene: Scene::new(),
            camera: Camera::default(),
        }
    }

    fn phong_box(ctx: &GraphicsContext, name: &str) -> Model {
        let mesh = Mesh::from_geometry(ctx, name, &create_box(1.0, 1.0, 1.0), Rc::new(PhongMaterial::default())).unwrap();
        Model::from_mesh(mesh)
    }

    fn basic_box(ctx: &GraphicsContext, name: &str) -> Model {
        let material = BasicMaterial::new(name, Vector3::new(0.2, 0.8, 0.2));
        let mesh = Mesh::from_geometry(ctx, name, &create_box(1.0, 1.0, 1.0), Rc::new(material)).unwrap();
        Model::from_mesh(mesh)
    }

    #[test]
    fn test_phong_box_draws_once_with_light_uniforms() {
        let mut f = fixture();
        f.scene.add_model(phong_box(&f.ctx, "box"));
        f.scene.add_light(DirectionalLight::new(Vector3::new(-1.0, -1.0, -1.0)));

        let mut renderer = MainRenderer::new(&f.ctx, RendererConfig::default()).unwrap();
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();

        assert_eq!(report.drawn, 1);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert!(f.backend.take_errors().is_empty());

        let draws = f.backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 36);
        assert_eq!(draws[0].uniforms.get("u_dir_light.enabled"), Some(&UniformValue::Int(1)));
        assert_eq!(draws[0].uniforms.get("u_point_light.enabled"), Some(&UniformValue::Int(0)));
        assert_eq!(draws[0].uniforms.get("u_fog.enabled"), Some(&UniformValue::Int(0)));
        assert_eq!(f.ctx.stats().draw_calls, 1);
        assert_eq!(renderer.last_report(), &report);
    }

    #[test]
    fn test_meshes_are_grouped_by_shader() {
        let mut f = fixture();
        f.scene.add_model(phong_box(&f.ctx, "a"));
        f.scene.add_model(basic_box(&f.ctx, "b"));
        f.scene.add_model(phong_box(&f.ctx, "c"));

        let mut renderer = MainRenderer::new(&f.ctx, RendererConfig::default()).unwrap();
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();

        assert_eq!(report.drawn, 3);
        let stats = f.ctx.stats();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.program_binds, 2);
    }

    #[test]
    fn test_failed_link_skips_mesh_and_frame_completes() {
        let mut f = fixture();
        f.shaders
            .register_source(PHONG_SHADER, ShaderSources::new("this is not wgsl", "neither is this"));
        f.scene.add_model(phong_box(&f.ctx, "broken"));
        f.scene.add_model(basic_box(&f.ctx, "fine"));

        let mut renderer = MainRenderer::new(&f.ctx, RendererConfig::default()).unwrap();
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();

        assert_eq!(report.drawn, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].source, "mesh:broken");
        assert_eq!(f.backend.draws().len(), 1);
        assert_eq!(f.backend.frames_completed(), 1);
        assert!(!f.ctx.in_frame());
    }

    #[test]
    fn test_frustum_culling_counts_hidden_models() {
        let mut f = fixture();
        let mut behind = phong_box(&f.ctx, "behind");
        behind.set_translation(Vector3::new(0.0, 0.0, 20.0));
        f.scene.add_model(behind);

        let mut renderer = MainRenderer::new(&f.ctx, RendererConfig::default()).unwrap();
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();
        assert_eq!((report.drawn, report.culled), (0, 1));
        assert!(f.backend.draws().is_empty());

        renderer.set_config(RendererConfig::default().with_frustum_culling(false));
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();
        assert_eq!((report.drawn, report.culled), (1, 0));
    }

    #[test]
    fn test_skybox_drawn_after_meshes() {
        let mut f = fixture();
        let face = TextureData::from_raw(1, 1, TextureFormat::Rgba, vec![40, 90, 200, 255]);
        let cube = TextureCube::from_faces(&f.ctx, "sky", [&face; 6], SamplerState::clamped()).unwrap();
        f.scene.set_skybox(Some(Rc::new(cube)));
        f.scene.add_model(phong_box(&f.ctx, "box"));

        let mut renderer = MainRenderer::new(&f.ctx, RendererConfig::default()).unwrap();
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();

        assert!(report.skybox_drawn);
        assert!(f.backend.take_errors().is_empty());
        let draws = f.backend.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].count, 36);
        assert!(!draws[1].textures.get(&0).copied().unwrap_or_default().is_none());

        renderer.set_config(RendererConfig::default().with_skybox(false));
        let report = renderer
            .render_frame(&f.scene, &f.camera, &mut f.shaders, ClearState::default())
            .unwrap();
        assert!(!report.skybox_drawn);
    }

    #[test]
    #[should_panic(expected = "outside a frame")]
    fn test_render_outside_frame_panics() {
        let mut f = fixture();
        let mut renderer = MainRenderer::new(&f.ctx, RendererConfig::default()).unwrap();
        renderer.render(&f.scene, &f.camera, &mut f.shaders);
    }
}
