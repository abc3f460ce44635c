//! Mesh pass
//!
//! Meshes are grouped by the shader their material asks for. Each program
//! is bound once per frame and receives the camera, ambient, light and fog
//! uniforms; then every mesh in the group binds its material and vertex
//! array, draws, and unbinds in reverse order.

use cgmath::{Matrix4, Vector3};

use crate::error::Diagnostic;
use crate::gfx::assets::ShaderManager;
use crate::gfx::camera::Camera;
use crate::gfx::context::GraphicsContext;
use crate::gfx::scene::{Light, LightKind, Mesh, Model, Scene};
use crate::gfx::shader::Program;

use super::frustum::Frustum;
use super::RenderReport;

/// Per-frame values shared by every program.
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub view_proj: Matrix4<f32>,
    pub viewer_position: Vector3<f32>,
}

impl FrameUniforms {
    pub fn from_camera(ctx: &GraphicsContext, camera: &Camera) -> Self {
        let position = camera.position();
        Self {
            view_proj: ctx.clip_correction() * camera.view_projection_matrix(),
            viewer_position: Vector3::new(position.x, position.y, position.z),
        }
    }
}

struct ShaderBatch<'a> {
    shader: &'a str,
    items: Vec<(&'a Model, &'a Mesh)>,
}

#[derive(Debug, Clone)]
pub struct MeshRenderer {
    pub frustum_culling: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MeshRenderer {
    pub fn new(frustum_culling: bool) -> Self {
        Self { frustum_culling }
    }

    pub fn render(
        &self,
        ctx: &GraphicsContext,
        scene: &Scene,
        camera: &Camera,
        shaders: &mut ShaderManager,
        report: &mut RenderReport,
    ) {
        let frustum = Frustum::from_matrix(&camera.view_projection_matrix());
        let frame = FrameUniforms::from_camera(ctx, camera);

        for batch in self.batches(scene, &frustum, report) {
            let program = shaders.get_cached_program(batch.shader);
            if !program.is_valid() {
                for (_, mesh) in &batch.items {
                    report.skip(Diagnostic::new(
                        format!("mesh:{}", mesh.name()),
                        format!("skipped, program '{}' is invalid", batch.shader),
                    ));
                }
                continue;
            }

            program.bind();
            write_frame_uniforms(&program, scene, &frame);
            for (model, mesh) in batch.items {
                self.draw_mesh(ctx, &program, model, mesh, report);
            }
            program.unbind();
        }
    }

    /// Visible meshes grouped by shader, groups in order of first use.
    fn batches<'a>(&self, scene: &'a Scene, frustum: &Frustum, report: &mut RenderReport) -> Vec<ShaderBatch<'a>> {
        let mut batches: Vec<ShaderBatch<'a>> = Vec::new();
        for model in scene.models().iter().filter(|model| model.visible) {
            let transform = model.transform();
            for mesh in model.meshes().iter().filter(|mesh| mesh.visible) {
                if self.frustum_culling {
                    if let Some(bounds) = mesh.bounds() {
                        if !frustum.intersects_aabb(&bounds.transformed(&transform)) {
                            report.culled += 1;
                            continue;
                        }
                    }
                }

                let shader = mesh.material().shader_name();
                match batches.iter_mut().find(|batch| batch.shader == shader) {
                    Some(batch) => batch.items.push((model, mesh)),
                    None => batches.push(ShaderBatch {
                        shader,
                        items: vec![(model, mesh)],
                    }),
                }
            }
        }
        batches
    }

    fn draw_mesh(
        &self,
        ctx: &GraphicsContext,
        program: &Program,
        model: &Model,
        mesh: &Mesh,
        report: &mut RenderReport,
    ) {
        let vertex_array = mesh.vertex_array();
        if !vertex_array.is_drawable() {
            report.skip(Diagnostic::new(
                format!("mesh:{}", mesh.name()),
                "skipped, vertex array has no vertex or index data",
            ));
            return;
        }

        let material = mesh.material();
        material.bind(program);
        program.set_mat4("u_model_matrix", &model.transform());
        program.set_mat4("u_normal_matrix", &model.normal_matrix());

        vertex_array.bind();
        let outcome = ctx.draw_indexed(vertex_array);
        vertex_array.unbind();
        material.unbind();

        match outcome {
            Ok(()) => report.drawn += 1,
            Err(err) => report.skip(Diagnostic::new(format!("mesh:{}", mesh.name()), err.to_string())),
        }
    }
}

fn write_frame_uniforms(program: &Program, scene: &Scene, frame: &FrameUniforms) {
    program.set_mat4("u_view_proj_matrix", &frame.view_proj);
    program.set_vec3("u_viewer_position", frame.viewer_position);
    program.set_vec3("u_ambient_light", scene.ambient_light);

    for kind in LightKind::ALL {
        match scene.active_light(kind) {
            Some(light) => light.upload(program),
            None => Light::upload_disabled(kind, program),
        }
    }

    match &scene.fog {
        Some(fog) => {
            program.set_vec3("u_fog.color", fog.color);
            program.set_float("u_fog.density", fog.density);
            program.set_bool("u_fog.enabled", true);
        }
        None => program.set_bool("u_fog.enabled", false),
    }
}
