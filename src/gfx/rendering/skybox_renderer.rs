use std::rc::Rc;

use cgmath::{Matrix4, Vector4};

use crate::error::{Diagnostic, Result};
use crate::gfx::assets::ShaderManager;
use crate::gfx::backend::BufferUsage;
use crate::gfx::camera::camera::up_to_y;
use crate::gfx::camera::Camera;
use crate::gfx::context::GraphicsContext;
use crate::gfx::resources::{
    BufferElement, ElementType, IndexBuffer, TextureCube, VertexArray, VertexBuffer,
    VertexBufferLayout,
};

use super::shaders::SKYBOX_SHADER;
use super::RenderReport;

const SKYBOX_UNIT: u32 = 0;

#[rustfmt::skip]
const CUBE_POSITIONS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],
    [-1.0, -1.0,  1.0], [1.0, -1.0,  1.0], [1.0, 1.0,  1.0], [-1.0, 1.0,  1.0],
];

/// Faces wound counter-clockwise as seen from inside the cube.
#[rustfmt::skip]
const CUBE_INDICES: [u32; 36] = [
    0, 1, 2, 2, 3, 0, // -Z
    4, 7, 6, 6, 5, 4, // +Z
    0, 3, 7, 7, 4, 0, // -X
    1, 5, 6, 6, 2, 1, // +X
    0, 4, 5, 5, 1, 0, // -Y
    3, 2, 6, 6, 7, 3, // +Y
];

/// Draws a cube map around the camera, behind everything else.
pub struct SkyboxRenderer {
    cube: VertexArray,
}

impl SkyboxRenderer {
    pub fn new(ctx: &GraphicsContext) -> Result<Self> {
        let layout = VertexBufferLayout::new(vec![BufferElement::new(
            "a_position",
            ElementType::Float3,
            false,
        )]);
        let vertices = VertexBuffer::from_vertices(ctx, layout, BufferUsage::Static, &CUBE_POSITIONS)?;
        let indices = IndexBuffer::new(ctx, BufferUsage::Static, &CUBE_INDICES)?;
        let cube = VertexArray::with_buffers(ctx, Rc::new(vertices), Rc::new(indices))?;
        Ok(Self { cube })
    }

    /// View-projection with the camera translation removed, so the cube
    /// stays centred on the eye.
    pub fn view_projection(ctx: &GraphicsContext, camera: &Camera) -> Matrix4<f32> {
        let mut view = camera.view_matrix();
        view.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
        ctx.clip_correction() * camera.projection_matrix() * view
    }

    pub fn render(
        &self,
        ctx: &GraphicsContext,
        camera: &Camera,
        skybox: &TextureCube,
        shaders: &mut ShaderManager,
        report: &mut RenderReport,
    ) {
        if !skybox.is_valid() {
            report.diagnostics.push(Diagnostic::new(
                format!("skybox:{}", skybox.name()),
                "skipped, cube map is invalid",
            ));
            return;
        }
        let program = shaders.get_cached_program(SKYBOX_SHADER);
        if !program.is_valid() {
            report.diagnostics.push(Diagnostic::new(
                format!("skybox:{}", skybox.name()),
                format!("skipped, program '{}' is invalid", SKYBOX_SHADER),
            ));
            return;
        }

        program.bind();
        program.set_mat4("u_view_proj_matrix", &Self::view_projection(ctx, camera));
        program.set_mat4("u_orientation", &Matrix4::from(up_to_y(camera.up())));
        skybox.bind(SKYBOX_UNIT);
        program.set_int("u_skybox", SKYBOX_UNIT as i32);

        self.cube.bind();
        let outcome = ctx.draw_indexed(&self.cube);
        self.cube.unbind();
        skybox.unbind(SKYBOX_UNIT);
        program.unbind();

        match outcome {
            Ok(()) => report.skybox_drawn = true,
            Err(err) => report
                .diagnostics
                .push(Diagnostic::new(format!("skybox:{}", skybox.name()), err.to_string())),
        }
    }
}

impl std::fmt::Debug for SkyboxRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyboxRenderer").field("cube", &self.cube).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    #[test]
    fn test_faces_wind_inwards() {
        for tri in CUBE_INDICES.chunks_exact(3) {
            let p: Vec<Vector3<f32>> = tri.iter().map(|&i| Vector3::from(CUBE_POSITIONS[i as usize])).collect();
            let face = (p[1] - p[0]).cross(p[2] - p[0]);
            let centroid = (p[0] + p[1] + p[2]) / 3.0;
            assert!(face.dot(centroid) < 0.0, "triangle {:?} faces outwards", tri);
        }
    }

    #[test]
    fn test_view_projection_ignores_translation() {
        let ctx = GraphicsContext::headless();
        let mut camera = Camera::default();
        let before = SkyboxRenderer::view_projection(&ctx, &camera);
        let offset = Vector3::new(10.0, -3.0, 2.0);
        camera.set_position(camera.position() + offset);
        camera.set_target(camera.target() + offset);
        let after = SkyboxRenderer::view_projection(&ctx, &camera);
        for (a, b) in [(before.x, after.x), (before.y, after.y), (before.z, after.z), (before.w, after.w)] {
            assert!((a - b).magnitude() < 1e-4);
        }
    }
}
