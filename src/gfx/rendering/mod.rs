//! Frame rendering
//!
//! [`MainRenderer`] runs the passes of a frame: the [`MeshRenderer`] draws
//! the scene's meshes grouped by shader, then the [`SkyboxRenderer`] fills
//! the background. Problems that skip a mesh are collected in the frame's
//! [`RenderReport`] instead of failing the frame.

pub mod frustum;
pub mod main_renderer;
pub mod mesh_renderer;
pub mod shaders;
pub mod skybox_renderer;

use crate::error::Diagnostic;

pub use frustum::Frustum;
pub use main_renderer::MainRenderer;
pub use mesh_renderer::{FrameUniforms, MeshRenderer};
pub use skybox_renderer::SkyboxRenderer;

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    /// Meshes drawn.
    pub drawn: u32,
    /// Meshes skipped because their program or vertex array was unusable.
    pub skipped: u32,
    /// Meshes outside the view frustum.
    pub culled: u32,
    pub skybox_drawn: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderReport {
    pub(crate) fn skip(&mut self, diagnostic: Diagnostic) {
        self.skipped += 1;
        self.diagnostics.push(diagnostic);
    }

    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::gfx::backend::{BackendCall, BindingSlot, BufferUsage, ClearState, HeadlessBackend};
    use crate::gfx::context::GraphicsContext;
    use crate::gfx::resources::{
        BufferElement, ElementType, IndexBuffer, SamplerState, Texture, TextureData, TextureFormat,
        VertexArray, VertexBuffer, VertexBufferLayout,
    };
    use crate::gfx::shader::Program;

    const QUAD_VS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}
"#;

    const QUAD_FS: &str = r#"
@group(1) @binding(0) var u_texture: texture_2d<f32>;
@group(1) @binding(1) var u_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(u_texture, u_sampler, frag.uv);
}
"#;

    #[test]
    fn test_textured_quad_issues_exactly_one_draw() {
        let backend = Rc::new(HeadlessBackend::new());
        let ctx = GraphicsContext::new(backend.clone());

        let layout = VertexBufferLayout::new(vec![
            BufferElement::new("a_position", ElementType::Float2, false),
            BufferElement::new("a_texcoord", ElementType::Float2, false),
        ]);
        #[rustfmt::skip]
        let vertices: [f32; 16] = [
            -0.5, -0.5, 0.0, 0.0,
             0.5, -0.5, 1.0, 0.0,
             0.5,  0.5, 1.0, 1.0,
            -0.5,  0.5, 0.0, 1.0,
        ];
        let vertex_buffer =
            VertexBuffer::from_vertices(&ctx, layout, BufferUsage::Static, &vertices).unwrap();
        let index_buffer = IndexBuffer::new(&ctx, BufferUsage::Static, &[0, 1, 2, 2, 3, 0]).unwrap();
        let quad = VertexArray::with_buffers(&ctx, Rc::new(vertex_buffer), Rc::new(index_buffer)).unwrap();

        let data = TextureData::from_raw(2, 2, TextureFormat::Rgba, vec![128; 16]);
        let texture = Texture::from_data(&ctx, "checker", &data, SamplerState::default()).unwrap();
        let program = Program::from_source(&ctx, "quad", QUAD_VS, QUAD_FS);
        assert!(program.is_valid(), "{:?}", program.info_log());

        ctx.begin_frame(ClearState::default()).unwrap();
        program.bind();
        texture.bind(0);
        program.set_int("u_texture", 0);
        quad.bind();
        assert_eq!(ctx.current_binding(BindingSlot::VertexArray), quad.handle());
        ctx.draw_indexed(&quad).unwrap();
        quad.unbind();
        texture.unbind(0);
        program.unbind();
        ctx.end_frame().unwrap();

        assert!(backend.take_errors().is_empty());
        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 6);
        assert_eq!(draws[0].textures.get(&0), Some(&texture.handle()));
        assert_eq!(
            backend
                .calls()
                .iter()
                .filter(|call| matches!(call, BackendCall::Draw(_)))
                .count(),
            1
        );
    }
}
