//! # Textured Quad Example
//!
//! Draws one textured quad with the resource wrappers directly: a vertex
//! buffer with position and texture coordinates, an index buffer, a
//! checkerboard texture and a small WGSL program. No scene or renderer is
//! involved.
//!
//! ## Usage:
//! ```bash
//! cargo run --example textured_quad
//! ```

use std::rc::Rc;

use loco::prelude::*;

const VERTEX_SHADER: &str = r#"
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

const FRAGMENT_SHADER: &str = r#"
struct Uniforms {
    u_tint: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> u: Uniforms;

@group(1) @binding(0) var u_texture: texture_2d<f32>;
@group(1) @binding(1) var u_texture_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(u_texture, u_texture_sampler, frag.uv);
    return vec4<f32>(texel.rgb * u.u_tint, texel.a);
}
"#;

fn checkerboard(size: u32, cells: u32) -> TextureData {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x * cells / size) + (y * cells / size)) % 2 == 0;
            let value = if light { 230 } else { 40 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    TextureData::from_raw(size, size, TextureFormat::Rgba, pixels)
}

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    init_logging(config.logging.clone());
    let mut window = Window::new(&config.window.clone().with_title("loco - textured quad"))?;
    let ctx = window.context().clone();

    let layout = VertexBufferLayout::new(vec![
        BufferElement::new("a_position", ElementType::Float2, false),
        BufferElement::new("a_texcoord", ElementType::Float2, false),
    ]);
    #[rustfmt::skip]
    let vertices: [f32; 16] = [
        -0.6, -0.6, 0.0, 1.0,
         0.6, -0.6, 1.0, 1.0,
         0.6,  0.6, 1.0, 0.0,
        -0.6,  0.6, 0.0, 0.0,
    ];
    let vertex_buffer = VertexBuffer::from_vertices(&ctx, layout, BufferUsage::Static, &vertices)?;
    let index_buffer = IndexBuffer::new(&ctx, BufferUsage::Static, &[0, 1, 2, 2, 3, 0])?;
    let quad = VertexArray::with_buffers(&ctx, Rc::new(vertex_buffer), Rc::new(index_buffer))?;

    let texture = Texture::from_data(&ctx, "checkerboard", &checkerboard(256, 8), SamplerState::nearest())?;
    let program = Program::from_source(&ctx, "textured_quad", VERTEX_SHADER, FRAGMENT_SHADER);
    if !program.is_valid() {
        anyhow::bail!("shader failed to link: {}", program.info_log().unwrap_or("no log"));
    }

    let mut t: f32 = 0.0;
    while window.active() {
        if window.input().is_key_down(Key::Escape) {
            window.request_close();
        }
        t += 1.0 / 60.0;

        window.begin()?;
        program.bind();
        program.set_vec3("u_tint", Vector3::new(1.0, 0.6 + 0.4 * t.sin().abs(), 0.8));
        texture.bind(0);
        program.set_int("u_texture", 0);
        quad.bind();
        ctx.draw_indexed(&quad)?;
        quad.unbind();
        texture.unbind(0);
        program.unbind();
        window.end()?;
    }
    Ok(())
}
