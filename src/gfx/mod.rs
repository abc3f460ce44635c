//! # Graphics Module
//!
//! The rendering core, leaf-first:
//!
//! - **Backend** ([`backend`]) - The [`backend::Backend`] trait with the wgpu and headless implementations
//! - **Context** ([`context`]) - Liveness and the frame boundary around one backend
//! - **Resources** ([`resources`]) - Buffers, vertex arrays, textures, cube maps and framebuffers
//! - **Shaders** ([`shader`]) - WGSL programs with reflected, name-addressed uniforms
//! - **Assets** ([`assets`]) - Texture and shader caches keyed by name
//! - **Geometry** ([`geometry`]) - Box, plane and sphere generators
//! - **Scene** ([`scene`]) - Models, meshes, materials, lights, fog and skybox
//! - **Camera** ([`camera`]) - Camera and the fixed, FPS and orbit controllers
//! - **Rendering** ([`rendering`]) - Mesh and skybox passes driven by the main renderer
//!
//! ## Usage
//!
//! ```no_run
//! use loco::gfx::assets::ShaderManager;
//! use loco::gfx::backend::ClearState;
//! use loco::gfx::camera::Camera;
//! use loco::gfx::context::GraphicsContext;
//! use loco::gfx::rendering::MainRenderer;
//! use loco::gfx::scene::Scene;
//!
//! let ctx = GraphicsContext::headless();
//! let mut shaders = ShaderManager::new(&ctx, "resources/shaders");
//! let mut renderer = MainRenderer::new(&ctx, Default::default())?;
//! let report = renderer.render_frame(&Scene::new(), &Camera::default(), &mut shaders, ClearState::default())?;
//! assert_eq!(report.drawn, 0);
//! # Ok::<(), loco::GfxError>(())
//! ```

pub mod assets;
pub mod backend;
pub mod camera;
pub mod context;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shader;
