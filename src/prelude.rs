//! # loco Prelude
//!
//! The types most applications and demos need, in one import.
//!
//! ```no_run
//! use loco::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = Application::new(EngineConfig::from_env())?;
//!     let ctx = app.context().clone();
//!     let mesh = Mesh::from_geometry(&ctx, "ball", &create_sphere(1.0, 32, 16), std::rc::Rc::new(PhongMaterial::default()))?;
//!     app.scene_mut().add_model(Model::from_mesh(mesh));
//!     app.scene_mut().add_light(DirectionalLight::new(Vector3::new(-1.0, -1.0, -1.0)));
//!     app.run(|_, _| {})?;
//!     Ok(())
//! }
//! ```

// Application and configuration
pub use crate::app::Application;
pub use crate::config::{EngineConfig, RendererConfig, ResourcePaths, WindowConfig};
pub use crate::error::{Diagnostic, GfxError};
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::window::Window;

// Input
pub use crate::input::{Action, InputEvent, InputManager, Key, Modifiers, MouseButton};

// Graphics
pub use crate::gfx::assets::{ShaderManager, TextureManager};
pub use crate::gfx::backend::{BackendKind, BufferUsage, ClearState};
pub use crate::gfx::camera::{
    Camera, CameraController, CameraControllerKind, FixedController, FpsController, OrbitController,
    ProjectionData, ProjectionType,
};
pub use crate::gfx::context::GraphicsContext;
pub use crate::gfx::geometry::{create_box, create_plane, create_sphere, GeometryData};
pub use crate::gfx::rendering::{MainRenderer, RenderReport};
pub use crate::gfx::resources::{
    BufferElement, ElementType, IndexBuffer, SamplerState, Texture, TextureCube, TextureData,
    TextureFilter, TextureFormat, TextureWrap, VertexArray, VertexBuffer, VertexBufferLayout,
};
pub use crate::gfx::scene::{
    BasicMaterial, DirectionalLight, Fog, Light, Material, Mesh, Model, PhongMaterial, PointLight,
    Scene, SpotLight,
};
pub use crate::gfx::shader::{Program, ShaderSources};

// Math
pub use cgmath::{Deg, InnerSpace, Point3, Vector3, Zero};
