//! # Scene Module
//!
//! Renderable entities and the data the renderer consumes each frame.
//!
//! ## Key Components
//!
//! - [`Scene`] - Models, lights, ambient light, optional skybox and fog
//! - [`Model`] - An ordered list of [`Mesh`]es sharing one transform, loadable from OBJ
//! - [`Mesh`] - A vertex array drawn with one [`Material`]
//! - [`PhongMaterial`] / [`BasicMaterial`] - Materials that bind their own uniforms and textures
//! - [`Light`] - Directional, point and spot lights
//! - [`Vertex3D`] - Vertex format with position, normal and texture coordinates
//!
//! ## Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use cgmath::Vector3;
//! use loco::gfx::context::GraphicsContext;
//! use loco::gfx::geometry::create_box;
//! use loco::gfx::scene::{DirectionalLight, Mesh, Model, PhongMaterial, Scene};
//!
//! let ctx = GraphicsContext::headless();
//! let mut scene = Scene::new();
//! let mesh = Mesh::from_geometry(&ctx, "crate", &create_box(1.0, 1.0, 1.0), Rc::new(PhongMaterial::default()))?;
//! scene.add_model(Model::from_mesh(mesh));
//! scene.add_light(DirectionalLight::new(Vector3::new(-1.0, -1.0, -1.0)));
//! # Ok::<(), loco::error::GfxError>(())
//! ```

pub mod light;
pub mod material;
pub mod mesh;
pub mod model;
pub mod scene;
pub mod vertex;

pub use light::{Attenuation, DirectionalLight, Light, LightKind, PointLight, SpotLight};
pub use material::{BasicMaterial, Material, PhongMaterial, BASIC_SHADER, PHONG_SHADER};
pub use mesh::{Aabb, Mesh};
pub use model::Model;
pub use scene::{Fog, Scene};
pub use vertex::Vertex3D;
