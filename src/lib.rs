//! loco
//!
//! A small real-time 3D rendering engine built on wgpu and winit: GPU
//! resource wrappers with explicit bind/unbind, WGSL shader programs with
//! named uniforms, name-keyed texture and shader caches, a scene of models,
//! materials and lights, camera controllers, and a renderer that draws the
//! scene between a window's `begin` and `end`.
//!
//! Everything runs on one thread. A [`gfx::context::GraphicsContext`] wraps
//! the backend chosen at startup: [`gfx::backend::WgpuBackend`] for a real
//! window, or the in-memory [`gfx::backend::HeadlessBackend`] used by the
//! tests.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod prelude;
pub mod window;

pub use app::Application;
pub use config::EngineConfig;
pub use error::{GfxError, Result};
