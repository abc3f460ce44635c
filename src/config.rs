//! Engine configuration
//!
//! Plain structs with defaults and `with_*` builders. [`EngineConfig::from_env`]
//! applies the `LOCO_BACKEND` and `LOCO_RESOURCES` overrides on top of the
//! defaults.

use std::path::{Path, PathBuf};

use crate::gfx::backend::BackendKind;
use crate::logging::LoggingConfig;

pub const BACKEND_ENV: &str = "LOCO_BACKEND";
pub const RESOURCES_ENV: &str = "LOCO_RESOURCES";

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub backend: BackendKind,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub clear_color: [f32; 4],
    /// Close the window after this many frames. Mostly useful headless.
    pub max_frames: Option<u64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            title: "loco".to_string(),
            width: 1024,
            height: 768,
            vsync: true,
            clear_color: [0.1, 0.2, 0.3, 1.0],
            max_frames: None,
        }
    }
}

impl WindowConfig {
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Where images and shader sources are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub root: PathBuf,
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self::new("resources")
    }
}

impl ResourcePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn shaders(&self) -> PathBuf {
        self.root.join("shaders")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    pub frustum_culling: bool,
    pub draw_skybox: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            draw_skybox: true,
        }
    }
}

impl RendererConfig {
    pub fn with_frustum_culling(mut self, enabled: bool) -> Self {
        self.frustum_culling = enabled;
        self
    }

    pub fn with_skybox(mut self, enabled: bool) -> Self {
        self.draw_skybox = enabled;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub resources: ResourcePaths,
    pub renderer: RendererConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Defaults with the environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_resources(mut self, resources: ResourcePaths) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(BACKEND_ENV) {
            match value.parse::<BackendKind>() {
                Ok(backend) => self.window.backend = backend,
                Err(err) => log::warn!("ignoring {}: {}", BACKEND_ENV, err),
            }
        }
        if let Some(root) = lookup(RESOURCES_ENV).filter(|root| !root.trim().is_empty()) {
            self.resources = ResourcePaths::new(root);
        }
        self
    }
}
