//! Built-in shader sources
//!
//! The Phong stages share one file of struct declarations, prepended at
//! load time so the uniform block is identical in both stages.

use crate::gfx::shader::ShaderSources;

pub const PHONG_COMMON: &str = include_str!("shaders/phong_common.wgsl");
pub const PHONG_VERTEX: &str = include_str!("shaders/phong_vs.wgsl");
pub const PHONG_FRAGMENT: &str = include_str!("shaders/phong_fs.wgsl");

pub const BASIC_VERTEX: &str = include_str!("shaders/basic_vs.wgsl");
pub const BASIC_FRAGMENT: &str = include_str!("shaders/basic_fs.wgsl");

pub const SKYBOX_VERTEX: &str = include_str!("shaders/skybox_vs.wgsl");
pub const SKYBOX_FRAGMENT: &str = include_str!("shaders/skybox_fs.wgsl");

/// Name under which the skybox program is registered.
pub const SKYBOX_SHADER: &str = "skybox";

pub fn phong_sources() -> ShaderSources {
    ShaderSources::new(
        format!("{}\n{}", PHONG_COMMON, PHONG_VERTEX),
        format!("{}\n{}", PHONG_COMMON, PHONG_FRAGMENT),
    )
}

pub fn basic_sources() -> ShaderSources {
    ShaderSources::new(BASIC_VERTEX, BASIC_FRAGMENT)
}

pub fn skybox_sources() -> ShaderSources {
    ShaderSources::new(SKYBOX_VERTEX, SKYBOX_FRAGMENT)
}
