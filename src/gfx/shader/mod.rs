//! Shader programs and uniform values.

pub mod program;
pub mod reflect;

use std::path::Path;

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::error::{GfxError, Result};

pub use program::Program;
pub use reflect::{ProgramLayout, UniformKind};

/// WGSL source text for each stage of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    /// Accepted for completeness; linking a program with a geometry stage
    /// always fails.
    pub geometry: Option<String>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Reads the stage sources from disk.
    pub fn from_files(
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
        geometry: Option<&Path>,
    ) -> Result<Self> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| GfxError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        Ok(Self {
            vertex: read(vertex.as_ref())?,
            fragment: read(fragment.as_ref())?,
            geometry: geometry.map(read).transpose()?,
        })
    }
}

/// Backend-resolved location of a named uniform inside one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// A typed uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Uint(u32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<u32> for UniformValue {
    fn from(value: u32) -> Self {
        UniformValue::Uint(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(value as i32)
    }
}

impl From<Vector2<f32>> for UniformValue {
    fn from(value: Vector2<f32>) -> Self {
        UniformValue::Vec2(value.into())
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        UniformValue::Vec3(value.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        UniformValue::Vec4(value.into())
    }
}

impl From<Matrix3<f32>> for UniformValue {
    fn from(value: Matrix3<f32>) -> Self {
        UniformValue::Mat3(value.into())
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        UniformValue::Mat4(value.into())
    }
}
