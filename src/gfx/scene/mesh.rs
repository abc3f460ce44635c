use std::fmt;
use std::rc::Rc;

use cgmath::{Matrix4, Point3, Transform, Vector3};

use crate::error::Result;
use crate::gfx::context::GraphicsContext;
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::VertexArray;

use super::material::Material;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vector3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vector3::new(a.x, a.y, a.z),
            Vector3::new(b.x, a.y, a.z),
            Vector3::new(a.x, b.y, a.z),
            Vector3::new(b.x, b.y, a.z),
            Vector3::new(a.x, a.y, b.z),
            Vector3::new(b.x, a.y, b.z),
            Vector3::new(a.x, b.y, b.z),
            Vector3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after `transform`.
    pub fn transformed(&self, transform: &Matrix4<f32>) -> Aabb {
        let mut corners = self
            .corners()
            .into_iter()
            .map(|c| transform.transform_point(Point3::new(c.x, c.y, c.z)));
        let first = match corners.next() {
            Some(p) => Vector3::new(p.x, p.y, p.z),
            None => return *self,
        };
        corners.fold(Aabb::new(first, first), |acc, p| Aabb {
            min: Vector3::new(acc.min.x.min(p.x), acc.min.y.min(p.y), acc.min.z.min(p.z)),
            max: Vector3::new(acc.max.x.max(p.x), acc.max.y.max(p.y), acc.max.z.max(p.z)),
        })
    }
}

/// A vertex array drawn with one material.
pub struct Mesh {
    name: String,
    vertex_array: Rc<VertexArray>,
    material: Rc<dyn Material>,
    bounds: Option<Aabb>,
    pub visible: bool,
}

impl Mesh {
    pub fn new(name: &str, vertex_array: Rc<VertexArray>, material: Rc<dyn Material>) -> Self {
        Self {
            name: name.to_string(),
            vertex_array,
            material,
            bounds: None,
            visible: true,
        }
    }

    /// Uploads generated geometry and keeps its bounds for culling.
    pub fn from_geometry(
        ctx: &GraphicsContext,
        name: &str,
        geometry: &GeometryData,
        material: Rc<dyn Material>,
    ) -> Result<Self> {
        let vertex_array = Rc::new(geometry.build_vertex_array(ctx)?);
        let mut mesh = Self::new(name, vertex_array, material);
        mesh.bounds = geometry.bounds().map(|(min, max)| Aabb::new(min, max));
        Ok(mesh)
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_array(&self) -> &Rc<VertexArray> {
        &self.vertex_array
    }

    pub fn material(&self) -> &Rc<dyn Material> {
        &self.material
    }

    pub fn set_material(&mut self, material: Rc<dyn Material>) {
        self.material = material;
    }

    /// Local-space bounds, `None` when unknown (never culled).
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("indices", &self.vertex_array.index_count())
            .field("material", &self.material.name())
            .field("visible", &self.visible)
            .finish()
    }
}
