use std::path::Path;
use std::rc::Rc;

use cgmath::{Deg, Matrix, Matrix4, SquareMatrix, Vector3};

use crate::error::{GfxError, Result};
use crate::gfx::assets::TextureManager;
use crate::gfx::context::GraphicsContext;
use crate::gfx::geometry::GeometryData;

use super::material::{Material, PhongMaterial};
use super::mesh::{Aabb, Mesh};
use super::vertex::Vertex3D;

/// An ordered list of meshes sharing one model transform.
#[derive(Debug)]
pub struct Model {
    name: String,
    meshes: Vec<Mesh>,
    transform: Matrix4<f32>,
    pub visible: bool,
}

impl Model {
    pub fn new(name: &str, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.to_string(),
            meshes,
            transform: Matrix4::identity(),
            visible: true,
        }
    }

    pub fn from_mesh(mesh: Mesh) -> Self {
        let name = mesh.name().to_string();
        Self::new(&name, vec![mesh])
    }

    /// Loads a Wavefront OBJ file. Materials from the MTL library become
    /// Phong materials; their texture maps are resolved relative to the OBJ
    /// file through `textures`. Missing normals are computed from the faces.
    pub fn from_obj(
        ctx: &GraphicsContext,
        path: impl AsRef<Path>,
        textures: &mut TextureManager,
    ) -> Result<Self> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| GfxError::Model {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("{}: no usable MTL ({}), using the default material", path.display(), err);
            Vec::new()
        });

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let phong: Vec<Rc<dyn Material>> = materials
            .iter()
            .enumerate()
            .map(|(i, mtl)| Rc::new(phong_from_mtl(i, mtl, base_dir, textures)) as Rc<dyn Material>)
            .collect();
        let fallback: Rc<dyn Material> = Rc::new(PhongMaterial::default());

        let mut meshes = Vec::with_capacity(models.len());
        for (i, model) in models.iter().enumerate() {
            let name = if model.name.is_empty() {
                format!("mesh_{}", i)
            } else {
                model.name.clone()
            };
            if model.mesh.indices.is_empty() {
                log::warn!("{}: mesh '{}' has no faces, skipped", path.display(), name);
                continue;
            }

            let geometry = geometry_from_obj(&model.mesh);
            let material = model
                .mesh
                .material_id
                .and_then(|id| phong.get(id))
                .cloned()
                .unwrap_or_else(|| Rc::clone(&fallback));
            meshes.push(Mesh::from_geometry(ctx, &name, &geometry, material)?);
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::info!(
            "loaded model '{}': {} meshes, {} materials",
            name,
            meshes.len(),
            phong.len()
        );
        Ok(Self::new(&name, meshes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn transform(&self) -> Matrix4<f32> {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.w.truncate()
    }

    /// Set translation
    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation);
    }

    /// Apply translation (multiplies with existing transform)
    pub fn translate(&mut self, translation: Vector3<f32>) {
        self.transform = self.transform * Matrix4::from_translation(translation);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.transform = Matrix4::from_scale(scale);
    }

    pub fn set_scale_xyz(&mut self, scale: Vector3<f32>) {
        self.transform = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
    }

    pub fn set_rotation_x(&mut self, angle: Deg<f32>) {
        self.transform = Matrix4::from_angle_x(angle);
    }

    pub fn set_rotation_y(&mut self, angle: Deg<f32>) {
        self.transform = Matrix4::from_angle_y(angle);
    }

    pub fn set_rotation_z(&mut self, angle: Deg<f32>) {
        self.transform = Matrix4::from_angle_z(angle);
    }

    pub fn rotate_x(&mut self, angle: Deg<f32>) {
        self.transform = self.transform * Matrix4::from_angle_x(angle);
    }

    pub fn rotate_y(&mut self, angle: Deg<f32>) {
        self.transform = self.transform * Matrix4::from_angle_y(angle);
    }

    pub fn rotate_z(&mut self, angle: Deg<f32>) {
        self.transform = self.transform * Matrix4::from_angle_z(angle);
    }

    /// Translation, rotation about Z (the up axis) and uniform scale, applied
    /// as T * R * S.
    pub fn set_transform_trs(&mut self, translation: Vector3<f32>, rotation_z: Deg<f32>, scale: f32) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_z(rotation_z);
        let s = Matrix4::from_scale(scale);
        self.transform = t * r * s;
    }

    pub fn reset_transform(&mut self) {
        self.transform = Matrix4::identity();
    }

    /// Inverse transpose of the model transform, for normals. Falls back to
    /// identity for singular transforms.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        self.transform
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity)
    }

    /// Union of the mesh bounds in world space; `None` if no mesh has bounds.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .filter_map(|mesh| mesh.bounds())
            .map(|bounds| bounds.transformed(&self.transform))
            .reduce(|a, b| {
                Aabb::new(
                    Vector3::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y), a.min.z.min(b.min.z)),
                    Vector3::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y), a.max.z.max(b.max.z)),
                )
            })
    }
}

fn phong_from_mtl(
    index: usize,
    mtl: &tobj::Material,
    base_dir: &Path,
    textures: &mut TextureManager,
) -> PhongMaterial {
    let name = if mtl.name.is_empty() {
        format!("material_{}", index)
    } else {
        mtl.name.clone()
    };
    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let mut material = PhongMaterial::new(
        &name,
        mtl.ambient.unwrap_or(diffuse).into(),
        diffuse.into(),
        mtl.specular.unwrap_or([0.5, 0.5, 0.5]).into(),
        mtl.shininess.unwrap_or(32.0),
    );

    let mut map = |file: &Option<String>| {
        file.as_deref()
            .filter(|file| !file.trim().is_empty())
            .map(|file| textures.get_cached_texture(&base_dir.join(file.trim()).to_string_lossy()))
    };
    material.set_albedo_map(map(&mtl.diffuse_texture));
    material.set_specular_map(map(&mtl.specular_texture));
    material.set_normal_map(map(&mtl.normal_texture));
    material
}

fn geometry_from_obj(mesh: &tobj::Mesh) -> GeometryData {
    let count = mesh.positions.len() / 3;
    let has_normals = !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len();
    let has_uvs = !mesh.texcoords.is_empty() && mesh.texcoords.len() / 2 == count;

    let vertices = (0..count)
        .map(|i| {
            let p = &mesh.positions[3 * i..3 * i + 3];
            let normal = if has_normals {
                [mesh.normals[3 * i], mesh.normals[3 * i + 1], mesh.normals[3 * i + 2]]
            } else {
                [0.0; 3]
            };
            // OBJ puts v = 0 at the bottom of the image; texture rows start at the top.
            let uv = if has_uvs {
                [mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1]]
            } else {
                [0.0; 2]
            };
            Vertex3D::new([p[0], p[1], p[2]], normal, uv)
        })
        .collect();

    let mut data = GeometryData {
        vertices,
        indices: mesh.indices.clone(),
    };
    if !has_normals {
        data.compute_normals();
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::test_support::{scratch_dir, write_png};
    use crate::gfx::geometry::create_box;

    const QUAD_OBJ: &str = "mtllib quad.mtl
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl red
f 1/1 2/2 3/3 4/4
";

    const QUAD_MTL: &str = "newmtl red
Ka 0.1 0.0 0.0
Kd 0.8 0.1 0.1
Ks 0.5 0.5 0.5
Ns 16
map_Kd red.png
";

    #[test]
    fn test_obj_with_material_and_texture() {
        let dir = scratch_dir("obj");
        std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();
        std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();
        write_png(&dir.join("red.png"), 2, 2, [255, 0, 0, 255]);

        let ctx = GraphicsContext::headless();
        let mut textures = TextureManager::new(&ctx, &dir);
        let model = Model::from_obj(&ctx, dir.join("quad.obj"), &mut textures).unwrap();

        assert_eq!(model.name(), "quad");
        assert_eq!(model.meshes().len(), 1);
        let mesh = &model.meshes()[0];
        assert_eq!(mesh.vertex_array().index_count(), 6);
        assert_eq!(mesh.material().name(), "red");
        assert!(mesh.material().describe().contains("shininess 16.0"));
        assert!(mesh.material().describe().contains("red.png"));
        assert_eq!(mesh.bounds().unwrap().max, Vector3::new(1.0, 1.0, 0.0));
        assert!(textures.diagnostics().is_empty());
        assert_eq!(textures.len(), 1);
    }

    #[test]
    fn test_obj_normals_are_computed() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let data = geometry_from_obj(&mesh);
        assert_eq!(data.vertex_count(), 3);
        assert!(data.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!(data.vertices.iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn test_missing_texture_is_recorded() {
        let dir = scratch_dir("obj-missing-tex");
        std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();
        std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();

        let ctx = GraphicsContext::headless();
        let mut textures = TextureManager::new(&ctx, &dir);
        let model = Model::from_obj(&ctx, dir.join("quad.obj"), &mut textures).unwrap();
        assert_eq!(model.meshes().len(), 1);
        assert_eq!(textures.diagnostics().len(), 1);
    }

    #[test]
    fn test_missing_obj_is_an_error() {
        let ctx = GraphicsContext::headless();
        let mut textures = TextureManager::new(&ctx, ".");
        let err = Model::from_obj(&ctx, "/no/such/model.obj", &mut textures).unwrap_err();
        assert!(matches!(err, GfxError::Model { .. }));
    }

    #[test]
    fn test_transform_ops_and_world_bounds() {
        let ctx = GraphicsContext::headless();
        let mesh = Mesh::from_geometry(
            &ctx,
            "cube",
            &create_box(2.0, 2.0, 2.0),
            Rc::new(PhongMaterial::default()),
        )
        .unwrap();
        let mut model = Model::from_mesh(mesh);
        assert_eq!(model.name(), "cube");

        model.set_translation(Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(model.position(), Vector3::new(5.0, 0.0, 0.0));
        let bounds = model.world_bounds().unwrap();
        assert_eq!(bounds.min, Vector3::new(4.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vector3::new(6.0, 1.0, 1.0));

        model.set_scale(2.0);
        assert_eq!(model.world_bounds().unwrap().max, Vector3::new(2.0, 2.0, 2.0));
        let n = model.normal_matrix();
        assert!((n.x.x - 0.5).abs() < 1e-6);

        model.reset_transform();
        assert_eq!(model.transform(), Matrix4::identity());
    }
}
