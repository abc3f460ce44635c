//! # Primitive Shape Generation
//!
//! All shapes come with normals and texture coordinates.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3};

use super::GeometryData;
use crate::gfx::scene::vertex::Vertex3D;

/// Appends one quad facing `u x v`, centred on `center` with half extents
/// `u` and `v`.
fn push_face(data: &mut GeometryData, center: Vector3<f32>, u: Vector3<f32>, v: Vector3<f32>) {
    let normal: [f32; 3] = u.cross(v).normalize().into();
    let base = data.vertices.len() as u32;
    let corners = [
        (center - u - v, [0.0, 0.0]),
        (center + u - v, [1.0, 0.0]),
        (center + u + v, [1.0, 1.0]),
        (center - u + v, [0.0, 1.0]),
    ];
    for (position, uv) in corners {
        data.vertices.push(Vertex3D::new(position.into(), normal, uv));
    }
    data.indices
        .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}

/// Box centred at the origin: `width` along X, `depth` along Y, `height`
/// along Z. Each face has its own four vertices so normals stay flat.
pub fn create_box(width: f32, depth: f32, height: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let (hx, hy, hz) = (width * 0.5, depth * 0.5, height * 0.5);
    let x = Vector3::new(hx, 0.0, 0.0);
    let y = Vector3::new(0.0, hy, 0.0);
    let z = Vector3::new(0.0, 0.0, hz);

    push_face(&mut data, x, y, z); // +X
    push_face(&mut data, -x, -y, z); // -X
    push_face(&mut data, y, -x, z); // +Y
    push_face(&mut data, -y, x, z); // -Y
    push_face(&mut data, z, x, y); // +Z
    push_face(&mut data, -z, -x, y); // -Z

    data
}

/// Plane in the XY plane with its normal along +Z.
///
/// # Arguments
/// * `width` - Size along X
/// * `height` - Size along Y
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
pub fn create_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;
            data.vertices
                .push(Vertex3D::new([pos_x, pos_y, 0.0], [0.0, 0.0, 1.0], [u, v]));
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[i + 1, next_row + 1, next_row]);
        }
    }

    data
}

/// UV sphere centred at the origin with its poles on the Z axis.
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Number of segments around the Z axis (at least 3)
/// * `latitude_segments` - Number of segments from pole to pole (at least 2)
pub fn create_sphere(radius: f32, longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, sin_theta * sin_phi, cos_theta];
            let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
            let uv = [long as f32 / long_segs as f32, lat as f32 / lat_segs as f32];
            data.vertices.push(Vertex3D::new(position, normal, uv));
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            // Skip the zero-area triangles at the poles.
            if lat != 0 {
                data.indices.extend_from_slice(&[first, second, first + 1]);
            }
            if lat != lat_segs - 1 {
                data.indices.extend_from_slice(&[second, second + 1, first + 1]);
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::context::GraphicsContext;

    /// Every triangle winds counter-clockwise around its vertex normals.
    fn assert_outward_winding(data: &GeometryData) {
        for tri in data.indices.chunks_exact(3) {
            let p: Vec<Vector3<f32>> = tri
                .iter()
                .map(|&i| Vector3::from(data.vertices[i as usize].position))
                .collect();
            let face = (p[1] - p[0]).cross(p[2] - p[0]);
            let normal = Vector3::from(data.vertices[tri[0] as usize].normal);
            assert!(face.dot(normal) > 0.0, "triangle {:?} winds inwards", tri);
        }
    }

    #[test]
    fn test_box_counts_and_bounds() {
        let cube = create_box(2.0, 4.0, 6.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, Vector3::new(1.0, 2.0, 3.0));
        assert_outward_winding(&cube);
    }

    #[test]
    fn test_plane_winding() {
        let plane = create_plane(10.0, 10.0, 4, 2);
        assert_eq!(plane.vertex_count(), 5 * 3);
        assert_eq!(plane.triangle_count(), 4 * 2 * 2);
        assert_outward_winding(&plane);
    }

    #[test]
    fn test_sphere_normals_are_unit_and_outward() {
        let sphere = create_sphere(2.0, 16, 8);
        for v in &sphere.vertices {
            let n = Vector3::from(v.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
            assert!((Vector3::from(v.position).magnitude() - 2.0).abs() < 1e-4);
        }
        assert_eq!(sphere.triangle_count(), 16 * 8 * 2 - 2 * 16);
        assert_outward_winding(&sphere);
    }

    #[test]
    fn test_recomputed_normals_match_flat_plane() {
        let mut plane = create_plane(1.0, 1.0, 1, 1);
        for v in &mut plane.vertices {
            v.normal = [0.0; 3];
        }
        plane.compute_normals();
        assert!(plane.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_build_vertex_array() {
        let ctx = GraphicsContext::headless();
        let cube = create_box(1.0, 1.0, 1.0);
        let vertex_array = cube.build_vertex_array(&ctx).unwrap();
        assert_eq!(vertex_array.index_count(), 36);
        assert_eq!(vertex_array.attribute_count(), 3);
        assert!(vertex_array.is_drawable());
    }
}
