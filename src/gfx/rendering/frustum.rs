//! View frustum for culling.

use cgmath::{InnerSpace, Matrix, Matrix4, Vector3, Vector4};

use crate::gfx::scene::Aabb;

/// Six inward-facing planes `(normal, d)` with `dot(normal, p) + d >= 0`
/// for points inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vector4<f32>; 6],
}

impl Frustum {
    /// Extracts the planes of an OpenGL-convention view-projection matrix
    /// (clip z in `[-w, w]`).
    pub fn from_matrix(view_proj: &Matrix4<f32>) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(|plane| {
            let length = plane.truncate().magnitude();
            if length > f32::EPSILON {
                plane / length
            } else {
                plane
            }
        });
        Self { planes }
    }

    pub fn contains_point(&self, point: Vector3<f32>) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }

    /// Conservative box test: may report boxes near a frustum corner as
    /// visible, never hides a visible one.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let farthest = Vector3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            normal.dot(farthest) + plane.w >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::Camera;
    use cgmath::Point3;

    fn camera_down_negative_z() -> Camera {
        Camera::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Vector3::unit_y(),
            Default::default(),
        )
    }

    #[test]
    fn test_box_in_front_is_visible() {
        let frustum = Frustum::from_matrix(&camera_down_negative_z().view_projection_matrix());
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -11.0), Vector3::new(1.0, 1.0, -9.0));
        assert!(frustum.intersects_aabb(&aabb));
        assert!(frustum.contains_point(Vector3::new(0.0, 0.0, -10.0)));
    }

    #[test]
    fn test_box_behind_or_beyond_far_is_culled() {
        let frustum = Frustum::from_matrix(&camera_down_negative_z().view_projection_matrix());
        let behind = Aabb::new(Vector3::new(-1.0, -1.0, 9.0), Vector3::new(1.0, 1.0, 11.0));
        assert!(!frustum.intersects_aabb(&behind));

        let far_away = Aabb::new(Vector3::new(-1.0, -1.0, -2001.0), Vector3::new(1.0, 1.0, -1999.0));
        assert!(!frustum.intersects_aabb(&far_away));

        let off_to_the_side = Aabb::new(Vector3::new(500.0, -1.0, -11.0), Vector3::new(502.0, 1.0, -9.0));
        assert!(!frustum.intersects_aabb(&off_to_the_side));
    }

    #[test]
    fn test_box_straddling_near_plane_is_visible() {
        let frustum = Frustum::from_matrix(&camera_down_negative_z().view_projection_matrix());
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        assert!(frustum.intersects_aabb(&aabb));
    }
}
