use std::fmt;

use cgmath::*;

const MIN_EXTENT: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionType::Perspective => write!(f, "perspective"),
            ProjectionType::Orthographic => write!(f, "orthographic"),
        }
    }
}

/// Parameters for both projection kinds. Only the ones matching
/// `projection` are used, the others are kept so switching back and forth
/// does not lose state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionData {
    pub projection: ProjectionType,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Orthographic frustum size.
    pub width: f32,
    pub height: f32,
}

impl Default for ProjectionData {
    fn default() -> Self {
        Self {
            projection: ProjectionType::Perspective,
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            width: 20.0,
            height: 20.0,
        }
    }
}

impl ProjectionData {
    /// Pulls every parameter back into a range that yields an invertible
    /// projection matrix.
    pub fn sanitized(mut self) -> Self {
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        let defaults = Self::default();

        self.fov = finite_or(self.fov, defaults.fov).clamp(0.01, 179.0);
        self.aspect = finite_or(self.aspect, defaults.aspect).max(MIN_EXTENT);
        self.near = finite_or(self.near, defaults.near).max(MIN_EXTENT);
        self.far = finite_or(self.far, defaults.far).max(self.near * (1.0 + 1e-3) + MIN_EXTENT);
        self.width = finite_or(self.width, defaults.width).max(MIN_EXTENT);
        self.height = finite_or(self.height, defaults.height).max(MIN_EXTENT);
        self
    }
}

/// Look-at camera with a switchable projection.
///
/// Matrices are produced in the OpenGL clip convention (NDC z in [-1, 1]);
/// the renderer applies the backend's clip correction on top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Point3<f32>,
    target: Point3<f32>,
    up: Vector3<f32>,
    proj_data: ProjectionData,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::origin(),
            Vector3::unit_y(),
            ProjectionData::default(),
        )
    }
}

impl Camera {
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        proj_data: ProjectionData,
    ) -> Self {
        let mut camera = Self {
            position,
            target,
            up: Vector3::unit_y(),
            proj_data: proj_data.sanitized(),
        };
        camera.set_up(up);
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
    }

    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// Zero or non-finite vectors are ignored.
    pub fn set_up(&mut self, up: Vector3<f32>) {
        if up.magnitude2() > f32::EPSILON && up.x.is_finite() && up.y.is_finite() && up.z.is_finite() {
            self.up = up.normalize();
        }
    }

    /// Unit vector from the position towards the target.
    pub fn front(&self) -> Vector3<f32> {
        let dir = self.target - self.position;
        if dir.magnitude2() > f32::EPSILON * f32::EPSILON {
            dir.normalize()
        } else {
            // Degenerate position == target: look down the up frame's -z.
            -any_perpendicular(self.up)
        }
    }

    pub fn proj_data(&self) -> ProjectionData {
        self.proj_data
    }

    pub fn set_projection_data(&mut self, data: ProjectionData) {
        self.proj_data = data.sanitized();
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.proj_data.projection
    }

    pub fn set_projection_type(&mut self, projection: ProjectionType) {
        if self.proj_data.projection != projection {
            log::debug!("camera projection: {} -> {}", self.proj_data.projection, projection);
        }
        self.proj_data.projection = projection;
    }

    /// Updates the aspect ratio and keeps the orthographic frustum's height,
    /// widening it to the new aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let aspect = width as f32 / height as f32;
        let mut data = self.proj_data;
        data.aspect = aspect;
        data.width = data.height * aspect;
        self.set_projection_data(data);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let front = self.front();
        let mut up = self.up;
        if front.cross(up).magnitude2() < 1e-8 {
            up = any_perpendicular(front);
        }
        Matrix4::look_to_rh(self.position, front, up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let data = &self.proj_data;
        match data.projection {
            ProjectionType::Perspective => perspective(Deg(data.fov), data.aspect, data.near, data.far),
            ProjectionType::Orthographic => {
                let (hw, hh) = (data.width * 0.5, data.height * 0.5);
                ortho(-hw, hw, -hh, hh, data.near, data.far)
            }
        }
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Camera basis `(right, up)` in world space.
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let view = self.view_matrix();
        // Rows of the view rotation are the camera axes.
        let right = Vector3::new(view.x.x, view.y.x, view.z.x);
        let up = Vector3::new(view.x.y, view.y.y, view.z.y);
        (right, up)
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Camera(position: ({:.2}, {:.2}, {:.2}), target: ({:.2}, {:.2}, {:.2}), projection: {})",
            self.position.x,
            self.position.y,
            self.position.z,
            self.target.x,
            self.target.y,
            self.target.z,
            self.proj_data.projection
        )
    }
}

fn any_perpendicular(v: Vector3<f32>) -> Vector3<f32> {
    let axis = if v.x.abs() < 0.9 { Vector3::unit_x() } else { Vector3::unit_y() };
    v.cross(axis).normalize()
}

/// Rotation taking `up` onto +Y, so spherical coordinates can always be
/// computed in a Y-up frame.
pub(crate) fn up_to_y(up: Vector3<f32>) -> Quaternion<f32> {
    Quaternion::from_arc(up.normalize(), Vector3::unit_y(), Some(Vector3::unit_x()))
}

/// Point on a sphere around `target` in a Y-up frame; `polar` is measured
/// from +Y, `azimuth` around it starting at +Z.
pub(crate) fn calculate_cartesian_eye_position(polar: f32, azimuth: f32, radius: f32) -> Vector3<f32> {
    Vector3::new(
        radius * polar.sin() * azimuth.sin(),
        radius * polar.cos(),
        radius * polar.sin() * azimuth.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ndc_z(proj: Matrix4<f32>, view_z: f32) -> f32 {
        let clip = proj * Vector4::new(0.0, 0.0, view_z, 1.0);
        clip.z / clip.w
    }

    fn test_camera() -> Camera {
        Camera::new(
            Point3::new(5.0, 5.0, 5.0),
            Point3::origin(),
            Vector3::unit_z(),
            ProjectionData {
                fov: 45.0,
                aspect: 1024.0 / 768.0,
                near: 0.1,
                far: 1000.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_perspective_is_invertible_and_maps_planes() {
        let camera = test_camera();
        let proj = camera.projection_matrix();

        assert!(proj.determinant().abs() > 0.0);
        assert!(proj.invert().is_some());
        assert!((ndc_z(proj, -0.1) + 1.0).abs() < 1e-4);
        assert!((ndc_z(proj, -1000.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_projection_switch_keeps_view() {
        let mut camera = test_camera();
        let view = camera.view_matrix();
        let persp = camera.projection_matrix();

        camera.set_projection_type(ProjectionType::Orthographic);
        assert_eq!(camera.view_matrix(), view);
        assert_ne!(camera.projection_matrix(), persp);
        assert!(camera.projection_matrix().invert().is_some());

        camera.set_projection_type(ProjectionType::Perspective);
        assert_eq!(camera.projection_matrix(), persp);
    }

    #[test]
    fn test_degenerate_parameters_are_sanitized() {
        let mut camera = test_camera();
        camera.set_projection_data(ProjectionData {
            fov: 0.0,
            aspect: 0.0,
            near: 0.0,
            far: 0.0,
            width: 0.0,
            height: f32::NAN,
            ..camera.proj_data()
        });
        assert!(camera.projection_matrix().invert().is_some());
        camera.set_projection_type(ProjectionType::Orthographic);
        assert!(camera.projection_matrix().invert().is_some());
    }

    #[test]
    fn test_view_looks_at_target() {
        let camera = test_camera();
        let target_in_view = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        // The target sits on the view axis in front of the camera.
        assert!(target_in_view.x.abs() < 1e-5);
        assert!(target_in_view.y.abs() < 1e-5);
        assert!((target_in_view.z + 75f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_resize_keeps_ortho_height() {
        let mut camera = test_camera();
        camera.resize(1600, 800);
        let data = camera.proj_data();
        assert_eq!(data.aspect, 2.0);
        assert_eq!(data.width, data.height * 2.0);
    }

    #[test]
    fn test_spherical_round_trip_in_y_up_frame() {
        let eye = calculate_cartesian_eye_position(std::f32::consts::FRAC_PI_2, 0.0, 2.0);
        assert!((eye - Vector3::new(0.0, 0.0, 2.0)).magnitude() < 1e-6);

        let q = up_to_y(Vector3::unit_z());
        let rotated = q.rotate_vector(Vector3::unit_z());
        assert!((rotated - Vector3::unit_y()).magnitude() < 1e-6);
    }
}
