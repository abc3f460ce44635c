//! Orbit controller: rotate around a target, pan it, dolly towards it
//!
//! The camera position is kept in spherical coordinates (radius, polar,
//! azimuth) around the target, measured in a frame where the camera's up
//! vector is +Y. Mouse input accumulates deltas; `update` applies them,
//! optionally damped so motion decays geometrically after input stops.

use std::f32::consts::{PI, TAU};
use std::fmt;

use cgmath::*;

use crate::input::{Action, Key, Modifiers, MouseButton};

use super::camera::{calculate_cartesian_eye_position, up_to_y, Camera, ProjectionType};
use super::controller::CameraController;

/// Keeps the polar angle strictly inside (0, PI).
const POLAR_EPSILON: f32 = 1e-6;
const MIN_RADIUS: f32 = 1e-4;
/// Pixels panned per arrow key press.
const KEY_PAN_PIXELS: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitState {
    Idle,
    Rotate,
    Pan,
    Dolly,
}

impl fmt::Display for OrbitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrbitState::Idle => "idle",
            OrbitState::Rotate => "rotate",
            OrbitState::Pan => "pan",
            OrbitState::Dolly => "dolly",
        };
        f.write_str(name)
    }
}

/// Tunables of the orbit controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConfig {
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update, in (0, 1].
    pub damping_factor: f32,

    pub enable_rotate: bool,
    pub rotate_speed: f32,
    pub enable_auto_rotate: bool,
    /// Full orbits per minute.
    pub auto_rotate_speed: f32,

    pub enable_zoom: bool,
    pub zoom_speed: f32,

    pub enable_pan: bool,
    pub pan_speed: f32,
    /// Pan in the screen plane instead of the plane orthogonal to up.
    pub screen_space_panning: bool,

    pub min_polar: f32,
    pub max_polar: f32,
    /// Azimuth limits; infinite bounds disable clamping.
    pub min_azimuth: f32,
    pub max_azimuth: f32,
    /// Wrap the azimuth into (-PI, PI] after each update.
    pub wrap_azimuth: bool,

    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            enable_rotate: true,
            rotate_speed: 1.0,
            enable_auto_rotate: false,
            auto_rotate_speed: 2.0,
            enable_zoom: true,
            zoom_speed: 1.0,
            enable_pan: true,
            pan_speed: 1.0,
            screen_space_panning: true,
            min_polar: 0.0,
            max_polar: PI,
            min_azimuth: f32::NEG_INFINITY,
            max_azimuth: f32::INFINITY,
            wrap_azimuth: false,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    polar: f32,
    azimuth: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius < f32::EPSILON {
            return Self {
                radius: 0.0,
                polar: 0.0,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbitController {
    pub config: OrbitConfig,
    enabled: bool,
    state: OrbitState,
    modifiers: Modifiers,

    spherical: Spherical,
    delta_polar: f32,
    delta_azimuth: f32,
    scale: f32,
    /// Pending pan, in viewport pixels.
    pan_pixels: Vector2<f32>,
    /// World-space pan still being damped out.
    pan_offset: Vector3<f32>,

    viewport: Vector2<f32>,
    rotate_start: Vector2<f32>,
    pan_start: Vector2<f32>,
    dolly_start: Vector2<f32>,
    /// Camera position written by the last update, to detect external moves.
    last_position: Option<Point3<f32>>,
}

impl OrbitController {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        Self::with_config(camera, width, height, OrbitConfig::default())
    }

    pub fn with_config(camera: &Camera, width: u32, height: u32, config: OrbitConfig) -> Self {
        let mut controller = Self {
            config,
            enabled: true,
            state: OrbitState::Idle,
            modifiers: Modifiers::default(),
            spherical: Spherical {
                radius: 1.0,
                polar: PI * 0.5,
                azimuth: 0.0,
            },
            delta_polar: 0.0,
            delta_azimuth: 0.0,
            scale: 1.0,
            pan_pixels: Vector2::zero(),
            pan_offset: Vector3::zero(),
            viewport: Vector2::new(1.0, 1.0),
            rotate_start: Vector2::zero(),
            pan_start: Vector2::zero(),
            dolly_start: Vector2::zero(),
            last_position: None,
        };
        controller.update_viewport(width, height);
        controller.sync_from_camera(camera);
        controller
    }

    pub fn state(&self) -> OrbitState {
        self.state
    }

    pub fn azimuth(&self) -> f32 {
        self.spherical.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.spherical.polar
    }

    pub fn radius(&self) -> f32 {
        self.spherical.radius
    }

    pub fn update_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vector2::new(width.max(1) as f32, height.max(1) as f32);
    }

    /// Rotates by `angle` radians around the up axis on the next update.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_azimuth -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_polar -= angle;
    }

    pub fn dolly_in(&mut self, factor: f32) {
        self.scale *= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        self.scale /= factor;
    }

    /// Pans by a viewport-pixel offset on the next update.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_pixels += Vector2::new(dx, dy);
    }

    /// Drops all pending motion.
    pub fn stop(&mut self) {
        self.delta_azimuth = 0.0;
        self.delta_polar = 0.0;
        self.scale = 1.0;
        self.pan_pixels = Vector2::zero();
        self.pan_offset = Vector3::zero();
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.config.zoom_speed)
    }

    fn polar_range(&self) -> (f32, f32) {
        let min = self.config.min_polar.max(POLAR_EPSILON);
        let max = self.config.max_polar.min(PI - POLAR_EPSILON).max(min);
        (min, max)
    }

    fn sync_from_camera(&mut self, camera: &Camera) {
        let offset = up_to_y(camera.up()).rotate_vector(camera.position() - camera.target());
        self.spherical = Spherical::from_offset(offset);
        let (min, max) = self.polar_range();
        self.spherical.polar = self.spherical.polar.clamp(min, max);
    }

    /// World-space displacement of the target for a pixel offset.
    fn pan_to_world(&self, camera: &Camera, pixels: Vector2<f32>) -> Vector3<f32> {
        let (right, camera_up) = camera.basis();
        let data = camera.proj_data();
        let (dx, dy) = match data.projection {
            ProjectionType::Perspective => {
                let half_fov = Deg(data.fov * 0.5);
                let target_distance = (camera.position() - camera.target()).magnitude() * Rad::from(half_fov).0.tan();
                (
                    2.0 * pixels.x * target_distance / self.viewport.y,
                    2.0 * pixels.y * target_distance / self.viewport.y,
                )
            }
            ProjectionType::Orthographic => (
                pixels.x * data.width / self.viewport.x,
                pixels.y * data.height / self.viewport.y,
            ),
        };
        let up = if self.config.screen_space_panning {
            camera_up
        } else {
            camera.up().cross(right).normalize()
        };
        -right * dx + up * dy
    }
}

impl CameraController for OrbitController {
    fn on_key(&mut self, key: Key, action: Action, modifiers: Modifiers) {
        self.modifiers = modifiers;
        match key {
            Key::ShiftLeft | Key::ShiftRight => self.modifiers.shift = action.is_down(),
            Key::ControlLeft | Key::ControlRight => self.modifiers.control = action.is_down(),
            _ => {}
        }
        if !action.is_down() || !self.config.enable_pan {
            return;
        }
        match key {
            Key::Up => self.pan(0.0, KEY_PAN_PIXELS),
            Key::Down => self.pan(0.0, -KEY_PAN_PIXELS),
            Key::Left => self.pan(KEY_PAN_PIXELS, 0.0),
            Key::Right => self.pan(-KEY_PAN_PIXELS, 0.0),
            _ => {}
        }
    }

    fn on_mouse_button(&mut self, button: MouseButton, action: Action, x: f32, y: f32) {
        let position = Vector2::new(x, y);
        if !action.is_down() {
            self.state = OrbitState::Idle;
            return;
        }

        let pan_modifier = self.modifiers.shift || self.modifiers.control;
        self.state = match button {
            MouseButton::Left if pan_modifier && self.config.enable_pan => OrbitState::Pan,
            MouseButton::Left if self.config.enable_rotate => OrbitState::Rotate,
            MouseButton::Middle if self.config.enable_zoom => OrbitState::Dolly,
            MouseButton::Right if self.config.enable_pan => OrbitState::Pan,
            _ => OrbitState::Idle,
        };
        match self.state {
            OrbitState::Rotate => self.rotate_start = position,
            OrbitState::Pan => self.pan_start = position,
            OrbitState::Dolly => self.dolly_start = position,
            OrbitState::Idle => {}
        }
    }

    fn on_mouse_move(&mut self, x: f32, y: f32) {
        let position = Vector2::new(x, y);
        match self.state {
            OrbitState::Rotate => {
                let delta = (position - self.rotate_start) * self.config.rotate_speed;
                self.rotate_left(TAU * delta.x / self.viewport.y);
                self.rotate_up(TAU * delta.y / self.viewport.y);
                self.rotate_start = position;
            }
            OrbitState::Pan => {
                let delta = (position - self.pan_start) * self.config.pan_speed;
                self.pan(delta.x, delta.y);
                self.pan_start = position;
            }
            OrbitState::Dolly => {
                let delta = position - self.dolly_start;
                if delta.y > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if delta.y < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
                self.dolly_start = position;
            }
            OrbitState::Idle => {}
        }
    }

    fn on_scroll(&mut self, _x_offset: f32, y_offset: f32) {
        if !self.config.enable_zoom || self.state != OrbitState::Idle {
            return;
        }
        if y_offset > 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if y_offset < 0.0 {
            self.dolly_out(self.zoom_scale());
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.update_viewport(width, height);
    }

    fn update(&mut self, camera: &mut Camera, dt: f32) {
        if !self.enabled {
            return;
        }
        if self.last_position != Some(camera.position()) {
            self.sync_from_camera(camera);
        }

        if self.config.enable_auto_rotate && self.state == OrbitState::Idle {
            self.rotate_left(TAU / 60.0 * self.config.auto_rotate_speed * dt);
        }

        let cfg = self.config;
        let step = if cfg.enable_damping {
            cfg.damping_factor.clamp(f32::EPSILON, 1.0)
        } else {
            1.0
        };

        self.spherical.azimuth += self.delta_azimuth * step;
        self.spherical.polar += self.delta_polar * step;

        if cfg.wrap_azimuth {
            // Into (-PI, PI].
            self.spherical.azimuth = PI - (PI - self.spherical.azimuth).rem_euclid(TAU);
        }
        if cfg.min_azimuth.is_finite() || cfg.max_azimuth.is_finite() {
            self.spherical.azimuth = self
                .spherical
                .azimuth
                .clamp(cfg.min_azimuth, cfg.max_azimuth.max(cfg.min_azimuth));
        }
        let (min_polar, max_polar) = self.polar_range();
        self.spherical.polar = self.spherical.polar.clamp(min_polar, max_polar);

        if self.scale != 1.0 {
            match camera.projection_type() {
                ProjectionType::Perspective => {
                    let min = cfg.min_distance.max(MIN_RADIUS);
                    let max = cfg.max_distance.max(min);
                    self.spherical.radius = (self.spherical.radius * self.scale).clamp(min, max);
                }
                ProjectionType::Orthographic => {
                    let mut data = camera.proj_data();
                    data.width *= self.scale;
                    data.height *= self.scale;
                    camera.set_projection_data(data);
                }
            }
        }
        self.spherical.radius = self.spherical.radius.max(MIN_RADIUS);

        if self.pan_pixels != Vector2::zero() {
            self.pan_offset += self.pan_to_world(camera, self.pan_pixels);
            self.pan_pixels = Vector2::zero();
        }
        let target = camera.target() + self.pan_offset * step;

        let offset = calculate_cartesian_eye_position(
            self.spherical.polar,
            self.spherical.azimuth,
            self.spherical.radius,
        );
        let offset = up_to_y(camera.up()).invert().rotate_vector(offset);
        camera.set_target(target);
        camera.set_position(target + offset);
        self.last_position = Some(camera.position());

        if cfg.enable_damping {
            self.delta_azimuth *= 1.0 - step;
            self.delta_polar *= 1.0 - step;
            self.pan_offset *= 1.0 - step;
        } else {
            self.delta_azimuth = 0.0;
            self.delta_polar = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.state = OrbitState::Idle;
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::ProjectionData;

    fn z_up_camera() -> Camera {
        Camera::new(
            Point3::new(5.0, 5.0, 5.0),
            Point3::origin(),
            Vector3::unit_z(),
            ProjectionData::default(),
        )
    }

    #[test]
    fn test_initial_update_keeps_camera_in_place() {
        let mut camera = z_up_camera();
        let mut controller = OrbitController::new(&camera, 800, 600);
        controller.update(&mut camera, 1.0 / 60.0);
        assert!((camera.position() - Point3::new(5.0, 5.0, 5.0)).magnitude() < 1e-4);
        assert!((controller.radius() - 75f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_damping_converges_monotonically() {
        let mut camera = z_up_camera();
        let mut controller = OrbitController::new(&camera, 800, 600);
        let start = controller.azimuth();
        controller.rotate_left(-0.5);
        let goal = start + 0.5;

        let mut previous = controller.azimuth();
        for _ in 0..200 {
            controller.update(&mut camera, 1.0 / 60.0);
            let azimuth = controller.azimuth();
            assert!(azimuth >= previous, "azimuth went backwards");
            assert!(azimuth <= goal + 1e-5, "azimuth overshot");
            previous = azimuth;
        }
        assert!((goal - previous).abs() < 1e-3);
    }

    #[test]
    fn test_without_damping_delta_applies_at_once() {
        let mut camera = z_up_camera();
        let config = OrbitConfig {
            enable_damping: false,
            ..Default::default()
        };
        let mut controller = OrbitController::with_config(&camera, 800, 600, config);
        let start = controller.polar();
        controller.rotate_up(0.25);
        controller.update(&mut camera, 1.0 / 60.0);
        assert!((controller.polar() - (start - 0.25)).abs() < 1e-5);
    }

    #[test]
    fn test_polar_is_clamped_to_open_interval() {
        let mut camera = z_up_camera();
        let config = OrbitConfig {
            enable_damping: false,
            ..Default::default()
        };
        let mut controller = OrbitController::with_config(&camera, 800, 600, config);
        controller.rotate_up(10.0);
        controller.update(&mut camera, 0.0);
        assert!(controller.polar() > 0.0);
        controller.rotate_up(-20.0);
        controller.update(&mut camera, 0.0);
        assert!(controller.polar() < PI);
        assert!(camera.view_matrix().x.x.is_finite());
    }

    #[test]
    fn test_scroll_dollies_towards_target() {
        let mut camera = z_up_camera();
        let config = OrbitConfig {
            enable_damping: false,
            min_distance: 8.0,
            ..Default::default()
        };
        let mut controller = OrbitController::with_config(&camera, 800, 600, config);
        let radius = controller.radius();
        controller.on_scroll(0.0, 1.0);
        controller.update(&mut camera, 0.0);
        assert!(controller.radius() < radius);
        assert!(controller.radius() >= 8.0);

        for _ in 0..100 {
            controller.on_scroll(0.0, 1.0);
            controller.update(&mut camera, 0.0);
        }
        assert!((controller.radius() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_orthographic_dolly_scales_frustum() {
        let mut camera = z_up_camera();
        camera.set_projection_type(ProjectionType::Orthographic);
        let width = camera.proj_data().width;
        let mut controller = OrbitController::new(&camera, 800, 600);
        let radius = controller.radius();
        controller.on_scroll(0.0, 1.0);
        controller.update(&mut camera, 0.0);
        assert!(camera.proj_data().width < width);
        assert!((controller.radius() - radius).abs() < 1e-4);
    }

    #[test]
    fn test_mouse_drag_states() {
        let camera = z_up_camera();
        let mut controller = OrbitController::new(&camera, 800, 600);
        controller.on_mouse_button(MouseButton::Left, Action::Press, 10.0, 10.0);
        assert_eq!(controller.state(), OrbitState::Rotate);
        controller.on_mouse_button(MouseButton::Left, Action::Release, 10.0, 10.0);
        assert_eq!(controller.state(), OrbitState::Idle);

        controller.on_key(Key::ShiftLeft, Action::Press, Modifiers::default());
        controller.on_mouse_button(MouseButton::Left, Action::Press, 10.0, 10.0);
        assert_eq!(controller.state(), OrbitState::Pan);
    }

    #[test]
    fn test_pan_moves_target_and_position_together() {
        let mut camera = z_up_camera();
        let config = OrbitConfig {
            enable_damping: false,
            ..Default::default()
        };
        let mut controller = OrbitController::with_config(&camera, 800, 600, config);
        let offset = camera.position() - camera.target();
        controller.pan(100.0, 0.0);
        controller.update(&mut camera, 0.0);
        assert!(camera.target().to_vec().magnitude() > 0.1);
        assert!(((camera.position() - camera.target()) - offset).magnitude() < 1e-3);
    }

    #[test]
    fn test_auto_rotate_advances_azimuth() {
        let mut camera = z_up_camera();
        let config = OrbitConfig {
            enable_damping: false,
            enable_auto_rotate: true,
            ..Default::default()
        };
        let mut controller = OrbitController::with_config(&camera, 800, 600, config);
        let start = controller.azimuth();
        controller.update(&mut camera, 1.0);
        assert!((controller.azimuth() - start).abs() > 0.1);
    }
}
