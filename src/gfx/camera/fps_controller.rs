use std::collections::HashSet;

use cgmath::*;

use crate::input::{Action, Key, Modifiers, MouseButton};

use super::camera::{up_to_y, Camera};
use super::controller::CameraController;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsConfig {
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub look_sensitivity: f32,
    /// Pitch limit in degrees, kept below 90 so the view never flips.
    pub max_pitch: f32,
    /// Speed multiplier while shift is held.
    pub sprint_factor: f32,
}

impl Default for FpsConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            look_sensitivity: 0.15,
            max_pitch: 89.0,
            sprint_factor: 3.0,
        }
    }
}

/// Free-flying camera: WASD moves, Q/E go down/up, dragging with the left
/// mouse button looks around.
#[derive(Debug, Clone)]
pub struct FpsController {
    pub config: FpsConfig,
    enabled: bool,
    held: HashSet<Key>,
    looking: bool,
    last_cursor: Option<Vector2<f32>>,
    /// Yaw/pitch in degrees; pending mouse motion is folded in on update.
    yaw: f32,
    pitch: f32,
    look_delta: Vector2<f32>,
    synced: bool,
}

impl FpsController {
    pub fn new(camera: &Camera) -> Self {
        Self::with_config(camera, FpsConfig::default())
    }

    pub fn with_config(camera: &Camera, config: FpsConfig) -> Self {
        let mut controller = Self {
            config,
            enabled: true,
            held: HashSet::new(),
            looking: false,
            last_cursor: None,
            yaw: 0.0,
            pitch: 0.0,
            look_delta: Vector2::zero(),
            synced: false,
        };
        controller.sync_from_camera(camera);
        controller
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    fn sync_from_camera(&mut self, camera: &Camera) {
        let front = up_to_y(camera.up()).rotate_vector(camera.front());
        self.yaw = Deg::from(Rad(front.x.atan2(front.z))).0;
        self.pitch = Deg::from(Rad(front.y.clamp(-1.0, 1.0).asin())).0;
        self.synced = true;
    }

    /// Unit view direction in world space for the current yaw/pitch.
    fn front(&self, camera: &Camera) -> Vector3<f32> {
        let (yaw, pitch) = (Rad::from(Deg(self.yaw)).0, Rad::from(Deg(self.pitch)).0);
        let local = Vector3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos());
        up_to_y(camera.up()).invert().rotate_vector(local).normalize()
    }

    fn axis(&self, positive: Key, negative: Key) -> f32 {
        let mut value = 0.0;
        if self.held.contains(&positive) {
            value += 1.0;
        }
        if self.held.contains(&negative) {
            value -= 1.0;
        }
        value
    }
}

impl CameraController for FpsController {
    fn on_key(&mut self, key: Key, action: Action, _modifiers: Modifiers) {
        if action.is_down() {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    fn on_mouse_button(&mut self, button: MouseButton, action: Action, x: f32, y: f32) {
        if button == MouseButton::Left {
            self.looking = action.is_down();
            self.last_cursor = Some(Vector2::new(x, y));
        }
    }

    fn on_mouse_move(&mut self, x: f32, y: f32) {
        let cursor = Vector2::new(x, y);
        if self.looking {
            if let Some(last) = self.last_cursor {
                self.look_delta += cursor - last;
            }
        }
        self.last_cursor = Some(cursor);
    }

    fn update(&mut self, camera: &mut Camera, dt: f32) {
        if !self.enabled {
            return;
        }
        if !self.synced {
            self.sync_from_camera(camera);
        }

        let max_pitch = self.config.max_pitch.clamp(0.0, 89.9);
        self.yaw -= self.look_delta.x * self.config.look_sensitivity;
        self.pitch = (self.pitch - self.look_delta.y * self.config.look_sensitivity).clamp(-max_pitch, max_pitch);
        self.look_delta = Vector2::zero();

        let front = self.front(camera);
        let up = camera.up();
        let right = front.cross(up).normalize();

        let mut speed = self.config.move_speed * dt;
        if self.held.contains(&Key::ShiftLeft) || self.held.contains(&Key::ShiftRight) {
            speed *= self.config.sprint_factor;
        }
        let motion = front * self.axis(Key::W, Key::S)
            + right * self.axis(Key::D, Key::A)
            + up * self.axis(Key::E, Key::Q);

        let position = camera.position() + motion * speed;
        camera.set_position(position);
        camera.set_target(position + front);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.held.clear();
            self.looking = false;
            self.look_delta = Vector2::zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::ProjectionData;

    fn camera() -> Camera {
        Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::origin(),
            Vector3::unit_y(),
            ProjectionData::default(),
        )
    }

    #[test]
    fn test_sync_keeps_view_direction() {
        let mut camera = camera();
        let mut controller = FpsController::new(&camera);
        controller.update(&mut camera, 0.0);
        assert!((camera.front() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
        assert!((camera.position() - Point3::new(0.0, 0.0, 5.0)).magnitude() < 1e-6);
    }

    #[test]
    fn test_w_moves_forward() {
        let mut camera = camera();
        let mut controller = FpsController::new(&camera);
        controller.on_key(Key::W, Action::Press, Modifiers::default());
        controller.update(&mut camera, 1.0);
        assert!((camera.position().z - 0.0).abs() < 1e-4);

        controller.on_key(Key::W, Action::Release, Modifiers::default());
        controller.update(&mut camera, 1.0);
        assert!(camera.position().z.abs() < 1e-4);
    }

    #[test]
    fn test_pitch_is_limited() {
        let mut camera = camera();
        let mut controller = FpsController::new(&camera);
        controller.on_mouse_button(MouseButton::Left, Action::Press, 0.0, 0.0);
        controller.on_mouse_move(0.0, -10_000.0);
        controller.update(&mut camera, 0.0);
        assert!(controller.pitch() <= 89.0 + 1e-4);
        assert!(camera.view_matrix().x.x.is_finite());
    }
}
