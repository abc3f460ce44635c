use crate::input::{Action, InputEvent, Key, Modifiers, MouseButton};

use super::camera::Camera;
use super::fps_controller::FpsController;
use super::orbit_controller::OrbitController;

/// Operations every camera controller supports. Controllers only accumulate
/// input in the event handlers; the camera is touched in [`update`].
///
/// [`update`]: CameraController::update
pub trait CameraController {
    fn on_key(&mut self, _key: Key, _action: Action, _modifiers: Modifiers) {}

    fn on_mouse_button(&mut self, _button: MouseButton, _action: Action, _x: f32, _y: f32) {}

    fn on_mouse_move(&mut self, _x: f32, _y: f32) {}

    fn on_scroll(&mut self, _x_offset: f32, _y_offset: f32) {}

    fn on_resize(&mut self, _width: u32, _height: u32) {}

    /// Applies the accumulated input to `camera`; `dt` is in seconds.
    fn update(&mut self, camera: &mut Camera, dt: f32);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Routes an event to the matching handler, unless disabled.
    fn handle_event(&mut self, event: &InputEvent) {
        if !self.is_enabled() {
            return;
        }
        match *event {
            InputEvent::Key {
                key,
                action,
                modifiers,
            } => self.on_key(key, action, modifiers),
            InputEvent::MouseButton {
                button,
                action,
                x,
                y,
            } => self.on_mouse_button(button, action, x, y),
            InputEvent::MouseMove { x, y } => self.on_mouse_move(x, y),
            InputEvent::Scroll { x, y } => self.on_scroll(x, y),
            InputEvent::Resize { width, height } => self.on_resize(width, height),
        }
    }
}

/// Controller that never moves the camera.
#[derive(Debug, Clone)]
pub struct FixedController {
    enabled: bool,
}

impl Default for FixedController {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CameraController for FixedController {
    fn update(&mut self, _camera: &mut Camera, _dt: f32) {}

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// The available controllers. Match on the variant to reach its tunables.
#[derive(Debug, Clone)]
pub enum CameraControllerKind {
    Fixed(FixedController),
    Fps(FpsController),
    Orbit(OrbitController),
}

impl CameraControllerKind {
    pub fn fixed() -> Self {
        CameraControllerKind::Fixed(FixedController::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            CameraControllerKind::Fixed(_) => "fixed",
            CameraControllerKind::Fps(_) => "fps",
            CameraControllerKind::Orbit(_) => "orbit",
        }
    }

    fn inner(&self) -> &dyn CameraController {
        match self {
            CameraControllerKind::Fixed(c) => c,
            CameraControllerKind::Fps(c) => c,
            CameraControllerKind::Orbit(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn CameraController {
        match self {
            CameraControllerKind::Fixed(c) => c,
            CameraControllerKind::Fps(c) => c,
            CameraControllerKind::Orbit(c) => c,
        }
    }
}

impl From<FpsController> for CameraControllerKind {
    fn from(controller: FpsController) -> Self {
        CameraControllerKind::Fps(controller)
    }
}

impl From<OrbitController> for CameraControllerKind {
    fn from(controller: OrbitController) -> Self {
        CameraControllerKind::Orbit(controller)
    }
}

impl CameraController for CameraControllerKind {
    fn on_key(&mut self, key: Key, action: Action, modifiers: Modifiers) {
        self.inner_mut().on_key(key, action, modifiers);
    }

    fn on_mouse_button(&mut self, button: MouseButton, action: Action, x: f32, y: f32) {
        self.inner_mut().on_mouse_button(button, action, x, y);
    }

    fn on_mouse_move(&mut self, x: f32, y: f32) {
        self.inner_mut().on_mouse_move(x, y);
    }

    fn on_scroll(&mut self, x_offset: f32, y_offset: f32) {
        self.inner_mut().on_scroll(x_offset, y_offset);
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.inner_mut().on_resize(width, height);
    }

    fn update(&mut self, camera: &mut Camera, dt: f32) {
        self.inner_mut().update(camera, dt);
    }

    fn is_enabled(&self) -> bool {
        self.inner().is_enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.inner_mut().set_enabled(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_controller_leaves_camera_alone() {
        let mut camera = Camera::default();
        let before = camera;
        let mut controller = CameraControllerKind::fixed();
        controller.handle_event(&InputEvent::Scroll { x: 0.0, y: 3.0 });
        controller.update(&mut camera, 1.0 / 60.0);
        assert_eq!(camera, before);
        assert_eq!(controller.name(), "fixed");
    }

    #[test]
    fn test_disabled_controller_ignores_events() {
        let mut camera = Camera::default();
        let before = camera;
        let mut controller: CameraControllerKind = OrbitController::new(&camera, 800, 600).into();
        controller.set_enabled(false);
        controller.handle_event(&InputEvent::Scroll { x: 0.0, y: 5.0 });
        controller.update(&mut camera, 1.0 / 60.0);
        assert_eq!(camera.position(), before.position());
    }
}
