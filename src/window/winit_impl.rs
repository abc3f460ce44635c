use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window as NativeWindow, WindowId};

use crate::config::WindowConfig;
use crate::error::{GfxError, Result};
use crate::gfx::backend::WgpuBackend;
use crate::gfx::context::GraphicsContext;
use crate::input::{Action, InputEvent, Key, Modifiers, MouseButton};

use super::WindowImpl;

/// Pixel scroll deltas are reported in lines of this many pixels.
const PIXELS_PER_LINE: f32 = 40.0;

/// Event-loop side of the window: creates the native window on resume and
/// translates its events.
struct WinitState {
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Arc<NativeWindow>>,
    create_error: Option<String>,
    events: Vec<InputEvent>,
    modifiers: Modifiers,
    cursor: (f32, f32),
    closed: bool,
}

impl WinitState {
    fn push_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        let action = match (state, repeat) {
            (ElementState::Released, _) => Action::Release,
            (ElementState::Pressed, true) => Action::Repeat,
            (ElementState::Pressed, false) => Action::Press,
        };
        self.events.push(InputEvent::Key {
            key: translate_key(code),
            action,
            modifiers: self.modifiers,
        });
    }
}

impl ApplicationHandler for WinitState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = NativeWindow::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size);
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => self.create_error = Some(err.to_string()),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.closed = true,
            WindowEvent::Resized(size) => {
                self.size = size;
                self.events.push(InputEvent::Resize {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.modifiers = Modifiers {
                    shift: state.shift_key(),
                    control: state.control_key(),
                    alt: state.alt_key(),
                };
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.push_key(code, event.state, event.repeat);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                self.events.push(InputEvent::MouseMove {
                    x: self.cursor.0,
                    y: self.cursor.1,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.events.push(InputEvent::MouseButton {
                    button: translate_button(button),
                    action: match state {
                        ElementState::Pressed => Action::Press,
                        ElementState::Released => Action::Release,
                    },
                    x: self.cursor.0,
                    y: self.cursor.1,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x, y),
                    MouseScrollDelta::PixelDelta(position) => (
                        position.x as f32 / PIXELS_PER_LINE,
                        position.y as f32 / PIXELS_PER_LINE,
                    ),
                };
                self.events.push(InputEvent::Scroll { x, y });
            }
            _ => {}
        }
    }
}

/// A native window presenting through the wgpu backend. The event loop is
/// pumped once per [`WindowImpl::poll_events`] instead of owning the
/// program's control flow.
pub struct WinitWindow {
    // Declared before the native window so the surface goes first.
    ctx: GraphicsContext,
    state: WinitState,
    event_loop: EventLoop<()>,
}

impl WinitWindow {
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let mut event_loop = EventLoop::new().map_err(|err| GfxError::window(err.to_string()))?;
        let mut state = WinitState {
            title: config.title.clone(),
            size: PhysicalSize::new(config.width.max(1), config.height.max(1)),
            window: None,
            create_error: None,
            events: Vec::new(),
            modifiers: Modifiers::default(),
            cursor: (0.0, 0.0),
            closed: false,
        };

        // The native window is created on the first resume.
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut state) {
            return Err(GfxError::window(format!("event loop exited with code {}", code)));
        }
        if let Some(err) = state.create_error.take() {
            return Err(GfxError::window(err));
        }
        let window = state
            .window
            .clone()
            .ok_or_else(|| GfxError::window("platform did not resume the event loop"))?;

        let size = window.inner_size();
        let backend = pollster::block_on(WgpuBackend::new(
            Arc::clone(&window),
            size.width,
            size.height,
            config.vsync,
        ))?;
        let ctx = GraphicsContext::new(Rc::new(backend));

        Ok(Self {
            ctx,
            state,
            event_loop,
        })
    }

    pub fn native(&self) -> Option<&Arc<NativeWindow>> {
        self.state.window.as_ref()
    }
}

impl WindowImpl for WinitWindow {
    fn context(&self) -> &GraphicsContext {
        &self.ctx
    }

    fn size(&self) -> (u32, u32) {
        (self.state.size.width, self.state.size.height)
    }

    fn is_open(&self) -> bool {
        !self.state.closed
    }

    fn close(&mut self) {
        self.state.closed = true;
        if let Some(window) = &self.state.window {
            window.set_visible(false);
        }
    }

    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        if let PumpStatus::Exit(_) = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state) {
            self.state.closed = true;
        }
        events.append(&mut self.state.events);
    }

    fn set_title(&mut self, title: &str) {
        self.state.title = title.to_string();
        if let Some(window) = &self.state.window {
            window.set_title(title);
        }
    }
}

fn translate_key(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyR => Key::R,
        KeyCode::Space => Key::Space,
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ShiftLeft => Key::ShiftLeft,
        KeyCode::ShiftRight => Key::ShiftRight,
        KeyCode::ControlLeft => Key::ControlLeft,
        KeyCode::ControlRight => Key::ControlRight,
        KeyCode::AltLeft => Key::AltLeft,
        KeyCode::AltRight => Key::AltRight,
        KeyCode::Digit0 => Key::Digit(0),
        KeyCode::Digit1 => Key::Digit(1),
        KeyCode::Digit2 => Key::Digit(2),
        KeyCode::Digit3 => Key::Digit(3),
        KeyCode::Digit4 => Key::Digit(4),
        KeyCode::Digit5 => Key::Digit(5),
        KeyCode::Digit6 => Key::Digit(6),
        KeyCode::Digit7 => Key::Digit(7),
        KeyCode::Digit8 => Key::Digit(8),
        KeyCode::Digit9 => Key::Digit(9),
        // Unmapped keys all report as the same code.
        _ => Key::Other(0),
    }
}

fn translate_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Back => MouseButton::Other(3),
        winit::event::MouseButton::Forward => MouseButton::Other(4),
        winit::event::MouseButton::Other(id) => MouseButton::Other(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_translation() {
        assert_eq!(translate_key(KeyCode::KeyW), Key::W);
        assert_eq!(translate_key(KeyCode::Digit7), Key::Digit(7));
        assert_eq!(translate_key(KeyCode::F12), Key::Other(0));
        assert_eq!(translate_button(winit::event::MouseButton::Other(9)), MouseButton::Other(9));
    }

    #[test]
    fn test_repeat_and_release_actions() {
        let mut state = WinitState {
            title: String::new(),
            size: PhysicalSize::new(1, 1),
            window: None,
            create_error: None,
            events: Vec::new(),
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
            cursor: (0.0, 0.0),
            closed: false,
        };
        state.push_key(KeyCode::KeyA, ElementState::Pressed, false);
        state.push_key(KeyCode::KeyA, ElementState::Pressed, true);
        state.push_key(KeyCode::KeyA, ElementState::Released, false);
        let actions: Vec<Action> = state
            .events
            .iter()
            .map(|event| match event {
                InputEvent::Key { action, modifiers, .. } => {
                    assert!(modifiers.shift);
                    *action
                }
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(actions, vec![Action::Press, Action::Repeat, Action::Release]);
    }
}
