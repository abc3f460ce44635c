//! Windows and the frame boundary
//!
//! A [`Window`] owns the graphics context and brackets every frame with
//! [`Window::begin`] and [`Window::end`]. `begin` polls the platform for
//! events, folds them into the [`InputManager`], runs the registered
//! callbacks and then starts the frame; `end` finishes and presents it.
//! The platform side sits behind [`WindowImpl`], chosen once from
//! [`WindowConfig::backend`].

mod headless;
mod winit_impl;

pub use headless::HeadlessWindow;
pub use winit_impl::WinitWindow;

use std::fmt;

use crate::config::WindowConfig;
use crate::error::Result;
use crate::gfx::backend::{BackendKind, ClearState};
use crate::gfx::context::GraphicsContext;
use crate::input::{Action, InputEvent, InputManager, Key, Modifiers, MouseButton};

/// Platform half of a window.
pub trait WindowImpl {
    fn context(&self) -> &GraphicsContext;

    /// Framebuffer size in pixels.
    fn size(&self) -> (u32, u32);

    /// False once the platform window has been closed.
    fn is_open(&self) -> bool;

    fn close(&mut self);

    /// Appends the events that arrived since the last call.
    fn poll_events(&mut self, events: &mut Vec<InputEvent>);

    fn set_title(&mut self, _title: &str) {}
}

pub type KeyboardCallback = Box<dyn FnMut(Key, Action, Modifiers)>;
pub type MouseButtonCallback = Box<dyn FnMut(MouseButton, Action, f32, f32)>;
pub type MouseMoveCallback = Box<dyn FnMut(f32, f32)>;
pub type ScrollCallback = Box<dyn FnMut(f32, f32)>;
pub type ResizeCallback = Box<dyn FnMut(u32, u32)>;

#[derive(Default)]
struct Callbacks {
    keyboard: Vec<KeyboardCallback>,
    mouse_button: Vec<MouseButtonCallback>,
    mouse_move: Vec<MouseMoveCallback>,
    scroll: Vec<ScrollCallback>,
    resize: Vec<ResizeCallback>,
}

impl Callbacks {
    fn dispatch(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key {
                key,
                action,
                modifiers,
            } => self
                .keyboard
                .iter_mut()
                .for_each(|callback| callback(key, action, modifiers)),
            InputEvent::MouseButton {
                button,
                action,
                x,
                y,
            } => self
                .mouse_button
                .iter_mut()
                .for_each(|callback| callback(button, action, x, y)),
            InputEvent::MouseMove { x, y } => self.mouse_move.iter_mut().for_each(|callback| callback(x, y)),
            InputEvent::Scroll { x, y } => self.scroll.iter_mut().for_each(|callback| callback(x, y)),
            InputEvent::Resize { width, height } => self
                .resize
                .iter_mut()
                .for_each(|callback| callback(width, height)),
        }
    }
}

pub struct Window {
    inner: Box<dyn WindowImpl>,
    input: InputManager,
    callbacks: Callbacks,
    pending: Vec<InputEvent>,
    /// Events handled by the latest `begin`.
    events: Vec<InputEvent>,
    clear: ClearState,
    max_frames: Option<u64>,
    frames: u64,
    close_requested: bool,
}

impl Window {
    /// Opens a window with the backend named in `config`.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let inner: Box<dyn WindowImpl> = match config.backend {
            BackendKind::Headless => Box::new(HeadlessWindow::new(config.width, config.height)),
            BackendKind::Wgpu => Box::new(WinitWindow::new(config)?),
        };
        Ok(Self::from_impl(inner, config))
    }

    pub fn from_impl(inner: Box<dyn WindowImpl>, config: &WindowConfig) -> Self {
        log::info!(
            "window '{}' opened ({}x{}, {} backend)",
            config.title,
            inner.size().0,
            inner.size().1,
            inner.context().kind()
        );
        Self {
            inner,
            input: InputManager::new(),
            callbacks: Callbacks::default(),
            pending: Vec::new(),
            events: Vec::new(),
            clear: ClearState {
                color: config.clear_color,
                ..ClearState::default()
            },
            max_frames: config.max_frames,
            frames: 0,
            close_requested: false,
        }
    }

    pub fn context(&self) -> &GraphicsContext {
        self.inner.context()
    }

    pub fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    pub fn aspect(&self) -> f32 {
        let (width, height) = self.size();
        width.max(1) as f32 / height.max(1) as f32
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Events delivered during the latest [`Window::begin`].
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_title(&mut self, title: &str) {
        self.inner.set_title(title);
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear.color = color;
    }

    pub fn register_keyboard_callback(&mut self, callback: impl FnMut(Key, Action, Modifiers) + 'static) {
        self.callbacks.keyboard.push(Box::new(callback));
    }

    pub fn register_mouse_button_callback(
        &mut self,
        callback: impl FnMut(MouseButton, Action, f32, f32) + 'static,
    ) {
        self.callbacks.mouse_button.push(Box::new(callback));
    }

    pub fn register_mouse_move_callback(&mut self, callback: impl FnMut(f32, f32) + 'static) {
        self.callbacks.mouse_move.push(Box::new(callback));
    }

    pub fn register_scroll_callback(&mut self, callback: impl FnMut(f32, f32) + 'static) {
        self.callbacks.scroll.push(Box::new(callback));
    }

    pub fn register_resize_callback(&mut self, callback: impl FnMut(u32, u32) + 'static) {
        self.callbacks.resize.push(Box::new(callback));
    }

    /// Queues an event as if the platform had delivered it; handled by
    /// the next [`Window::begin`].
    pub fn inject_event(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    /// Whether the frame loop should keep going.
    pub fn active(&self) -> bool {
        !self.close_requested
            && self.inner.is_open()
            && self.max_frames.map_or(true, |max| self.frames < max)
    }

    pub fn request_close(&mut self) {
        if !self.close_requested {
            log::debug!("window close requested");
        }
        self.close_requested = true;
    }

    /// Handles pending events and starts a frame.
    ///
    /// # Panics
    ///
    /// If a frame is already in progress.
    pub fn begin(&mut self) -> Result<()> {
        self.events.clear();
        self.inner.poll_events(&mut self.pending);
        self.events.append(&mut self.pending);

        for event in &self.events {
            self.input.handle_event(event);
            if let InputEvent::Resize { width, height } = *event {
                if width > 0 && height > 0 {
                    self.inner.context().resize(width, height);
                }
            }
            self.callbacks.dispatch(event);
        }

        self.inner.context().begin_frame(self.clear)
    }

    /// Finishes and presents the frame.
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn end(&mut self) -> Result<()> {
        self.frames += 1;
        self.inner.context().end_frame()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.inner.close();
        self.inner.context().shutdown();
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("size", &self.size())
            .field("frames", &self.frames)
            .field("max_frames", &self.max_frames)
            .field("close_requested", &self.close_requested)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::gfx::backend::HeadlessBackend;

    fn headless_config() -> WindowConfig {
        WindowConfig::default()
            .with_backend(BackendKind::Headless)
            .with_size(320, 240)
    }

    #[test]
    fn test_callbacks_run_inside_begin_after_input_update() {
        let mut window = Window::new(&headless_config()).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let keys = Rc::clone(&log);
        window.register_keyboard_callback(move |key, action, _| keys.borrow_mut().push(format!("{:?} {:?}", key, action)));
        let sizes = Rc::clone(&log);
        window.register_resize_callback(move |w, h| sizes.borrow_mut().push(format!("{}x{}", w, h)));
        let scrolls = Rc::clone(&log);
        window.register_scroll_callback(move |_, y| scrolls.borrow_mut().push(format!("scroll {}", y)));

        window.inject_event(InputEvent::Key {
            key: Key::W,
            action: Action::Press,
            modifiers: Modifiers::default(),
        });
        window.inject_event(InputEvent::Resize { width: 640, height: 480 });
        window.inject_event(InputEvent::Scroll { x: 0.0, y: 2.0 });
        assert!(log.borrow().is_empty());

        window.begin().unwrap();
        assert_eq!(*log.borrow(), vec!["W Press", "640x480", "scroll 2"]);
        assert!(window.input().is_key_down(Key::W));
        assert_eq!(window.size(), (640, 480));
        assert_eq!(window.events().len(), 3);
        window.end().unwrap();

        window.begin().unwrap();
        assert!(window.events().is_empty());
        window.end().unwrap();
    }

    #[test]
    fn test_max_frames_and_request_close() {
        let mut window = Window::new(&headless_config().with_max_frames(2)).unwrap();
        let mut frames = 0;
        while window.active() {
            window.begin().unwrap();
            window.end().unwrap();
            frames += 1;
        }
        assert_eq!(frames, 2);

        let mut window = Window::new(&headless_config()).unwrap();
        assert!(window.active());
        window.request_close();
        assert!(!window.active());
    }

    #[test]
    fn test_frame_boundary_and_drop_shuts_down_context() {
        let backend = Rc::new(HeadlessBackend::with_size(64, 64));
        let config = headless_config().with_clear_color([1.0, 0.0, 0.0, 1.0]);
        let mut window = Window::from_impl(Box::new(HeadlessWindow::with_backend(backend.clone())), &config);
        let ctx = window.context().clone();

        window.begin().unwrap();
        assert!(ctx.in_frame());
        window.end().unwrap();
        assert_eq!(backend.frames_completed(), 1);

        drop(window);
        assert!(!ctx.is_alive());
    }
}
