//! # Window Example
//!
//! Opens a window, logs input through the registered callbacks and clears
//! the screen to a slowly changing color. Press Escape or close the window
//! to quit.
//!
//! ## Usage:
//! ```bash
//! cargo run --example window
//! LOCO_BACKEND=headless cargo run --example window
//! ```

use loco::prelude::*;

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    init_logging(config.logging.clone());

    let mut window_config = config.window.clone().with_title("loco - window");
    if window_config.backend == BackendKind::Headless {
        window_config = window_config.with_max_frames(120);
    }
    let mut window = Window::new(&window_config)?;

    window.register_keyboard_callback(|key, action, modifiers| {
        log::info!("key {:?} {:?} (shift: {})", key, action, modifiers.shift);
    });
    window.register_mouse_button_callback(|button, action, x, y| {
        log::info!("mouse {:?} {:?} at ({:.0}, {:.0})", button, action, x, y);
    });
    window.register_scroll_callback(|_, y| log::info!("scroll {:.1}", y));
    window.register_resize_callback(|width, height| log::info!("resized to {}x{}", width, height));

    let mut t: f32 = 0.0;
    while window.active() {
        if window.input().is_key_down(Key::Escape) {
            window.request_close();
        }
        t += 1.0 / 60.0;
        window.set_clear_color([0.5 + 0.5 * t.sin(), 0.3, 0.5 + 0.5 * t.cos(), 1.0]);

        window.begin()?;
        window.end()?;
    }

    log::info!("closed after {} frames", window.frames());
    Ok(())
}
