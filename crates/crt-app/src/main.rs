use std::path::PathBuf;
use std::sync::Arc;

use crt_gpu::CrtError;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod app;
mod canvas;
mod input;

use app::App;
use canvas::DemoCanvas;
use input::Key;

const TITLE: &str = "CRT Demo";
const CANVAS_WIDTH: u32 = 480;
const CANVAS_HEIGHT: u32 = 360;

// ---------------------------------------------------------------------------
// Handler — winit ApplicationHandler
// ---------------------------------------------------------------------------

struct Handler {
    config_path: Option<PathBuf>,
    window: Option<Arc<Window>>,
    app: Option<App>,
}

/// Map a winit physical key to the demo's `Key`, if it is bound.
fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Digit1 => Some(Key::Digit1),
        KeyCode::Digit2 => Some(Key::Digit2),
        KeyCode::Digit3 => Some(Key::Digit3),
        KeyCode::Digit4 => Some(Key::Digit4),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::KeyT => Some(Key::T),
        KeyCode::KeyM => Some(Key::M),
        KeyCode::KeyL => Some(Key::L),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

impl ApplicationHandler for Handler {
    /// Called once on desktop when the event loop starts.
    /// Creates the window at canvas size, then the filter and its surface.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_resizable(false)
            .with_inner_size(winit::dpi::PhysicalSize::new(CANVAS_WIDTH, CANVAS_HEIGHT));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        log::info!("Window created ({CANVAS_WIDTH}×{CANVAS_HEIGHT})");

        let canvas = DemoCanvas::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        let app = App::new(Arc::clone(&window), canvas, self.config_path.clone(), TITLE);
        if app.is_inert() {
            log::error!("CRT filter could not be created — exiting");
            event_loop.exit();
            return;
        }
        log::info!("Enter toggles the CRT effect; 1-4 / Space pick presets; Q quits");

        self.window = Some(window);
        self.app = Some(app);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = &mut self.app else {
            return;
        };

        match event {
            // ----------------------------------------------------------------
            // Exit
            // ----------------------------------------------------------------
            WindowEvent::CloseRequested => {
                log::info!("Close requested — exiting");
                event_loop.exit();
            }

            // ----------------------------------------------------------------
            // Keyboard — demo actions, then forwarded to the canvas
            // ----------------------------------------------------------------
            WindowEvent::KeyboardInput { event, .. } => {
                if let KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                } = &event
                {
                    if let Some(action) = map_key(*code).and_then(|k| app.on_key_pressed(k)) {
                        if app.handle_action(action) {
                            log::info!("Quit requested — exiting");
                            event_loop.exit();
                            return;
                        }
                    }
                }
                app.on_keyboard(&event);
            }

            WindowEvent::ModifiersChanged(modifiers) => app.on_modifiers(modifiers.state()),

            // ----------------------------------------------------------------
            // Pointer
            // ----------------------------------------------------------------
            WindowEvent::CursorMoved { position, .. } => {
                app.on_cursor_moved(position.x, position.y);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                app.on_mouse_input(button, state == ElementState::Pressed);
            }

            // ----------------------------------------------------------------
            // Resize — reconfigure the wgpu surface
            // ----------------------------------------------------------------
            WindowEvent::Resized(new_size) => app.resize(new_size.width, new_size.height),

            // ----------------------------------------------------------------
            // Redraw — one CRT frame, or the plain canvas while stopped
            // ----------------------------------------------------------------
            WindowEvent::RedrawRequested => match app.render() {
                Ok(()) => {}
                Err(CrtError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                    log::error!("GPU out of memory — exiting");
                    event_loop.exit();
                }
                Err(e) => log::warn!("render error: {e:?}"),
            },

            _ => {}
        }
    }

    /// Drive continuous redraws (game-loop style).
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("CRT_CONFIG").map(PathBuf::from));
    if let Some(path) = &config_path {
        log::info!("Config file: {}", path.display());
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = Handler {
        config_path,
        window: None,
        app: None,
    };
    if let Err(e) = event_loop.run_app(&mut handler) {
        log::error!("event loop error: {e}");
        std::process::exit(1);
    }
}
