use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crt_core::events::{
    KeyEvent, KeyKind, Modifiers, PointerButton, PointerEvent, PointerKind,
};
use crt_core::presets::Preset;
use crt_core::{
    CrtConfig, CrtFilter, FrameHandle, FrameRenderer, FrameUniforms, InputEvent, PixelSource,
    Presenter, SourceFrame,
};
use crt_gpu::{CrtError, CrtPass};
use winit::window::Window;

use crate::canvas::DemoCanvas;
use crate::input::{window_to_canvas, InputAction, InputState, Key};

// ---------------------------------------------------------------------------
// Simple FPS counter — logs to console once per second
// ---------------------------------------------------------------------------

struct FpsCounter {
    frames: u32,
    last_report: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            last_report: Instant::now(),
        }
    }

    /// Increment the frame count.  Returns the FPS value if a full second has
    /// elapsed since the last report (so the caller can log it).
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.last_report = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// WindowPresenter — surface swap and frame scheduling on a winit window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    Source,
    Effect,
}

pub struct WindowPresenter {
    window: Arc<Window>,
    title: String,
    shown: Shown,
    next_handle: u64,
    pending: Option<FrameHandle>,
}

impl WindowPresenter {
    pub fn new(window: Arc<Window>, title: &str) -> Self {
        Self {
            window,
            title: title.to_string(),
            shown: Shown::Source,
            next_handle: 0,
            pending: None,
        }
    }

    pub fn shown(&self) -> Shown {
        self.shown
    }

    /// Hand the pending frame to the redraw handler, at most once.
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl Presenter for WindowPresenter {
    fn show_effect_surface(&mut self) {
        self.shown = Shown::Effect;
        self.window.set_title(&format!("{} [CRT]", self.title));
    }

    fn show_source_surface(&mut self) {
        self.shown = Shown::Source;
        self.window.set_title(&self.title);
        self.window.request_redraw();
    }

    fn request_frame(&mut self) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

// ---------------------------------------------------------------------------
// WindowRenderer — the CRT pass drawn straight into the window surface
// ---------------------------------------------------------------------------

pub struct WindowRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    pass: CrtPass,
}

impl WindowRenderer {
    /// Initialise wgpu for a given window.  The window is wrapped in `Arc` so
    /// that the surface can safely hold a `'static` reference to it.
    ///
    /// The swapchain takes the window's inner size; the CRT pass and its
    /// source texture stay at `source_width` × `source_height` and the quad
    /// stretches them over the surface.
    pub fn new(window: Arc<Window>, source_width: u32, source_height: u32) -> Result<Self, CrtError> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        // ---- Instance -------------------------------------------------------
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // ---- Surface --------------------------------------------------------
        let surface = instance.create_surface(Arc::clone(&window))?;

        // ---- Adapter --------------------------------------------------------
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(CrtError::NoAdapter)?;

        log::info!("GPU adapter: {}", adapter.get_info().name);

        // ---- Device & Queue -------------------------------------------------
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("crt-app device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        // ---- Surface configuration ------------------------------------------
        // The shader writes raw 8-bit values; a non-sRGB surface shows them
        // unchanged.
        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(CrtError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);
        log::info!(
            "Surface configured: {}×{} {:?} Fifo",
            surface_config.width,
            surface_config.height,
            format
        );

        let pass = CrtPass::new(&device, format, source_width, source_height)?;

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            pass,
        })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        log::debug!("Surface resized to {}×{}", width, height);
    }

    /// Show the source frame without the effect.
    pub fn present_plain(&mut self, frame: SourceFrame<'_>) -> Result<(), CrtError> {
        self.pass.upload_source(&self.device, &self.queue, frame)?;
        self.present(|pass, encoder, view| pass.draw_plain(encoder, view))
    }

    fn present(
        &mut self,
        record: impl FnOnce(&CrtPass, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    ) -> Result<(), CrtError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            // Surface lost / outdated: reconfigure and try again next frame.
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.surface_config);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        record(&self.pass, &mut encoder, &view);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl FrameRenderer for WindowRenderer {
    type Error = CrtError;

    fn draw(&mut self, frame: SourceFrame<'_>, uniforms: &FrameUniforms) -> Result<(), Self::Error> {
        self.pass.upload_source(&self.device, &self.queue, frame)?;
        self.pass.write_uniforms(&self.queue, uniforms);
        self.present(|pass, encoder, view| pass.draw(encoder, view))
    }
}

// ---------------------------------------------------------------------------
// App — filter, canvas and input wired to the window
// ---------------------------------------------------------------------------

pub type DemoFilter = CrtFilter<DemoCanvas, WindowPresenter, WindowRenderer>;

pub struct App {
    filter: DemoFilter,
    config_path: Option<PathBuf>,
    current_preset_idx: usize,

    // Input
    input: InputState,
    /// Last known cursor position in source-surface pixels.
    cursor_pos: (f64, f64),
    modifiers: Modifiers,
    buttons: u16,
    /// Button whose press has not yet been released; a matching release
    /// also produces a click.
    pressed: Option<PointerButton>,

    /// Reused read-back buffer for the unfiltered view.
    scratch: Vec<u8>,
    fps: FpsCounter,
}

impl App {
    pub fn new(window: Arc<Window>, canvas: DemoCanvas, config_path: Option<PathBuf>, title: &str) -> Self {
        let config = match &config_path {
            Some(path) => CrtConfig::load(path).unwrap_or_else(|e| {
                log::error!("{e}; using defaults");
                CrtConfig::default()
            }),
            None => CrtConfig::default(),
        };

        let presenter = WindowPresenter::new(Arc::clone(&window), title);
        let filter = CrtFilter::new(Some(canvas), presenter, config, |w, h| {
            WindowRenderer::new(Arc::clone(&window), w, h)
        });

        Self {
            filter,
            config_path,
            current_preset_idx: 0,
            input: InputState::new(),
            cursor_pos: (0.0, 0.0),
            modifiers: Modifiers::default(),
            buttons: 0,
            pressed: None,
            scratch: Vec::new(),
            fps: FpsCounter::new(),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.filter.is_inert()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(renderer) = self.filter.renderer_mut() {
            renderer.resize(width, height);
        }
    }

    // -------------------------------------------------------------------------
    // Input — called by main.rs window_event handler
    // -------------------------------------------------------------------------

    /// Translate a key press and return the resulting action, if any.
    pub fn on_key_pressed(&self, key: Key) -> Option<InputAction> {
        self.input.on_key(key)
    }

    pub fn on_modifiers(&mut self, state: winit::keyboard::ModifiersState) {
        self.modifiers = Modifiers {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            meta: state.super_key(),
        };
    }

    /// Track the cursor in source-surface pixels and forward a move event.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let (Some(renderer), Some(canvas)) = (self.filter.renderer(), self.filter.source()) else {
            return;
        };
        self.cursor_pos = window_to_canvas(x, y, renderer.surface_size(), canvas.size());
        self.forward(self.pointer(PointerKind::Move, PointerButton::Primary));
    }

    /// Forward a button press or release; a release of the pressed button is
    /// followed by a click, the way a browser reports it.
    pub fn on_mouse_input(&mut self, button: winit::event::MouseButton, pressed: bool) {
        let button = pointer_button(button);
        if pressed {
            self.buttons |= button.mask();
            self.pressed = Some(button);
            self.forward(self.pointer(PointerKind::Down, button));
        } else {
            self.buttons &= !button.mask();
            self.forward(self.pointer(PointerKind::Up, button));
            if self.pressed.take() == Some(button) {
                self.forward(self.pointer(PointerKind::Click, button));
            }
        }
    }

    pub fn on_keyboard(&mut self, event: &winit::event::KeyEvent) {
        use winit::keyboard::{Key as LogicalKey, PhysicalKey};

        let key = match &event.logical_key {
            LogicalKey::Character(s) => s.to_string(),
            LogicalKey::Named(named) => format!("{named:?}"),
            _ => "Unidentified".to_string(),
        };
        let code = match event.physical_key {
            PhysicalKey::Code(code) => format!("{code:?}"),
            PhysicalKey::Unidentified(_) => "Unidentified".to_string(),
        };
        let kind = match event.state {
            winit::event::ElementState::Pressed => KeyKind::Down,
            winit::event::ElementState::Released => KeyKind::Up,
        };
        self.forward(InputEvent::Keyboard(KeyEvent {
            kind,
            key,
            code,
            repeat: event.repeat,
            modifiers: self.modifiers,
        }));
    }

    fn pointer(&self, kind: PointerKind, button: PointerButton) -> InputEvent {
        InputEvent::Pointer(PointerEvent {
            kind,
            x: self.cursor_pos.0,
            y: self.cursor_pos.1,
            button,
            buttons: self.buttons,
            modifiers: self.modifiers,
        })
    }

    /// While running, events land on the shader surface and the filter
    /// re-creates them on the canvas; while stopped the canvas gets them
    /// directly.
    fn forward(&mut self, event: InputEvent) {
        if self.filter.is_running() {
            self.filter.forward_event(&event);
        } else if let Some(canvas) = self.filter.source_mut() {
            canvas.dispatch_event(event);
        }
    }

    /// Apply an action to the app state.
    ///
    /// Returns `true` if the app should exit (i.e. action was `Quit`).
    pub fn handle_action(&mut self, action: InputAction) -> bool {
        match action {
            InputAction::LoadPreset(preset) => {
                log::info!("Loading preset: {}", preset.name());
                if let Some(idx) = Preset::ALL.iter().position(|&p| p == preset) {
                    self.current_preset_idx = idx;
                }
                self.filter.set_config(preset.config());
            }

            InputAction::CycleNextPreset => {
                self.current_preset_idx = (self.current_preset_idx + 1) % Preset::ALL.len();
                let preset = Preset::ALL[self.current_preset_idx];
                log::info!("Cycling to preset: {}", preset.name());
                self.filter.set_config(preset.config());
            }

            InputAction::ToggleEffect => {
                if self.filter.is_running() {
                    self.filter.stop();
                } else {
                    self.filter.start();
                }
            }

            InputAction::ToggleRetrace => {
                let mut config = *self.filter.config();
                config.retrace_lines = !config.retrace_lines;
                log::debug!("retrace_lines → {}", config.retrace_lines);
                self.filter.set_config(config);
            }

            InputAction::ToggleDotMask => {
                let mut config = *self.filter.config();
                config.dot_mask = !config.dot_mask;
                log::debug!("dot_mask → {}", config.dot_mask);
                self.filter.set_config(config);
            }

            InputAction::ReloadConfig => match &self.config_path {
                Some(path) => match CrtConfig::load(path) {
                    Ok(config) => {
                        log::info!("Reloaded {}", path.display());
                        self.filter.set_config(config);
                    }
                    Err(e) => log::error!("{e}"),
                },
                None => log::warn!("no config file given; nothing to reload"),
            },

            InputAction::Quit => return true,
        }
        false
    }

    // -------------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------------

    /// Redraw callback. A pending frame drives the filter; otherwise the
    /// canvas is shown as is.
    pub fn render(&mut self) -> Result<(), CrtError> {
        if let Some(fps) = self.fps.tick() {
            log::debug!(
                "FPS: {:.1}  preset: {}  effect: {}  frames: {}",
                fps,
                Preset::ALL[self.current_preset_idx].name(),
                self.filter.is_running(),
                self.filter.frames_rendered(),
            );
        }

        if let Some(handle) = self.filter.presenter_mut().take_pending() {
            self.filter.on_frame(handle);
            return Ok(());
        }
        if self.filter.presenter().shown() == Shown::Effect {
            return Ok(());
        }

        let Some(canvas) = self.filter.source() else {
            return Ok(());
        };
        let (width, height) = canvas.size();
        canvas.read_pixels(&mut self.scratch);
        let frame = SourceFrame {
            width,
            height,
            pixels: &self.scratch,
        };
        match self.filter.renderer_mut() {
            Some(renderer) => renderer.present_plain(frame),
            None => Ok(()),
        }
    }
}

fn pointer_button(button: winit::event::MouseButton) -> PointerButton {
    use winit::event::MouseButton;
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Middle => PointerButton::Auxiliary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(n) => PointerButton::Other(n),
    }
}
