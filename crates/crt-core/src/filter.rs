use std::fmt::Display;
use std::time::Instant;

use crate::{
    CrtConfig, FrameHandle, FrameRenderer, FrameUniforms, InputEvent, PixelSource, Presenter,
    SourceFrame,
};

/// Whether the render loop is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    /// `pending` is the only frame callback that may still render.
    Running { pending: FrameHandle },
}

/// Source surface and shader surface, present only when construction
/// succeeded.
struct Surfaces<S, R> {
    source: S,
    renderer: R,
}

/// The CRT post-processor: swaps the source surface for a shader surface on
/// `start`, redraws it every frame, and swaps back on `stop`.
///
/// A filter built without a source, or whose renderer could not be created,
/// is inert: it logs once at construction and ignores every later call.
pub struct CrtFilter<S, P, R> {
    surfaces: Option<Surfaces<S, R>>,
    presenter: P,
    config: CrtConfig,
    state: RunState,
    epoch: Instant,
    scratch: Vec<u8>,
    frames: u64,
}

impl<S, P, R> CrtFilter<S, P, R>
where
    S: PixelSource,
    P: Presenter,
    R: FrameRenderer,
{
    /// `make_renderer` receives the source size; the shader surface keeps
    /// that size for its whole life.
    pub fn new<F, E>(source: Option<S>, presenter: P, config: CrtConfig, make_renderer: F) -> Self
    where
        F: FnOnce(u32, u32) -> Result<R, E>,
        E: Display,
    {
        let surfaces = match source {
            None => {
                log::error!("CRT filter: no source surface given, effect disabled");
                None
            }
            Some(source) => {
                let (width, height) = source.size();
                match make_renderer(width, height) {
                    Ok(renderer) => {
                        log::debug!("CRT filter ready: {width}×{height}");
                        Some(Surfaces { source, renderer })
                    }
                    Err(e) => {
                        log::error!("CRT filter: shader surface unavailable, effect disabled: {e}");
                        None
                    }
                }
            }
        };

        Self {
            surfaces,
            presenter,
            config,
            state: RunState::Stopped,
            epoch: Instant::now(),
            scratch: Vec::new(),
            frames: 0,
        }
    }

    /// Measure shader time from `epoch` instead of construction.
    pub fn with_epoch(mut self, epoch: Instant) -> Self {
        self.epoch = epoch;
        self
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn start(&mut self) {
        if self.surfaces.is_none() {
            log::warn!("CRT filter is inert; start ignored");
            return;
        }
        if self.is_running() {
            return;
        }
        self.presenter.show_effect_surface();
        self.render(self.elapsed_seconds());
        let pending = self.presenter.request_frame();
        self.state = RunState::Running { pending };
        log::info!("CRT effect started");
    }

    pub fn stop(&mut self) {
        let RunState::Running { pending } = self.state else {
            return;
        };
        self.presenter.cancel_frame(pending);
        self.presenter.show_source_surface();
        self.state = RunState::Stopped;
        log::info!("CRT effect stopped after {} frames", self.frames);
    }

    /// Frame callback from the host. Renders and schedules the next frame
    /// only if `handle` is the one currently pending.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        match self.state {
            RunState::Running { pending } if pending == handle => {
                self.render(self.elapsed_seconds());
                let pending = self.presenter.request_frame();
                self.state = RunState::Running { pending };
            }
            _ => log::trace!("ignoring stale frame callback {handle:?}"),
        }
    }

    /// Re-create `event` and deliver it to the source surface.
    pub fn forward_event(&mut self, event: &InputEvent) {
        if let Some(surfaces) = &mut self.surfaces {
            surfaces.source.dispatch_event(event.redispatch());
        }
    }

    fn render(&mut self, time: f32) {
        let Some(Surfaces { source, renderer }) = &mut self.surfaces else {
            return;
        };
        let (width, height) = source.size();
        source.read_pixels(&mut self.scratch);
        let frame = SourceFrame {
            width,
            height,
            pixels: &self.scratch,
        };
        if !frame.is_complete() {
            log::warn!(
                "source returned {} bytes for {width}×{height}, frame skipped",
                self.scratch.len()
            );
            return;
        }
        let uniforms = FrameUniforms::new(&self.config, time);
        match renderer.draw(frame, &uniforms) {
            Ok(()) => self.frames += 1,
            Err(e) => log::warn!("CRT frame failed: {e}"),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn is_inert(&self) -> bool {
        self.surfaces.is_none()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running { .. })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &CrtConfig {
        &self.config
    }

    /// Replace the whole configuration; the next frame picks it up.
    pub fn set_config(&mut self, config: CrtConfig) {
        log::debug!("CRT config replaced: {config:?}");
        self.config = config;
    }

    /// Seconds since the epoch, as handed to the shader.
    pub fn elapsed_seconds(&self) -> f32 {
        self.epoch.elapsed().as_secs_f32()
    }

    /// Frames drawn successfully so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn source(&self) -> Option<&S> {
        self.surfaces.as_ref().map(|s| &s.source)
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.surfaces.as_mut().map(|s| &mut s.source)
    }

    pub fn renderer(&self) -> Option<&R> {
        self.surfaces.as_ref().map(|s| &s.renderer)
    }

    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.surfaces.as_mut().map(|s| &mut s.renderer)
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
