pub mod config;
pub mod events;
pub mod filter;
pub mod presets;
pub mod shading;

pub use config::{ConfigError, ConfigKey, ConfigValue, CrtConfig, CrtOverrides};
pub use events::InputEvent;
pub use filter::{CrtFilter, RunState};

// ---------------------------------------------------------------------------
// FrameUniforms — the per-draw shader inputs
// ---------------------------------------------------------------------------

/// Everything the CRT shader reads for one draw call: the clock plus the
/// eight configuration values it consumes (`motion_blur` is not one of them).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub time: f32,
    pub barrel: f32,
    pub aberration: f32,
    pub noise: f32,
    pub tearing: f32,
    pub glow: f32,
    pub jitter: f32,
    pub retrace: bool,
    pub dot_mask: bool,
}

impl FrameUniforms {
    pub fn new(config: &CrtConfig, time: f32) -> Self {
        Self {
            time,
            barrel: config.barrel_distortion,
            aberration: config.chromatic_aberration,
            noise: config.static_noise,
            tearing: config.horizontal_tearing,
            glow: config.glow_bloom,
            jitter: config.vertical_jitter,
            retrace: config.retrace_lines,
            dot_mask: config.dot_mask,
        }
    }
}

/// One frame of source pixels: 8-bit RGBA, row-major, top row first.
#[derive(Debug, Clone, Copy)]
pub struct SourceFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

impl SourceFrame<'_> {
    /// True when `pixels` holds exactly `width * height` RGBA texels.
    pub fn is_complete(&self) -> bool {
        self.pixels.len() as u64 == self.width as u64 * self.height as u64 * 4
    }
}

/// Opaque token for a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

// ---------------------------------------------------------------------------
// Traits — the host collaborators
// ---------------------------------------------------------------------------

/// The 2D surface the effect is applied over.
pub trait PixelSource {
    /// Current size in pixels.
    fn size(&self) -> (u32, u32);
    /// Replace the contents of `out` with the full RGBA8 pixel buffer.
    fn read_pixels(&self, out: &mut Vec<u8>);
    /// Deliver an input event to whatever logic is bound to this surface.
    fn dispatch_event(&mut self, event: InputEvent);
}

/// The host that decides which surface is visible and schedules frames.
pub trait Presenter {
    /// Detach the source surface and put the shader surface in its place.
    fn show_effect_surface(&mut self);
    /// Detach the shader surface, reinsert the source surface at the same
    /// position and clear any forced display override on it.
    fn show_source_surface(&mut self);
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// The shader-backed surface: uploads a source frame and draws the CRT pass.
pub trait FrameRenderer {
    type Error: std::fmt::Display;

    fn draw(&mut self, frame: SourceFrame<'_>, uniforms: &FrameUniforms) -> Result<(), Self::Error>;
}
