pub mod context;
pub mod crt_pipeline;
pub mod renderer;

pub use context::{CrtUniforms, GpuContext};
pub use crt_pipeline::CrtPass;
pub use renderer::OffscreenRenderer;

/// Source of the CRT shader, for callers that validate or inspect it.
pub const CRT_WGSL: &str = include_str!("../shaders/crt.wgsl");

#[derive(Debug, thiserror::Error)]
pub enum CrtError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("surface frame unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("surface supports no texture formats on this adapter")]
    NoSurfaceFormat,
    #[error("source frame holds {actual} bytes, expected {expected}")]
    IncompleteFrame { expected: u64, actual: usize },
    #[error("shader pipeline rejected: {0}")]
    Pipeline(String),
    #[error("pixel read-back failed: {0}")]
    Readback(String),
}
