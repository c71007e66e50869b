use crt_core::FrameUniforms;
use wgpu::{Device, Instance, Queue};

use crate::CrtError;

pub struct GpuContext {
    pub instance: Instance,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Create a headless GPU context (no surface). Used for offscreen
    /// rendering and testing. The windowed variant lives in `crt-app`.
    pub async fn new_headless() -> Result<Self, CrtError> {
        let instance = Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(CrtError::NoAdapter)?;

        log::info!("GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("crt-gpu device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            device,
            queue,
        })
    }
}

/// Uniform block uploaded once per frame.
/// Must match the `CrtUniforms` struct in `crt.wgsl` (48 bytes).
/// `repr(C)` + `bytemuck` ensures safe casting to `&[u8]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CrtUniforms {
    pub time: f32,
    pub barrel: f32,
    pub aberration: f32,
    pub noise: f32,
    pub tearing: f32,
    pub glow: f32,
    pub jitter: f32,
    // WGSL has no host-shareable bool
    pub retrace: u32,
    pub dot_mask: u32,
    pub _pad: [u32; 3], // keep 16-byte size multiple
}

impl From<&FrameUniforms> for CrtUniforms {
    fn from(u: &FrameUniforms) -> Self {
        Self {
            time: u.time,
            barrel: u.barrel,
            aberration: u.aberration,
            noise: u.noise,
            tearing: u.tearing,
            glow: u.glow,
            jitter: u.jitter,
            retrace: u.retrace as u32,
            dot_mask: u.dot_mask as u32,
            _pad: [0; 3],
        }
    }
}
