use std::sync::mpsc;

use crt_core::{FrameRenderer, FrameUniforms, SourceFrame};

use crate::context::GpuContext;
use crate::crt_pipeline::CrtPass;
use crate::CrtError;

/// Unfiltered draw of the source texture, used while the effect is stopped.
///
/// Shares the CRT pass's bind group layout and quad vertex buffer, so only
/// bindings 0 and 1 are read; the uniform block is bound but unused.
pub const PASSTHROUGH_WGSL: &str = r#"
struct VertexOut {
    @builtin(position) pos: vec4<f32>,
    @location(0)       uv:  vec2<f32>,
};

@vertex
fn vs_main(@location(0) a_position: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.pos = vec4(a_position * 2.0 - 1.0, 0.0, 1.0);
    out.uv  = vec2(a_position.x, 1.0 - a_position.y);
    return out;
}

@group(0) @binding(0) var t_source: texture_2d<f32>;
@group(0) @binding(1) var s_source: sampler;

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return vec4(textureSample(t_source, s_source, in.uv).rgb, 1.0);
}
"#;

/// Format of the offscreen target. Matches the source so a readback is
/// byte-comparable with the CPU reference.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Renders the CRT pass into an offscreen texture and reads the result back
/// to host memory after every draw.
pub struct OffscreenRenderer {
    ctx: GpuContext,
    pass: CrtPass,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_row: u32,
    width: u32,
    height: u32,
    output: Vec<u8>,
}

impl OffscreenRenderer {
    pub fn new(ctx: GpuContext, width: u32, height: u32) -> Result<Self, CrtError> {
        let width = width.max(1);
        let height = height.max(1);
        let pass = CrtPass::new(&ctx.device, TARGET_FORMAT, width, height)?;

        let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("crt_offscreen"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&Default::default());

        // copy_texture_to_buffer needs 256-byte aligned rows.
        let padded_row = padded_bytes_per_row(width);
        let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("crt_readback"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::debug!("offscreen CRT target {}×{}", width, height);

        Ok(Self {
            ctx,
            pass,
            target,
            target_view,
            readback,
            padded_row,
            width,
            height,
            output: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The last drawn frame, RGBA8, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.output
    }

    fn read_back(&mut self) -> Result<(), CrtError> {
        let slice = self.readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.ctx.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| CrtError::Readback(e.to_string()))?
            .map_err(|e| CrtError::Readback(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            let row = self.width as usize * 4;
            for (y, chunk) in data.chunks(self.padded_row as usize).take(self.height as usize).enumerate() {
                self.output[y * row..(y + 1) * row].copy_from_slice(&chunk[..row]);
            }
        }
        self.readback.unmap();
        Ok(())
    }
}

impl FrameRenderer for OffscreenRenderer {
    type Error = CrtError;

    fn draw(&mut self, frame: SourceFrame<'_>, uniforms: &FrameUniforms) -> Result<(), CrtError> {
        self.pass.upload_source(&self.ctx.device, &self.ctx.queue, frame)?;
        self.pass.write_uniforms(&self.ctx.queue, uniforms);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("crt_offscreen_encoder"),
            });
        self.pass.draw(&mut encoder, &self.target_view);
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        self.read_back()
    }
}

fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}
