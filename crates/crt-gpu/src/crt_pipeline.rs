use crt_core::{FrameUniforms, SourceFrame};
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, BindGroupLayout, Buffer, CommandEncoder, Device, Queue, RenderPipeline, Sampler,
    Texture, TextureFormat, TextureView,
};

use crate::context::CrtUniforms;
use crate::renderer::PASSTHROUGH_WGSL;
use crate::{CrtError, CRT_WGSL};

/// Full-screen quad: two triangles in [-1, 1]². The vertex stage maps them
/// through `p * 2 - 1`, so the visible area is the `[0, 1]²` corner.
pub const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// Format of the uploaded source frame: 8-bit RGBA, no sRGB decode.
pub const SOURCE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Every GPU object the CRT effect needs, created once: the CRT pipeline, a
/// plain pipeline for showing the source unfiltered, the source texture and
/// sampler, the uniform buffer, and the quad vertex buffer.
pub struct CrtPass {
    crt: RenderPipeline,
    plain: RenderPipeline,

    bind_group_layout: BindGroupLayout,
    sampler: Sampler,
    uniform_buf: Buffer,
    vertex_buf: Buffer,

    /// rgba8unorm texture overwritten with the source pixels every frame.
    source_tex: Texture,
    bind_group: BindGroup,
    source_size: (u32, u32),
}

impl CrtPass {
    /// Build all pipelines and buffers. Shader compile or pipeline link
    /// errors are caught in a validation scope and returned with the
    /// compiler's message.
    pub fn new(
        device: &Device,
        target_format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, CrtError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        // --- bind group layout -------------------------------------------------
        // binding 0 : source texture
        // binding 1 : linear, edge-clamped sampler
        // binding 2 : CrtUniforms uniform buffer
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("crt_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("crt_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // --- sampler, buffers, texture --------------------------------------------
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("crt_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("crt_uniforms"),
            size: std::mem::size_of::<CrtUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("crt_quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let source_tex = create_source_texture(device, width, height);
        let bind_group =
            create_bind_group(device, &bind_group_layout, &source_tex, &sampler, &uniform_buf);

        // --- pipelines --------------------------------------------------------
        let make = |label: &str, src: &str| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(src.into()),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &QUAD_ATTRIBUTES,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let crt = make("crt", CRT_WGSL);
        let plain = make("crt_passthrough", PASSTHROUGH_WGSL);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(CrtError::Pipeline(err.to_string()));
        }

        Ok(Self {
            crt,
            plain,
            bind_group_layout,
            sampler,
            uniform_buf,
            vertex_buf,
            source_tex,
            bind_group,
            source_size: (width, height),
        })
    }

    /// Overwrite the source texture with one RGBA8 frame. The texture is only
    /// recreated when the source dimensions change. A frame whose buffer does
    /// not hold exactly `width * height` texels is rejected before any GPU
    /// call.
    pub fn upload_source(
        &mut self,
        device: &Device,
        queue: &Queue,
        frame: SourceFrame<'_>,
    ) -> Result<(), CrtError> {
        check_frame(&frame)?;
        let SourceFrame {
            width,
            height,
            pixels,
        } = frame;
        if width == 0 || height == 0 {
            return Ok(());
        }
        if self.source_size != (width, height) {
            log::debug!(
                "source resized {:?} → {}×{}, recreating texture",
                self.source_size,
                width,
                height
            );
            self.source_tex = create_source_texture(device, width, height);
            self.bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.source_tex,
                &self.sampler,
                &self.uniform_buf,
            );
            self.source_size = (width, height);
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.source_tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    pub fn write_uniforms(&self, queue: &Queue, uniforms: &FrameUniforms) {
        let gpu = CrtUniforms::from(uniforms);
        queue.write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&gpu));
    }

    /// Record the CRT pass into `encoder`, drawing over all of `target`.
    pub fn draw(&self, encoder: &mut CommandEncoder, target: &TextureView) {
        self.record(encoder, target, &self.crt, "crt_pass");
    }

    /// Record an unfiltered draw of the source texture.
    pub fn draw_plain(&self, encoder: &mut CommandEncoder, target: &TextureView) {
        self.record(encoder, target, &self.plain, "crt_passthrough_pass");
    }

    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    fn record(
        &self,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        pipeline: &RenderPipeline,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}

fn check_frame(frame: &SourceFrame<'_>) -> Result<(), CrtError> {
    if frame.is_complete() {
        Ok(())
    } else {
        Err(CrtError::IncompleteFrame {
            expected: frame.width as u64 * frame.height as u64 * 4,
            actual: frame.pixels.len(),
        })
    }
}

fn create_source_texture(device: &Device, width: u32, height: u32) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("crt_source"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SOURCE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn create_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    texture: &Texture,
    sampler: &Sampler,
    uniform_buf: &Buffer,
) -> BindGroup {
    let view = texture.create_view(&Default::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("crt_bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buf.as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_two_triangles_covering_the_square() {
        assert_eq!(QUAD_VERTICES.len(), 6);
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 1.0);
    }

    #[test]
    fn short_frame_is_rejected_before_upload() {
        let pixels = [0u8; 10];
        let frame = SourceFrame {
            width: 4,
            height: 4,
            pixels: &pixels,
        };
        match check_frame(&frame) {
            Err(CrtError::IncompleteFrame { expected, actual }) => {
                assert_eq!(expected, 64);
                assert_eq!(actual, 10);
            }
            other => panic!("expected IncompleteFrame, got {other:?}"),
        }
    }

    #[test]
    fn exact_frame_passes_check() {
        let pixels = [0u8; 2 * 3 * 4];
        let frame = SourceFrame {
            width: 2,
            height: 3,
            pixels: &pixels,
        };
        assert!(check_frame(&frame).is_ok());
    }
}
