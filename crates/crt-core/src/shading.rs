//! CPU reference for the CRT fragment shader.
//!
//! Every function mirrors one stage of `crt.wgsl` in the GPU crate and runs
//! in the same order, so the two can be compared pixel for pixel. Sampling
//! follows GL `LINEAR` + `CLAMP_TO_EDGE` on an RGBA8 texture.

use glam::{Vec2, Vec3, Vec4};

use crate::{FrameRenderer, FrameUniforms, SourceFrame};

// ---------------------------------------------------------------------------
// Rgba8Image — a borrowed texture with bilinear, edge-clamped sampling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Rgba8Image<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> Rgba8Image<'a> {
    /// `None` unless `pixels` holds exactly `width * height` RGBA texels.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Option<Self> {
        Self::from_frame(SourceFrame {
            width,
            height,
            pixels,
        })
    }

    pub fn from_frame(frame: SourceFrame<'a>) -> Option<Self> {
        frame.is_complete().then_some(Self {
            width: frame.width,
            height: frame.height,
            pixels: frame.pixels,
        })
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        let p = &self.pixels[i..i + 4];
        Vec4::new(p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32) / 255.0
    }

    /// Bilinear sample at normalised coordinates; (0, 0) is the top-left
    /// corner of the first row.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.width == 0 || self.height == 0 {
            return Vec4::ZERO;
        }
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (ix, iy) = (x0 as i64, y0 as i64);

        let top = self.texel(ix, iy).lerp(self.texel(ix + 1, iy), fx);
        let bottom = self.texel(ix, iy + 1).lerp(self.texel(ix + 1, iy + 1), fx);
        top.lerp(bottom, fy)
    }
}

// ---------------------------------------------------------------------------
// Shader stages
// ---------------------------------------------------------------------------

pub fn barrel_distortion(uv: Vec2, amount: f32) -> Vec2 {
    let centered = uv - Vec2::splat(0.5);
    uv + centered * centered.dot(centered) * amount
}

/// `fract(sin(dot(uv, (12.9898, 78.233))) * 43758.5453)`
pub fn noise_hash(uv: Vec2) -> f32 {
    fract(uv.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.5453)
}

pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// GLSL `mod`: floored, so the result takes the sign of `y`.
pub fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn retrace_factor(v: f32, time: f32) -> f32 {
    0.9 + 0.1 * (v * 800.0 + time * 10.0).sin()
}

/// Red untouched, green keyed on U, blue keyed on V.
pub fn dot_mask_factor(uv: Vec2) -> Vec3 {
    Vec3::new(
        1.0,
        0.9 + 0.1 * glsl_mod(uv.x * 100.0, 2.0),
        0.9 + 0.1 * glsl_mod(uv.y * 100.0, 2.0),
    )
}

/// Texture coordinate the vertex stage interpolates to at the centre of
/// output pixel (`px`, `py`).
pub fn pixel_tex_coord(px: u32, py: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (px as f32 + 0.5) / width as f32,
        (py as f32 + 0.5) / height as f32,
    )
}

/// Run the whole fragment stage for one texture coordinate.
pub fn shade(image: &Rgba8Image<'_>, tex_coord: Vec2, u: &FrameUniforms) -> Vec4 {
    let mut uv = barrel_distortion(tex_coord, u.barrel);

    let offset = Vec2::new(u.aberration, 0.0);
    let mut col = Vec3::new(
        image.sample(uv + offset).x,
        image.sample(uv).y,
        image.sample(uv - offset).z,
    );

    col += Vec3::splat((noise_hash(uv) - 0.5) * u.noise);

    // Tearing compounds a second fetch onto the colour so far.
    uv.x += (uv.y * 10.0 + u.time * 2.0).sin() * u.tearing;
    col *= image.sample(uv).truncate();

    col += u.glow
        * Vec3::new(
            smoothstep(0.5, 1.0, col.x),
            smoothstep(0.5, 1.0, col.y),
            smoothstep(0.5, 1.0, col.z),
        );

    // Jitter lands after every texture fetch; only retrace and mask see it.
    uv.y += (u.time * 5.0).sin() * u.jitter;

    if u.retrace {
        col *= retrace_factor(uv.y, u.time);
    }
    if u.dot_mask {
        col *= dot_mask_factor(uv);
    }

    col.extend(1.0)
}

fn to_unorm8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

// ---------------------------------------------------------------------------
// CpuRenderer
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ShadingError {
    #[error("source frame holds {actual} bytes, expected {expected}")]
    IncompleteFrame { expected: u64, actual: usize },
}

/// Software stand-in for the shader surface: shades every output pixel into
/// an RGBA8 buffer of fixed size.
#[derive(Debug)]
pub struct CpuRenderer {
    width: u32,
    height: u32,
    output: Vec<u8>,
}

impl CpuRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            output: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The last drawn frame, RGBA8, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.output
    }
}

impl FrameRenderer for CpuRenderer {
    type Error = ShadingError;

    fn draw(&mut self, frame: SourceFrame<'_>, uniforms: &FrameUniforms) -> Result<(), Self::Error> {
        let image = Rgba8Image::from_frame(frame).ok_or(ShadingError::IncompleteFrame {
            expected: frame.width as u64 * frame.height as u64 * 4,
            actual: frame.pixels.len(),
        })?;

        for py in 0..self.height {
            for px in 0..self.width {
                let uv = pixel_tex_coord(px, py, self.width, self.height);
                let c = shade(&image, uv, uniforms);
                let i = (py as usize * self.width as usize + px as usize) * 4;
                self.output[i] = to_unorm8(c.x);
                self.output[i + 1] = to_unorm8(c.y);
                self.output[i + 2] = to_unorm8(c.z);
                self.output[i + 3] = 255;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
