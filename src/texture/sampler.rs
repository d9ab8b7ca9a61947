//! Texture sampling and fixed-function texture environment configuration

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::texel_image::Image;
use crate::rasterizer::simd::{F32x4, Vec2x4, Vec4x4};
use crate::rasterizer::Vec4;

/// How a sampled texel is combined with the incoming fragment color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureEnvMode {
    Add,
    Blend,
    Combine,
    Decal,
    Modulate,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureCombinator {
    Add,
    AddSigned,
    Dot3RGB,
    Dot3RGBA,
    Interpolate,
    Modulate,
    Replace,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureOperand {
    SourceColor,
    OneMinusSourceColor,
    SourceAlpha,
    OneMinusSourceAlpha,
}

/// Where a combine argument comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureSource {
    /// The environment's constant color
    Constant,
    /// The color produced by the previous texture unit
    Previous,
    /// The interpolated vertex color
    PrimaryColor,
    /// This unit's texel
    Texture,
    /// The texel sampled by another unit
    TextureStage(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Fixed-function texture environment of one unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedFunctionTextureEnvironment {
    pub env_mode: TextureEnvMode,
    pub color: Vec4,
    pub rgb_combinator: TextureCombinator,
    pub rgb_source: [TextureSource; 3],
    pub rgb_operand: [TextureOperand; 3],
    pub rgb_scale: f32,
    pub alpha_combinator: TextureCombinator,
    pub alpha_source: [TextureSource; 3],
    pub alpha_operand: [TextureOperand; 3],
    pub alpha_scale: f32,
}

impl Default for FixedFunctionTextureEnvironment {
    fn default() -> Self {
        Self {
            env_mode: TextureEnvMode::Modulate,
            color: Vec4::ZERO,
            rgb_combinator: TextureCombinator::Modulate,
            rgb_source: [TextureSource::Texture, TextureSource::Previous, TextureSource::Constant],
            rgb_operand: [
                TextureOperand::SourceColor,
                TextureOperand::SourceColor,
                TextureOperand::SourceAlpha,
            ],
            rgb_scale: 1.0,
            alpha_combinator: TextureCombinator::Modulate,
            alpha_source: [TextureSource::Texture, TextureSource::Previous, TextureSource::Constant],
            alpha_operand: [TextureOperand::SourceAlpha; 3],
            alpha_scale: 1.0,
        }
    }
}

/// Sampler state of one texture unit
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub bound_image: Option<Rc<Image>>,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub filter: TextureFilter,
    pub fixed_function_texture_environment: FixedFunctionTextureEnvironment,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            bound_image: None,
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            filter: TextureFilter::Nearest,
            fixed_function_texture_environment: FixedFunctionTextureEnvironment::default(),
        }
    }
}

/// Samples the image bound to a texture unit
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    config: SamplerConfig,
}

impl Sampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SamplerConfig) {
        self.config = config;
    }

    /// Sample four texture coordinates. Without a bound image every texel is opaque white.
    pub fn sample_2d(&self, uv: Vec2x4) -> Vec4x4 {
        let Some(image) = self.config.bound_image.as_deref() else {
            return Vec4x4::splat(Vec4::ONE);
        };
        if image.width == 0 || image.height == 0 {
            return Vec4x4::splat(Vec4::ONE);
        }

        let mut out = Vec4x4::default();
        for lane in 0..4 {
            let texel = match self.config.filter {
                TextureFilter::Nearest => self.sample_nearest(image, uv.x.lane(lane), uv.y.lane(lane)),
                TextureFilter::Linear => self.sample_linear(image, uv.x.lane(lane), uv.y.lane(lane)),
            };
            out.x.0[lane] = texel.x;
            out.y.0[lane] = texel.y;
            out.z.0[lane] = texel.z;
            out.w.0[lane] = texel.w;
        }
        out
    }

    fn sample_nearest(&self, image: &Image, u: f32, v: f32) -> Vec4 {
        let x = wrap((u * image.width as f32).floor() as i64, image.width, self.config.wrap_u);
        let y = wrap((v * image.height as f32).floor() as i64, image.height, self.config.wrap_v);
        image.texel(x, y)
    }

    fn sample_linear(&self, image: &Image, u: f32, v: f32) -> Vec4 {
        let fx = u * image.width as f32 - 0.5;
        let fy = v * image.height as f32 - 0.5;
        let (x0, y0) = (fx.floor(), fy.floor());
        let (tx, ty) = (fx - x0, fy - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let fetch = |x: i64, y: i64| {
            image.texel(
                wrap(x, image.width, self.config.wrap_u),
                wrap(y, image.height, self.config.wrap_v),
            )
        };
        let top = fetch(x0, y0).mix(fetch(x0 + 1, y0), tx);
        let bottom = fetch(x0, y0 + 1).mix(fetch(x0 + 1, y0 + 1), tx);
        top.mix(bottom, ty)
    }
}

/// Map an integer texel coordinate into `0..size`
fn wrap(coord: i64, size: usize, mode: WrapMode) -> usize {
    let size = size as i64;
    match mode {
        WrapMode::Repeat => coord.rem_euclid(size) as usize,
        WrapMode::ClampToEdge => coord.clamp(0, size - 1) as usize,
        WrapMode::MirroredRepeat => {
            let period = coord.rem_euclid(2 * size);
            if period < size {
                period as usize
            } else {
                (2 * size - 1 - period) as usize
            }
        }
    }
}

/// Divide homogeneous texture coordinates by q
pub fn project_tex_coords(coords: &Vec4x4) -> Vec2x4 {
    let q = F32x4::from_fn(|i| {
        let q = coords.w.lane(i);
        if q == 0.0 { 1.0 } else { q }
    });
    Vec2x4 { x: coords.x / q, y: coords.y / q }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler_with(image: Image, wrap_mode: WrapMode) -> Sampler {
        Sampler::new(SamplerConfig {
            bound_image: Some(Rc::new(image)),
            wrap_u: wrap_mode,
            wrap_v: wrap_mode,
            ..Default::default()
        })
    }

    #[test]
    fn test_unbound_sampler_returns_white() {
        let sampler = Sampler::default();
        let texel = sampler.sample_2d(Vec2x4::default());
        assert_eq!(texel.lane(0), Vec4::ONE);
    }

    #[test]
    fn test_nearest_repeat_and_clamp() {
        let mut image = Image::new(2, 1);
        image.set_texel(0, 0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        image.set_texel(1, 0, Vec4::new(0.0, 1.0, 0.0, 1.0));

        let uv = Vec2x4 { x: F32x4([0.25, 0.75, 1.25, -0.25]), y: F32x4::ZERO };

        let repeat = sampler_with(image.clone(), WrapMode::Repeat).sample_2d(uv);
        assert_eq!(repeat.x, F32x4([1.0, 0.0, 1.0, 0.0]));

        let clamp = sampler_with(image, WrapMode::ClampToEdge).sample_2d(uv);
        assert_eq!(clamp.x, F32x4([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_mirrored_wrap() {
        assert_eq!(wrap(4, 4, WrapMode::MirroredRepeat), 3);
        assert_eq!(wrap(-1, 4, WrapMode::MirroredRepeat), 0);
        assert_eq!(wrap(9, 4, WrapMode::MirroredRepeat), 1);
    }

    #[test]
    fn test_projective_divide() {
        let coords = Vec4x4::splat(Vec4::new(1.0, 0.5, 0.0, 2.0));
        let uv = project_tex_coords(&coords);
        assert_eq!(uv.x.lane(0), 0.5);
        assert_eq!(uv.y.lane(0), 0.25);
    }
}
