//! Blend factor precomputation and the additive blend equation
//!
//! Every supported factor is a linear combination of a constant and the
//! source/destination color and alpha, so the factors are resolved once into
//! weights and each quad blends with the same arithmetic.

use super::math::Vec4;
use super::options::BlendFactor;
use super::simd::{F32x4, Vec4x4};

/// Weights of one blend factor: `constant + src*sc + src.a*sa + dst*dc + dst.a*da`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorWeights {
    pub constant: Vec4,
    pub src_color: f32,
    pub src_alpha: f32,
    pub dst_color: f32,
    pub dst_alpha: f32,
    /// `(f, f, f, 1)` with `f = min(src.a, 1 - dst.a)`; not expressible as weights
    pub saturate: bool,
}

impl FactorWeights {
    pub fn from_factor(factor: BlendFactor) -> Self {
        let mut w = FactorWeights::default();
        match factor {
            BlendFactor::Zero => {}
            BlendFactor::One => w.constant = Vec4::ONE,
            BlendFactor::SrcColor => w.src_color = 1.0,
            BlendFactor::OneMinusSrcColor => {
                w.constant = Vec4::ONE;
                w.src_color = -1.0;
            }
            BlendFactor::SrcAlpha => w.src_alpha = 1.0,
            BlendFactor::OneMinusSrcAlpha => {
                w.constant = Vec4::ONE;
                w.src_alpha = -1.0;
            }
            BlendFactor::DstAlpha => w.dst_alpha = 1.0,
            BlendFactor::OneMinusDstAlpha => {
                w.constant = Vec4::ONE;
                w.dst_alpha = -1.0;
            }
            BlendFactor::DstColor => w.dst_color = 1.0,
            BlendFactor::OneMinusDstColor => {
                w.constant = Vec4::ONE;
                w.dst_color = -1.0;
            }
            BlendFactor::SrcAlphaSaturate => w.saturate = true,
        }
        w
    }

    fn evaluate(&self, src: &Vec4x4, dst: &Vec4x4) -> Vec4x4 {
        if self.saturate {
            let f = F32x4::from_fn(|i| src.w.lane(i).min(1.0 - dst.w.lane(i)));
            return Vec4x4 { x: f, y: f, z: f, w: F32x4::ONE };
        }
        Vec4x4::splat(self.constant)
            + *src * self.src_color
            + Vec4x4::broadcast(src.w) * self.src_alpha
            + *dst * self.dst_color
            + Vec4x4::broadcast(dst.w) * self.dst_alpha
    }
}

/// Source and destination blend weights resolved from the current options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlphaBlendFactors {
    pub src: FactorWeights,
    pub dst: FactorWeights,
}

impl AlphaBlendFactors {
    pub fn new(source: BlendFactor, destination: BlendFactor) -> Self {
        Self {
            src: FactorWeights::from_factor(source),
            dst: FactorWeights::from_factor(destination),
        }
    }

    /// `src * src_factor + dst * dst_factor`
    pub fn blend(&self, src: &Vec4x4, dst: &Vec4x4) -> Vec4x4 {
        let src_factor = self.src.evaluate(src, dst);
        let dst_factor = self.dst.evaluate(src, dst);
        *src * src_factor + *dst * dst_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(v: Vec4) -> Vec4x4 {
        Vec4x4::splat(v)
    }

    #[test]
    fn test_one_zero_yields_source_exactly() {
        let factors = AlphaBlendFactors::new(BlendFactor::One, BlendFactor::Zero);
        let src = quad(Vec4::new(0.1, 0.2, 0.3, 0.4));
        let dst = quad(Vec4::new(0.9, 0.8, 0.7, 0.6));
        assert_eq!(factors.blend(&src, &dst), src);
    }

    #[test]
    fn test_zero_factor_contributes_nothing() {
        let factors = AlphaBlendFactors::new(BlendFactor::Zero, BlendFactor::One);
        let src = quad(Vec4::new(0.1, 0.2, 0.3, 0.4));
        let dst = quad(Vec4::new(0.9, 0.8, 0.7, 0.6));
        assert_eq!(factors.blend(&src, &dst), dst);
    }

    #[test]
    fn test_src_alpha_over() {
        let factors = AlphaBlendFactors::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        let src = quad(Vec4::new(1.0, 0.0, 0.0, 0.25));
        let dst = quad(Vec4::new(0.0, 0.0, 1.0, 1.0));
        let out = factors.blend(&src, &dst).lane(0);
        assert!((out.x - 0.25).abs() < 1e-6);
        assert!((out.z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_src_alpha_saturate() {
        let factors = AlphaBlendFactors::new(BlendFactor::SrcAlphaSaturate, BlendFactor::Zero);
        let src = quad(Vec4::new(1.0, 1.0, 1.0, 0.75));
        let dst = quad(Vec4::new(0.0, 0.0, 0.0, 0.5));
        let out = factors.blend(&src, &dst).lane(0);
        assert_eq!(out, Vec4::new(0.5, 0.5, 0.5, 0.75));
    }

    #[test]
    fn test_dst_color_modulates() {
        let factors = AlphaBlendFactors::new(BlendFactor::DstColor, BlendFactor::Zero);
        let src = quad(Vec4::new(0.5, 1.0, 1.0, 1.0));
        let dst = quad(Vec4::new(0.5, 0.25, 0.0, 1.0));
        let out = factors.blend(&src, &dst).lane(3);
        assert_eq!(out, Vec4::new(0.25, 0.25, 0.0, 1.0));
    }
}
