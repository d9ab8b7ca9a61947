//! Fixed-function fragment shading: texture environment chain and fog

use super::options::FogMode;
use super::quad::{PixelQuad, SHADER_INPUT_FIRST_TEXCOORD, SHADER_INPUT_VERTEX_COLOR, SHADER_OUTPUT_FIRST_COLOR};
use super::simd::{F32x4, Vec4x4};
use super::{Vec4, NUM_TEXTURE_UNITS};
use crate::device::Device;
use crate::texture::{
    project_tex_coords, FixedFunctionTextureEnvironment, TextureCombinator, TextureEnvMode, TextureOperand,
    TextureSource,
};

/// Colors a combine stage can draw its arguments from
struct CombineInputs<'a> {
    primary: Vec4x4,
    previous: Vec4x4,
    texel: Vec4x4,
    texels: &'a [Vec4x4; NUM_TEXTURE_UNITS],
    constant: Vec4x4,
}

impl CombineInputs<'_> {
    fn source(&self, source: TextureSource) -> Vec4x4 {
        match source {
            TextureSource::Constant => self.constant,
            TextureSource::Previous => self.previous,
            TextureSource::PrimaryColor => self.primary,
            TextureSource::Texture => self.texel,
            TextureSource::TextureStage(unit) => self.texels.get(unit).copied().unwrap_or_default(),
        }
    }
}

fn apply_operand(value: Vec4x4, operand: TextureOperand) -> Vec4x4 {
    let one = Vec4x4::splat(Vec4::ONE);
    match operand {
        TextureOperand::SourceColor => value,
        TextureOperand::OneMinusSourceColor => one - value,
        TextureOperand::SourceAlpha => Vec4x4::broadcast(value.w),
        TextureOperand::OneMinusSourceAlpha => Vec4x4::broadcast(1.0 - value.w),
    }
}

fn apply_combinator(combinator: TextureCombinator, args: [Vec4x4; 3]) -> Vec4x4 {
    let [a0, a1, a2] = args;
    let half = Vec4x4::splat(Vec4::splat(0.5));
    match combinator {
        TextureCombinator::Add => a0 + a1,
        TextureCombinator::AddSigned => a0 + a1 - half,
        TextureCombinator::Dot3RGB | TextureCombinator::Dot3RGBA => {
            let (c0, c1) = (a0 - half, a1 - half);
            let dot = (c0.x * c1.x + c0.y * c1.y + c0.z * c1.z) * 4.0;
            Vec4x4::broadcast(dot)
        }
        TextureCombinator::Interpolate => a0 * a2 + a1 * (Vec4x4::splat(Vec4::ONE) - a2),
        TextureCombinator::Modulate => a0 * a1,
        TextureCombinator::Replace => a0,
        TextureCombinator::Subtract => a0 - a1,
    }
}

/// Evaluate a `Combine` environment; RGB and alpha are computed independently
fn combine(env: &FixedFunctionTextureEnvironment, inputs: &CombineInputs) -> Vec4x4 {
    let rgb_args: [Vec4x4; 3] =
        std::array::from_fn(|i| apply_operand(inputs.source(env.rgb_source[i]), env.rgb_operand[i]));
    let rgb = apply_combinator(env.rgb_combinator, rgb_args);

    let alpha = if env.rgb_combinator == TextureCombinator::Dot3RGBA {
        rgb.w
    } else {
        let alpha_args: [Vec4x4; 3] =
            std::array::from_fn(|i| apply_operand(inputs.source(env.alpha_source[i]), env.alpha_operand[i]));
        apply_combinator(env.alpha_combinator, alpha_args).w
    };

    Vec4x4 {
        x: (rgb.x * env.rgb_scale).clamp(0.0, 1.0),
        y: (rgb.y * env.rgb_scale).clamp(0.0, 1.0),
        z: (rgb.z * env.rgb_scale).clamp(0.0, 1.0),
        w: (alpha * env.alpha_scale).clamp(0.0, 1.0),
    }
}

/// Fog blend factor; 1 keeps the fragment color, 0 is fully fogged
pub fn fog_factor(mode: FogMode, depth: F32x4, density: f32, start: f32, end: f32) -> F32x4 {
    let factor = match mode {
        FogMode::Linear => {
            let range = end - start;
            if range == 0.0 {
                F32x4::ONE
            } else {
                (F32x4::splat(end) - depth) / range
            }
        }
        FogMode::Exp => (depth * -density).exp(),
        FogMode::Exp2 => {
            let d = depth * density;
            (d * d * -1.0).exp()
        }
    };
    factor.clamp(0.0, 1.0)
}

impl Device {
    /// Compute the fragment color of every lane from the quad's shader inputs
    pub(crate) fn shade_fragments(&self, quad: &mut PixelQuad) {
        if let Some(shader) = self.fragment_shader.as_ref() {
            shader.execute(quad);
            return;
        }

        let primary_color = quad.input_vec4(SHADER_INPUT_VERTEX_COLOR);
        let mut current_color = primary_color;

        // Combine stages may read any unit's texel, so sample them all first
        let mut texels = [Vec4x4::default(); NUM_TEXTURE_UNITS];
        for (unit, texel) in texels.iter_mut().enumerate() {
            if !self.texture_unit_configuration[unit].enabled {
                continue;
            }
            let tex_coords = quad.input_vec4(SHADER_INPUT_FIRST_TEXCOORD + unit * 4);
            *texel = self.samplers[unit].sample_2d(project_tex_coords(&tex_coords));
        }

        for unit in 0..NUM_TEXTURE_UNITS {
            if !self.texture_unit_configuration[unit].enabled {
                continue;
            }

            let env = &self.samplers[unit].config().fixed_function_texture_environment;
            let texel = texels[unit];

            current_color = match env.env_mode {
                TextureEnvMode::Modulate => current_color * texel,
                TextureEnvMode::Replace => texel,
                TextureEnvMode::Decal => Vec4x4 {
                    x: F32x4::mix(current_color.x, texel.x, texel.w),
                    y: F32x4::mix(current_color.y, texel.y, texel.w),
                    z: F32x4::mix(current_color.z, texel.z, texel.w),
                    w: current_color.w,
                },
                TextureEnvMode::Add => Vec4x4 {
                    x: current_color.x + texel.x,
                    y: current_color.y + texel.y,
                    z: current_color.z + texel.z,
                    w: current_color.w * texel.w,
                },
                TextureEnvMode::Blend => {
                    let constant = Vec4x4::splat(env.color);
                    Vec4x4 {
                        x: F32x4::mix(current_color.x, constant.x, texel.x),
                        y: F32x4::mix(current_color.y, constant.y, texel.y),
                        z: F32x4::mix(current_color.z, constant.z, texel.z),
                        w: current_color.w * texel.w,
                    }
                }
                TextureEnvMode::Combine => combine(
                    env,
                    &CombineInputs {
                        primary: primary_color,
                        previous: current_color,
                        texel,
                        texels: &texels,
                        constant: Vec4x4::splat(env.color),
                    },
                ),
            };
        }

        // Fog only affects RGB
        if self.options.fog_enabled {
            let factor = fog_factor(
                self.options.fog_mode,
                quad.fog_depth,
                self.options.fog_density,
                self.options.fog_start,
                self.options.fog_end,
            );
            let fog_color = Vec4x4::splat(self.options.fog_color);
            current_color.x = F32x4::mix(fog_color.x, current_color.x, factor);
            current_color.y = F32x4::mix(fog_color.y, current_color.y, factor);
            current_color.z = F32x4::mix(fog_color.z, current_color.z, factor);
        }

        current_color.w = current_color.w * quad.coverage;
        quad.set_output_vec4(SHADER_OUTPUT_FIRST_COLOR, current_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::device::TextureUnitConfiguration;
    use crate::rasterizer::simd::Mask4;
    use crate::texture::{Image, SamplerConfig};

    fn quad_with_color(color: Vec4) -> PixelQuad {
        let mut quad = PixelQuad::new(0, 0);
        quad.set_coverage_mask(Mask4::ALL);
        quad.set_input_vec4(SHADER_INPUT_VERTEX_COLOR, Vec4x4::splat(color));
        quad.set_input_vec4(SHADER_INPUT_FIRST_TEXCOORD, Vec4x4::splat(Vec4::new(0.5, 0.5, 0.0, 1.0)));
        quad
    }

    fn device_with_texture(texel: Vec4, env: FixedFunctionTextureEnvironment) -> Device {
        let mut device = Device::new(4, 4);
        device.set_sampler_config(
            0,
            SamplerConfig {
                bound_image: Some(Rc::new(Image::solid(texel))),
                fixed_function_texture_environment: env,
                ..Default::default()
            },
        );
        device.set_texture_unit_configuration(0, TextureUnitConfiguration { enabled: true, ..Default::default() });
        device
    }

    fn env(mode: TextureEnvMode) -> FixedFunctionTextureEnvironment {
        FixedFunctionTextureEnvironment { env_mode: mode, ..Default::default() }
    }

    fn assert_close(actual: Vec4, expected: Vec4) {
        for i in 0..4 {
            assert!(
                (actual.get(i) - expected.get(i)).abs() < 1e-5,
                "component {i}: {actual:?} != {expected:?}"
            );
        }
    }

    #[test]
    fn test_untextured_output_is_primary_color() {
        let device = Device::new(4, 4);
        let color = Vec4::new(0.25, 0.5, 0.75, 1.0);
        let mut quad = quad_with_color(color);
        device.shade_fragments(&mut quad);
        assert_eq!(quad.output_vec4(SHADER_OUTPUT_FIRST_COLOR).lane(0), color);
    }

    #[test]
    fn test_coverage_scales_alpha_only() {
        let device = Device::new(4, 4);
        let mut quad = quad_with_color(Vec4::new(1.0, 1.0, 1.0, 0.8));
        quad.coverage = F32x4([1.0, 0.5, 0.0, 0.25]);
        device.shade_fragments(&mut quad);
        let out = quad.output_vec4(SHADER_OUTPUT_FIRST_COLOR);
        assert_close(out.lane(1), Vec4::new(1.0, 1.0, 1.0, 0.4));
        assert_close(out.lane(3), Vec4::new(1.0, 1.0, 1.0, 0.2));
    }

    #[test]
    fn test_modulate_replace_decal() {
        let texel = Vec4::new(0.5, 1.0, 0.0, 0.5);
        let color = Vec4::new(1.0, 0.5, 1.0, 1.0);

        let device = device_with_texture(texel, env(TextureEnvMode::Modulate));
        let mut quad = quad_with_color(color);
        device.shade_fragments(&mut quad);
        assert_close(quad.output_vec4(0).lane(0), Vec4::new(0.5, 0.5, 0.0, 0.5));

        let device = device_with_texture(texel, env(TextureEnvMode::Replace));
        let mut quad = quad_with_color(color);
        device.shade_fragments(&mut quad);
        assert_close(quad.output_vec4(0).lane(0), texel);

        let device = device_with_texture(texel, env(TextureEnvMode::Decal));
        let mut quad = quad_with_color(color);
        device.shade_fragments(&mut quad);
        assert_close(quad.output_vec4(0).lane(0), Vec4::new(0.75, 0.75, 0.5, 1.0));
    }

    #[test]
    fn test_add_and_blend_env() {
        let texel = Vec4::new(0.25, 0.5, 1.0, 0.5);
        let color = Vec4::new(0.25, 0.25, 0.0, 1.0);

        let device = device_with_texture(texel, env(TextureEnvMode::Add));
        let mut quad = quad_with_color(color);
        device.shade_fragments(&mut quad);
        assert_close(quad.output_vec4(0).lane(0), Vec4::new(0.5, 0.75, 1.0, 0.5));

        let blend = FixedFunctionTextureEnvironment {
            env_mode: TextureEnvMode::Blend,
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            ..Default::default()
        };
        let device = device_with_texture(texel, blend);
        let mut quad = quad_with_color(color);
        device.shade_fragments(&mut quad);
        assert_close(quad.output_vec4(0).lane(0), Vec4::new(0.4375, 0.625, 1.0, 0.5));
    }

    #[test]
    fn test_combine_interpolate_and_scale() {
        let combine_env = FixedFunctionTextureEnvironment {
            env_mode: TextureEnvMode::Combine,
            color: Vec4::new(0.0, 0.0, 0.0, 0.25),
            rgb_combinator: TextureCombinator::Interpolate,
            rgb_source: [TextureSource::Texture, TextureSource::PrimaryColor, TextureSource::Constant],
            rgb_operand: [TextureOperand::SourceColor, TextureOperand::SourceColor, TextureOperand::SourceAlpha],
            alpha_combinator: TextureCombinator::Replace,
            alpha_source: [TextureSource::PrimaryColor; 3],
            alpha_scale: 2.0,
            ..Default::default()
        };
        let device = device_with_texture(Vec4::new(1.0, 1.0, 1.0, 1.0), combine_env);
        let mut quad = quad_with_color(Vec4::new(0.0, 0.4, 0.8, 0.75));
        device.shade_fragments(&mut quad);
        // rgb = tex * 0.25 + primary * 0.75, alpha = 0.75 * 2 clamped
        assert_close(quad.output_vec4(0).lane(0), Vec4::new(0.25, 0.55, 0.85, 1.0));
    }

    #[test]
    fn test_combine_dot3_rgba_broadcasts() {
        let combine_env = FixedFunctionTextureEnvironment {
            env_mode: TextureEnvMode::Combine,
            rgb_combinator: TextureCombinator::Dot3RGBA,
            rgb_source: [TextureSource::Texture, TextureSource::PrimaryColor, TextureSource::Constant],
            rgb_operand: [TextureOperand::SourceColor; 3],
            ..Default::default()
        };
        let device = device_with_texture(Vec4::new(1.0, 0.5, 0.5, 1.0), combine_env);
        let mut quad = quad_with_color(Vec4::new(0.75, 0.5, 0.5, 0.1));
        device.shade_fragments(&mut quad);
        // 4 * (0.5 * 0.25) = 0.5 in every channel, alpha included
        assert_close(quad.output_vec4(0).lane(0), Vec4::splat(0.5));
    }

    #[test]
    fn test_linear_fog_mixes_rgb_only() {
        let mut device = Device::new(4, 4);
        let mut options = device.options().clone();
        options.fog_enabled = true;
        options.fog_mode = FogMode::Linear;
        options.fog_start = 0.0;
        options.fog_end = 10.0;
        options.fog_color = Vec4::new(1.0, 1.0, 1.0, 0.0);
        device.set_options(options);

        let mut quad = quad_with_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
        quad.fog_depth = F32x4([0.0, 5.0, 10.0, 20.0]);
        device.shade_fragments(&mut quad);
        let out = quad.output_vec4(0);
        assert_close(out.lane(0), Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_close(out.lane(1), Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_close(out.lane(2), Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_close(out.lane(3), Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_fog_factor_modes() {
        let depth = F32x4::splat(1.0);
        let exp = fog_factor(FogMode::Exp, depth, 2.0, 0.0, 1.0);
        assert!((exp.lane(0) - (-2.0f32).exp()).abs() < 1e-6);
        let exp2 = fog_factor(FogMode::Exp2, depth, 2.0, 0.0, 1.0);
        assert!((exp2.lane(0) - (-4.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_bound_shader_replaces_fixed_function() {
        let mut device = Device::new(4, 4);
        device.bind_fragment_shader(Some(Rc::new(|quad: &mut PixelQuad| {
            quad.set_output_vec4(SHADER_OUTPUT_FIRST_COLOR, Vec4x4::splat(Vec4::new(0.0, 1.0, 0.0, 1.0)));
        })));
        let mut quad = quad_with_color(Vec4::ONE);
        quad.coverage = F32x4::splat(0.5);
        device.shade_fragments(&mut quad);
        assert_eq!(quad.output_vec4(0).lane(0), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }
}
