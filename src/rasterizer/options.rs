//! Rasterizer state: test functions, blend factors, stencil and fog configuration
//!
//! Everything here is plain data. The device takes a snapshot with
//! `set_options` and never mutates it during a draw.

use serde::{Deserialize, Serialize};

use super::math::{IntRect, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlphaTestFunction {
    Always,
    Never,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthTestFunction {
    Always,
    Never,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StencilTestFunction {
    Always,
    Never,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    DstColor,
    OneMinusDstColor,
    SrcAlphaSaturate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FogMode {
    Linear,
    Exp,
    Exp2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindingOrder {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMaterialFace {
    Front,
    Back,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMaterialMode {
    Ambient,
    AmbientAndDiffuse,
    Diffuse,
    Emissive,
    Specular,
}

/// Per-face stencil state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfiguration {
    pub test_function: StencilTestFunction,
    pub reference_value: u8,
    pub test_mask: u8,
    pub write_mask: u8,
    pub on_stencil_test_fail: StencilOperation,
    pub on_depth_test_fail: StencilOperation,
    pub on_pass: StencilOperation,
}

impl Default for StencilConfiguration {
    fn default() -> Self {
        Self {
            test_function: StencilTestFunction::Always,
            reference_value: 0,
            test_mask: 0xff,
            write_mask: 0xff,
            on_stencil_test_fail: StencilOperation::Keep,
            on_depth_test_fail: StencilOperation::Keep,
            on_pass: StencilOperation::Keep,
        }
    }
}

/// Snapshot of all test / blend / viewport / fog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizerOptions {
    pub shade_smooth: bool,

    pub enable_stencil_test: bool,

    pub enable_depth_test: bool,
    pub enable_depth_write: bool,
    pub depth_func: DepthTestFunction,
    pub depth_min: f32,
    pub depth_max: f32,
    pub depth_offset_enabled: bool,
    pub depth_offset_factor: f32,
    pub depth_offset_constant: f32,

    pub enable_alpha_test: bool,
    pub alpha_test_func: AlphaTestFunction,
    pub alpha_test_ref_value: f32,

    pub enable_blending: bool,
    pub blend_source_factor: BlendFactor,
    pub blend_destination_factor: BlendFactor,

    /// Bit mask over the packed ARGB32 color
    pub color_mask: u32,
    pub enable_color_write: bool,

    pub fog_enabled: bool,
    pub fog_mode: FogMode,
    pub fog_color: Vec4,
    pub fog_density: f32,
    pub fog_start: f32,
    pub fog_end: f32,

    pub scissor_enabled: bool,
    pub scissor_box: IntRect,
    pub viewport: IntRect,

    pub normalization_enabled: bool,

    pub enable_culling: bool,
    pub front_face: WindingOrder,
    pub cull_back: bool,
    pub cull_front: bool,

    pub lighting_enabled: bool,
    pub color_material_enabled: bool,
    pub color_material_face: ColorMaterialFace,
    pub color_material_mode: ColorMaterialMode,

    pub line_smooth: bool,
    pub line_width: f32,
    pub point_smooth: bool,
    pub point_size: f32,
}

impl Default for RasterizerOptions {
    fn default() -> Self {
        Self {
            shade_smooth: true,
            enable_stencil_test: false,
            enable_depth_test: false,
            enable_depth_write: true,
            depth_func: DepthTestFunction::Less,
            depth_min: 0.0,
            depth_max: 1.0,
            depth_offset_enabled: false,
            depth_offset_factor: 0.0,
            depth_offset_constant: 0.0,
            enable_alpha_test: false,
            alpha_test_func: AlphaTestFunction::Always,
            alpha_test_ref_value: 0.0,
            enable_blending: false,
            blend_source_factor: BlendFactor::One,
            blend_destination_factor: BlendFactor::Zero,
            color_mask: 0xffff_ffff,
            enable_color_write: true,
            fog_enabled: false,
            fog_mode: FogMode::Exp,
            fog_color: Vec4::ZERO,
            fog_density: 1.0,
            fog_start: 0.0,
            fog_end: 1.0,
            scissor_enabled: false,
            scissor_box: IntRect::default(),
            viewport: IntRect::default(),
            normalization_enabled: false,
            enable_culling: false,
            front_face: WindingOrder::CounterClockwise,
            cull_back: true,
            cull_front: false,
            lighting_enabled: false,
            color_material_enabled: false,
            color_material_face: ColorMaterialFace::FrontAndBack,
            color_material_mode: ColorMaterialMode::AmbientAndDiffuse,
            line_smooth: false,
            line_width: 1.0,
            point_smooth: false,
            point_size: 1.0,
        }
    }
}

impl RasterizerOptions {
    /// True when alpha testing rejects every fragment
    pub fn alpha_test_rejects_all(&self) -> bool {
        self.enable_alpha_test && self.alpha_test_func == AlphaTestFunction::Never
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_parse_with_defaults() {
        let options: RasterizerOptions =
            ron::from_str("(enable_depth_test: true, depth_func: LessOrEqual)").expect("parse");
        assert!(options.enable_depth_test);
        assert_eq!(options.depth_func, DepthTestFunction::LessOrEqual);
        assert_eq!(options.color_mask, 0xffff_ffff);
        assert!(options.enable_depth_write);
    }
}
