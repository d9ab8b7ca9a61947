//! The software GPU device
//!
//! `Device` owns the framebuffer and every piece of fixed-function state. State
//! setters replace values wholesale; `draw_primitives` runs the vertex stage,
//! primitive assembly, clipping and rasterization to completion.

mod blit;
mod clipper;
mod draw;
mod lighting;
mod stats;
mod texgen;

use std::rc::Rc;

use image::RgbaImage;

pub use blit::*;
pub use clipper::*;
pub use draw::RasterPosition;
pub use lighting::*;
pub use stats::*;
pub use texgen::*;

use crate::rasterizer::{
    AlphaBlendFactors, Color, Face, FrameBuffer, IntRect, Mat4, PrimitiveType, RasterizerOptions,
    StencilConfiguration, Vec4, Vertex, MAX_CLIP_PLANES, NUM_LIGHTS, NUM_TEXTURE_UNITS,
};
use crate::shader::FragmentShader;
use crate::texture::{Sampler, SamplerConfig};

/// Drawing capability shared by rendering backends
pub trait RenderDevice {
    fn draw_primitives(&mut self, primitive_type: PrimitiveType, vertices: &[Vertex]);
    fn clear_color(&mut self, color: Vec4);
    fn clear_depth(&mut self, depth: f32);
    fn clear_stencil(&mut self, value: u8);
    fn blit_from_color_buffer(&self, target: &mut RgbaImage);
    fn resize(&mut self, width: usize, height: usize);
}

/// Software GPU: framebuffer plus fixed-function pipeline state
pub struct Device {
    pub(crate) frame_buffer: FrameBuffer,
    pub(crate) options: RasterizerOptions,
    pub(crate) lighting_model: LightModelParameters,
    pub(crate) materials: [Material; 2],
    pub(crate) lights: [Light; NUM_LIGHTS],
    pub(crate) stencil_configuration: [StencilConfiguration; 2],
    pub(crate) texture_unit_configuration: [TextureUnitConfiguration; NUM_TEXTURE_UNITS],
    pub(crate) samplers: [Sampler; NUM_TEXTURE_UNITS],
    pub(crate) model_view_transform: Mat4,
    pub(crate) projection_transform: Mat4,
    pub(crate) clip_planes: Vec<Vec4>,
    pub(crate) clipper: Clipper,
    pub(crate) fragment_shader: Option<Rc<dyn FragmentShader>>,
    pub(crate) alpha_blend_factors: AlphaBlendFactors,
    pub(crate) raster_position: RasterPosition,
    pub(crate) statistics: Statistics,
}

impl Device {
    /// Create a device with a `width` x `height` framebuffer and default state.
    /// The viewport and scissor box cover the whole framebuffer.
    pub fn new(width: usize, height: usize) -> Self {
        let frame_buffer = FrameBuffer::new(width, height);
        let options = RasterizerOptions {
            viewport: frame_buffer.rect(),
            scissor_box: frame_buffer.rect(),
            ..Default::default()
        };
        let alpha_blend_factors = AlphaBlendFactors::new(options.blend_source_factor, options.blend_destination_factor);
        log::info!("created software GPU device ({width}x{height})");

        Self {
            frame_buffer,
            options,
            lighting_model: LightModelParameters::default(),
            materials: [Material::default(); 2],
            lights: [Light::default(); NUM_LIGHTS],
            stencil_configuration: [StencilConfiguration::default(); 2],
            texture_unit_configuration: [TextureUnitConfiguration::default(); NUM_TEXTURE_UNITS],
            samplers: std::array::from_fn(|_| Sampler::default()),
            model_view_transform: Mat4::IDENTITY,
            projection_transform: Mat4::IDENTITY,
            clip_planes: Vec::new(),
            clipper: Clipper::new(),
            fragment_shader: None,
            alpha_blend_factors,
            raster_position: RasterPosition::default(),
            statistics: Statistics::default(),
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn options(&self) -> &RasterizerOptions {
        &self.options
    }

    /// Replace all rasterizer options; blend factors are recomputed here
    pub fn set_options(&mut self, options: RasterizerOptions) {
        self.alpha_blend_factors = AlphaBlendFactors::new(options.blend_source_factor, options.blend_destination_factor);
        self.options = options;
    }

    pub fn set_light_model_params(&mut self, params: LightModelParameters) {
        self.lighting_model = params;
    }

    /// # Panics
    /// If `unit` is not a valid texture unit.
    pub fn set_sampler_config(&mut self, unit: usize, config: SamplerConfig) {
        assert!(unit < NUM_TEXTURE_UNITS, "texture unit {unit} out of range");
        self.samplers[unit].set_config(config);
    }

    pub fn sampler(&self, unit: usize) -> &Sampler {
        &self.samplers[unit]
    }

    pub fn set_light_state(&mut self, light: usize, state: Light) {
        assert!(light < NUM_LIGHTS, "light {light} out of range");
        self.lights[light] = state;
    }

    pub fn set_material_state(&mut self, face: Face, material: Material) {
        self.materials[face as usize] = material;
    }

    pub fn set_stencil_configuration(&mut self, face: Face, configuration: StencilConfiguration) {
        self.stencil_configuration[face as usize] = configuration;
    }

    pub fn set_texture_unit_configuration(&mut self, unit: usize, configuration: TextureUnitConfiguration) {
        assert!(unit < NUM_TEXTURE_UNITS, "texture unit {unit} out of range");
        self.texture_unit_configuration[unit] = configuration;
    }

    pub fn set_model_view_transform(&mut self, transform: Mat4) {
        self.model_view_transform = transform;
    }

    pub fn set_projection_transform(&mut self, transform: Mat4) {
        self.projection_transform = transform;
    }

    /// Eye-space user clip planes; at most `MAX_CLIP_PLANES`
    pub fn set_clip_planes(&mut self, planes: &[Vec4]) {
        assert!(planes.len() <= MAX_CLIP_PLANES, "too many clip planes ({})", planes.len());
        self.clip_planes = planes.to_vec();
    }

    /// Bind a programmable fragment shader, or `None` for fixed-function shading
    pub fn bind_fragment_shader(&mut self, shader: Option<Rc<dyn FragmentShader>>) {
        self.fragment_shader = shader;
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn reset_statistics(&mut self) {
        self.statistics = Statistics::default();
    }

    pub fn raster_position(&self) -> &RasterPosition {
        &self.raster_position
    }

    /// Framebuffer area touched by clears
    fn clear_rect(&self) -> IntRect {
        let mut rect = self.frame_buffer.rect();
        if self.options.scissor_enabled {
            rect.intersect(&self.options.scissor_box);
        }
        rect
    }

    pub fn clear_color(&mut self, color: Vec4) {
        let argb = Color::from_vec4(color).to_argb32();
        let rect = self.clear_rect();
        self.frame_buffer.color_buffer_mut().fill(argb, rect);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        let rect = self.clear_rect();
        self.frame_buffer.depth_buffer_mut().fill(depth, rect);
    }

    pub fn clear_stencil(&mut self, value: u8) {
        let rect = self.clear_rect();
        self.frame_buffer.stencil_buffer_mut().fill(value, rect);
    }

    /// Reallocate the framebuffer; previous contents are discarded
    pub fn resize(&mut self, width: usize, height: usize) {
        log::info!(
            "resizing framebuffer {}x{} -> {width}x{height}",
            self.frame_buffer.width(),
            self.frame_buffer.height()
        );
        self.frame_buffer = FrameBuffer::new(width, height);
    }
}

impl RenderDevice for Device {
    fn draw_primitives(&mut self, primitive_type: PrimitiveType, vertices: &[Vertex]) {
        Device::draw_primitives(self, primitive_type, vertices);
    }

    fn clear_color(&mut self, color: Vec4) {
        Device::clear_color(self, color);
    }

    fn clear_depth(&mut self, depth: f32) {
        Device::clear_depth(self, depth);
    }

    fn clear_stencil(&mut self, value: u8) {
        Device::clear_stencil(self, value);
    }

    fn blit_from_color_buffer(&self, target: &mut RgbaImage) {
        Device::blit_from_color_buffer(self, target);
    }

    fn resize(&mut self, width: usize, height: usize) {
        Device::resize(self, width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scissored_clear() {
        let mut device = Device::new(100, 100);
        device.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
        device.clear_depth(1.0);

        let mut options = device.options().clone();
        options.scissor_enabled = true;
        options.scissor_box = IntRect::new(10, 10, 20, 20);
        device.set_options(options);

        device.clear_color(Vec4::new(1.0, 0.0, 0.0, 1.0));
        device.clear_depth(0.25);

        let color = device.frame_buffer().color_buffer();
        let depth = device.frame_buffer().depth_buffer();
        for y in 0..100 {
            for x in 0..100 {
                let inside = (10..30).contains(&x) && (10..30).contains(&y);
                let expected_color = if inside { Color::RED } else { Color::BLACK };
                assert_eq!(color.get(x, y), expected_color.to_argb32(), "color at ({x}, {y})");
                assert_eq!(depth.get(x, y), if inside { 0.25 } else { 1.0 }, "depth at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_clear_stencil_and_resize() {
        let mut device = Device::new(4, 4);
        device.clear_stencil(0x5a);
        assert!(device.frame_buffer().stencil_buffer().pixels().iter().all(|&s| s == 0x5a));

        device.resize(8, 2);
        assert_eq!(device.frame_buffer().rect(), IntRect::new(0, 0, 8, 2));
        assert!(device.frame_buffer().stencil_buffer().pixels().iter().all(|&s| s == 0));
    }

    #[test]
    #[should_panic]
    fn test_resize_to_zero_panics() {
        let mut device = Device::new(4, 4);
        device.resize(0, 4);
    }

    #[test]
    fn test_render_device_trait_object() {
        let mut device: Box<dyn RenderDevice> = Box::new(Device::new(2, 2));
        device.clear_color(Vec4::new(0.0, 1.0, 0.0, 1.0));
        let mut target = RgbaImage::new(2, 2);
        device.blit_from_color_buffer(&mut target);
        assert_eq!(target.get_pixel(1, 1).0, [0, 255, 0, 255]);
    }
}
