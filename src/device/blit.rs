//! Copies between the framebuffer and bitmaps, textures and raw pixel memory
//!
//! The framebuffer stores row 0 at the bottom. `image` bitmaps are top-down and
//! get flipped; textures and raw layouts share the bottom-up order.

use image::{ImageBuffer, Luma, RgbaImage};
use serde::{Deserialize, Serialize};

use super::Device;
use crate::error::{Error, Result};
use crate::rasterizer::{Color, IntRect, Vec4};
use crate::texture::Image;

/// Raw pixel formats understood by the read-back blits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
    Rgb8,
    Alpha8,
    Luminance8,
    DepthF32,
    DepthU16,
    DepthU32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 | PixelFormat::DepthF32 | PixelFormat::DepthU32 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::DepthU16 => 2,
            PixelFormat::Alpha8 | PixelFormat::Luminance8 => 1,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, PixelFormat::DepthF32 | PixelFormat::DepthU16 | PixelFormat::DepthU32)
    }
}

/// Framebuffer region to read and the packed format to write it in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDataLayout {
    pub format: PixelFormat,
    pub source: IntRect,
}

impl ImageDataLayout {
    pub fn required_bytes(&self) -> usize {
        self.source.width.max(0) as usize * self.source.height.max(0) as usize * self.format.bytes_per_pixel()
    }
}

/// 16-bit grayscale depth visualization
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

impl Device {
    /// Copy the color buffer into a top-down bitmap no larger than the framebuffer
    pub fn blit_from_color_buffer(&self, target: &mut RgbaImage) {
        let (width, height) = (target.width() as usize, target.height() as usize);
        assert!(
            width <= self.frame_buffer.width() && height <= self.frame_buffer.height(),
            "blit target {width}x{height} exceeds the framebuffer"
        );

        let buffer = self.frame_buffer.color_buffer();
        for y in 0..height {
            let scanline = buffer.scanline(self.frame_buffer.height() - 1 - y);
            for (x, argb) in scanline.iter().take(width).enumerate() {
                target.put_pixel(x as u32, y as u32, image::Rgba(Color::from_argb32(*argb).to_bytes()));
            }
        }
    }

    /// Copy the depth buffer into a top-down 16-bit bitmap
    pub fn blit_from_depth_buffer(&self, target: &mut DepthImage) {
        let (width, height) = (target.width() as usize, target.height() as usize);
        assert!(
            width <= self.frame_buffer.width() && height <= self.frame_buffer.height(),
            "blit target {width}x{height} exceeds the framebuffer"
        );

        let buffer = self.frame_buffer.depth_buffer();
        for y in 0..height {
            let scanline = buffer.scanline(self.frame_buffer.height() - 1 - y);
            for (x, depth) in scanline.iter().take(width).enumerate() {
                let value = (depth.clamp(0.0, 1.0) * u16::MAX as f32) as u16;
                target.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }

    /// Copy `source` from the color buffer into `target` at `output_offset`
    pub fn blit_from_color_buffer_to_image(&self, target: &mut Image, source: IntRect, output_offset: (usize, usize)) {
        assert!(
            self.frame_buffer.rect().contains_rect(&source),
            "blit source {source:?} is outside the framebuffer"
        );
        let buffer = self.frame_buffer.color_buffer();
        for y in 0..source.height.max(0) as usize {
            for x in 0..source.width.max(0) as usize {
                let argb = buffer.get(source.x as usize + x, source.y as usize + y);
                target.set_texel(output_offset.0 + x, output_offset.1 + y, Color::from_argb32(argb).to_vec4());
            }
        }
    }

    /// Copy `source` from the depth buffer into `target` as gray texels
    pub fn blit_from_depth_buffer_to_image(&self, target: &mut Image, source: IntRect, output_offset: (usize, usize)) {
        assert!(
            self.frame_buffer.rect().contains_rect(&source),
            "blit source {source:?} is outside the framebuffer"
        );
        let buffer = self.frame_buffer.depth_buffer();
        for y in 0..source.height.max(0) as usize {
            for x in 0..source.width.max(0) as usize {
                let depth = buffer.get(source.x as usize + x, source.y as usize + y);
                target.set_texel(output_offset.0 + x, output_offset.1 + y, Vec4::new(depth, depth, depth, 1.0));
            }
        }
    }

    /// Pack a region of the color buffer into `output`. Conversion failures are
    /// logged and leave `output` untouched.
    pub fn blit_from_color_buffer_to_raw(&self, output: &mut [u8], layout: &ImageDataLayout) {
        if let Err(error) = self.read_color_pixels(output, layout) {
            log::error!("color buffer blit failed: {error}");
        }
    }

    /// Pack a region of the depth buffer into `output`. Conversion failures are
    /// logged and leave `output` untouched.
    pub fn blit_from_depth_buffer_to_raw(&self, output: &mut [u8], layout: &ImageDataLayout) {
        if let Err(error) = self.read_depth_pixels(output, layout) {
            log::error!("depth buffer blit failed: {error}");
        }
    }

    fn read_color_pixels(&self, output: &mut [u8], layout: &ImageDataLayout) -> Result<()> {
        if layout.format.is_depth() {
            return Err(Error::UnsupportedPixelConversion { source_buffer: "color", format: layout.format });
        }
        let pixels = self.checked_region(output, layout)?;
        let buffer = self.frame_buffer.color_buffer();

        for (out, (x, y)) in output.chunks_exact_mut(layout.format.bytes_per_pixel()).zip(pixels) {
            let color = Color::from_argb32(buffer.get(x, y));
            match layout.format {
                PixelFormat::Rgba8 => out.copy_from_slice(&[color.r, color.g, color.b, color.a]),
                PixelFormat::Bgra8 => out.copy_from_slice(&[color.b, color.g, color.r, color.a]),
                PixelFormat::Rgb8 => out.copy_from_slice(&[color.r, color.g, color.b]),
                PixelFormat::Alpha8 => out[0] = color.a,
                PixelFormat::Luminance8 => out[0] = color.r,
                PixelFormat::DepthF32 | PixelFormat::DepthU16 | PixelFormat::DepthU32 => unreachable!(),
            }
        }
        Ok(())
    }

    fn read_depth_pixels(&self, output: &mut [u8], layout: &ImageDataLayout) -> Result<()> {
        if !layout.format.is_depth() {
            return Err(Error::UnsupportedPixelConversion { source_buffer: "depth", format: layout.format });
        }
        let pixels = self.checked_region(output, layout)?;
        let buffer = self.frame_buffer.depth_buffer();

        for (out, (x, y)) in output.chunks_exact_mut(layout.format.bytes_per_pixel()).zip(pixels) {
            let depth = buffer.get(x, y);
            match layout.format {
                PixelFormat::DepthF32 => out.copy_from_slice(&depth.to_le_bytes()),
                PixelFormat::DepthU16 => {
                    let value = (depth.clamp(0.0, 1.0) * u16::MAX as f32) as u16;
                    out.copy_from_slice(&value.to_le_bytes());
                }
                PixelFormat::DepthU32 => {
                    let value = (depth.clamp(0.0, 1.0) as f64 * u32::MAX as f64) as u32;
                    out.copy_from_slice(&value.to_le_bytes());
                }
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    /// Validate the layout against the framebuffer and `output`, yielding
    /// source pixel coordinates bottom row first
    fn checked_region(&self, output: &[u8], layout: &ImageDataLayout) -> Result<impl Iterator<Item = (usize, usize)>> {
        assert!(
            self.frame_buffer.rect().contains_rect(&layout.source),
            "blit source {:?} is outside the framebuffer",
            layout.source
        );
        let required = layout.required_bytes();
        if output.len() < required {
            return Err(Error::DestinationTooSmall { required, actual: output.len() });
        }
        let source = layout.source;
        Ok((source.min_y()..=source.max_y())
            .flat_map(move |y| (source.min_x()..=source.max_x()).map(move |x| (x as usize, y as usize))))
    }

    /// Draw a top-down bitmap with its lower-left corner at the raster position
    pub fn blit_to_color_buffer_at_raster_position(&mut self, source: &RgbaImage) {
        let Some(blit_rect) = self.raster_blit_rect(source.width() as usize, source.height() as usize) else {
            return;
        };
        let origin = self.raster_origin();
        let height = source.height() as i32;
        let buffer = self.frame_buffer.color_buffer_mut();
        for y in blit_rect.min_y()..=blit_rect.max_y() {
            let source_y = height - 1 - (y - origin.1);
            for x in blit_rect.min_x()..=blit_rect.max_x() {
                let pixel = source.get_pixel((x - origin.0) as u32, source_y as u32);
                let color = Color::with_alpha(pixel[0], pixel[1], pixel[2], pixel[3]);
                buffer.set(x as usize, y as usize, color.to_argb32());
            }
        }
    }

    /// Write bottom-up depth values with their lower-left corner at the raster position
    pub fn blit_to_depth_buffer_at_raster_position(&mut self, depth: &[f32], width: usize, height: usize) {
        assert_eq!(depth.len(), width * height, "depth data does not match {width}x{height}");
        let Some(blit_rect) = self.raster_blit_rect(width, height) else {
            return;
        };
        let origin = self.raster_origin();
        let buffer = self.frame_buffer.depth_buffer_mut();
        for y in blit_rect.min_y()..=blit_rect.max_y() {
            let row = (y - origin.1) as usize * width;
            for x in blit_rect.min_x()..=blit_rect.max_x() {
                buffer.set(x as usize, y as usize, depth[row + (x - origin.0) as usize]);
            }
        }
    }

    fn raster_origin(&self) -> (i32, i32) {
        let window = self.raster_position.window_coordinates;
        (window.x.floor() as i32, window.y.floor() as i32)
    }

    /// Framebuffer pixels a raster-position blit touches, if any
    fn raster_blit_rect(&self, width: usize, height: usize) -> Option<IntRect> {
        if !self.raster_position.valid {
            return None;
        }
        let (x, y) = self.raster_origin();
        let mut rect = IntRect::new(x, y, width as i32, height as i32);
        rect.intersect(&self.frame_buffer.rect());
        if self.options.scissor_enabled {
            rect.intersect(&self.options.scissor_box);
        }
        (!rect.is_empty()).then_some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Mat4;

    fn device_with_marked_corner() -> Device {
        let mut device = Device::new(4, 2);
        device.clear_color(Vec4::new(0.0, 0.0, 1.0, 1.0));
        // Bottom-left pixel in window space
        device.frame_buffer.color_buffer_mut().set(0, 0, Color::RED.to_argb32());
        device
    }

    #[test]
    fn test_color_blit_flips_rows() {
        let device = device_with_marked_corner();
        let mut target = RgbaImage::new(4, 2);
        device.blit_from_color_buffer(&mut target);
        assert_eq!(target.get_pixel(0, 1).0, [255, 0, 0, 255]);
        assert_eq!(target.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_raw_rgba_and_bgra() {
        let device = device_with_marked_corner();
        let layout = ImageDataLayout { format: PixelFormat::Bgra8, source: IntRect::new(0, 0, 2, 1) };
        let mut output = vec![0u8; layout.required_bytes()];
        device.blit_from_color_buffer_to_raw(&mut output, &layout);
        assert_eq!(output, vec![0, 0, 255, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn test_unsupported_conversion_leaves_output_untouched() {
        let device = device_with_marked_corner();
        let layout = ImageDataLayout { format: PixelFormat::DepthF32, source: IntRect::new(0, 0, 1, 1) };
        let mut output = vec![7u8; 4];
        device.blit_from_color_buffer_to_raw(&mut output, &layout);
        assert_eq!(output, vec![7; 4]);

        let layout = ImageDataLayout { format: PixelFormat::Rgba8, source: IntRect::new(0, 0, 2, 2) };
        let mut short = vec![7u8; 4];
        device.blit_from_color_buffer_to_raw(&mut short, &layout);
        assert_eq!(short, vec![7; 4]);
    }

    #[test]
    fn test_depth_raw_u16() {
        let mut device = Device::new(2, 2);
        device.clear_depth(0.5);
        let layout = ImageDataLayout { format: PixelFormat::DepthU16, source: IntRect::new(0, 0, 1, 1) };
        let mut output = vec![0u8; 2];
        device.blit_from_depth_buffer_to_raw(&mut output, &layout);
        assert_eq!(u16::from_le_bytes([output[0], output[1]]), 32767);
    }

    #[test]
    fn test_color_blit_to_texture() {
        let device = device_with_marked_corner();
        let mut texture = Image::new(2, 2);
        device.blit_from_color_buffer_to_image(&mut texture, IntRect::new(0, 0, 2, 1), (0, 1));
        assert_eq!(texture.texel(0, 1), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(texture.texel(1, 1), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(texture.texel(0, 0), Vec4::ONE);
    }

    #[test]
    fn test_draw_pixels_at_raster_position() {
        let mut device = Device::new(8, 8);
        device.set_projection_transform(Mat4::ortho(0.0, 8.0, 0.0, 8.0, -1.0, 1.0));
        device.set_raster_position(Vec4::new(2.0, 3.0, 0.0, 1.0));

        let mut bitmap = RgbaImage::new(2, 2);
        bitmap.put_pixel(0, 0, image::Rgba([0, 255, 0, 255]));
        device.blit_to_color_buffer_at_raster_position(&bitmap);

        let buffer = device.frame_buffer().color_buffer();
        // The top row of the bitmap lands on the upper framebuffer row
        assert_eq!(buffer.get(2, 4), Color::GREEN.to_argb32());
        assert_eq!(buffer.get(2, 3), Color::TRANSPARENT.to_argb32());
        assert_eq!(buffer.get(1, 3), 0);
    }

    #[test]
    fn test_invalid_raster_position_skips_blit() {
        let mut device = Device::new(8, 8);
        device.set_raster_position(Vec4::new(5.0, 0.0, 0.0, 1.0));
        device.blit_to_depth_buffer_at_raster_position(&[0.25; 4], 2, 2);
        assert!(device.frame_buffer().depth_buffer().pixels().iter().all(|&d| d == 1.0));
    }
}
