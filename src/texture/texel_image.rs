//! Texture images

use std::path::Path;

use crate::error::Result;
use crate::rasterizer::{Color, Vec4};

/// Simple RGBA texture image (row 0 is the bottom row, matching texture space)
#[derive(Debug, Clone)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub texels: Vec<Vec4>,
    pub name: String,
}

impl Image {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            texels: vec![Vec4::ONE; width * height],
            name: String::new(),
        }
    }

    /// Single-texel image, handy for constant textures
    pub fn solid(color: Vec4) -> Self {
        let mut image = Self::new(1, 1);
        image.texels[0] = color;
        image
    }

    /// Load texture from an image file (PNG, JPEG or BMP)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        use image::GenericImageView;

        let path = path.as_ref();
        let img = image::open(path)?;
        let (width, height) = img.dimensions();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        log::debug!("loaded texture {} ({}x{})", path.display(), width, height);
        Ok(Self::from_rgba(&img.to_rgba8(), name))
    }

    /// Load texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: String) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_rgba(&img.to_rgba8(), name))
    }

    /// Convert a top-down RGBA bitmap, flipping rows into texture space
    pub fn from_rgba(rgba: &image::RgbaImage, name: String) -> Self {
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);
        let mut texels = Vec::with_capacity(width * height);
        for y in (0..height).rev() {
            for x in 0..width {
                let p = rgba.get_pixel(x as u32, y as u32);
                texels.push(Color::with_alpha(p[0], p[1], p[2], p[3]).to_vec4());
            }
        }
        Self { width, height, texels, name }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Vec4, color2: Vec4) -> Self {
        let mut texels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                texels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, texels, name: "checkerboard".to_string() }
    }

    /// Get texel at x,y coordinates; out of range reads are transparent black
    pub fn texel(&self, x: usize, y: usize) -> Vec4 {
        if x < self.width && y < self.height {
            self.texels[y * self.width + x]
        } else {
            Vec4::ZERO
        }
    }

    pub fn set_texel(&mut self, x: usize, y: usize, value: Vec4) {
        if x < self.width && y < self.height {
            self.texels[y * self.width + x] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_flips_rows() {
        let mut rgba = image::RgbaImage::new(1, 2);
        rgba.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        rgba.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        let image = Image::from_rgba(&rgba, "flip".into());
        // Bottom row of the bitmap becomes texture row 0
        assert_eq!(image.texel(0, 0), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(image.texel(0, 1), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_out_of_range_texel_is_transparent() {
        let image = Image::new(2, 2);
        assert_eq!(image.texel(5, 0), Vec4::ZERO);
    }
}
