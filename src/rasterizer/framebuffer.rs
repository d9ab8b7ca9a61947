//! Color, depth and stencil buffers for software rendering
//!
//! Row 0 is the bottom of the image (window coordinates grow upwards); blits
//! into top-down bitmaps flip rows.

use super::math::IntRect;

/// Color buffer texel: `0xAARRGGBB`
pub type ColorType = u32;
pub type DepthType = f32;
pub type StencilType = u8;

/// A 2D array of pixels with scanline access
#[derive(Debug, Clone)]
pub struct Buffer<T> {
    width: usize,
    height: usize,
    pixels: Vec<T>,
}

impl<T: Copy> Buffer<T> {
    pub fn new(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rect(&self) -> IntRect {
        IntRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn scanline(&self, y: usize) -> &[T] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn scanline_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.pixels[y * self.width + x] = value;
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    /// Fill `rect`, clipped to the buffer
    pub fn fill(&mut self, value: T, rect: IntRect) {
        let rect = rect.intersected(&self.rect());
        if rect.is_empty() {
            return;
        }
        let (x0, x1) = (rect.min_x() as usize, rect.max_x() as usize);
        for y in rect.min_y()..=rect.max_y() {
            self.scanline_mut(y as usize)[x0..=x1].fill(value);
        }
    }

    /// Load four pixels; lanes whose mask bit is clear are left at `T::default()`
    pub fn load4(&self, xs: [i32; 4], ys: [i32; 4], mask: [bool; 4]) -> [T; 4]
    where
        T: Default,
    {
        std::array::from_fn(|i| {
            if mask[i] {
                self.get(xs[i] as usize, ys[i] as usize)
            } else {
                T::default()
            }
        })
    }

    /// Store four pixels for lanes whose mask bit is set
    pub fn store4(&mut self, xs: [i32; 4], ys: [i32; 4], values: [T; 4], mask: [bool; 4]) {
        for i in 0..4 {
            if mask[i] {
                self.set(xs[i] as usize, ys[i] as usize, values[i]);
            }
        }
    }
}

/// Framebuffer for software rendering
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    color: Buffer<ColorType>,
    depth: Buffer<DepthType>,
    stencil: Buffer<StencilType>,
}

impl FrameBuffer {
    /// Allocate all three buffers. Zero-sized framebuffers are a caller bug.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "framebuffer must not be empty ({width}x{height})");
        Self {
            color: Buffer::new(width, height, 0),
            depth: Buffer::new(width, height, 1.0),
            stencil: Buffer::new(width, height, 0),
        }
    }

    pub fn width(&self) -> usize {
        self.color.width()
    }

    pub fn height(&self) -> usize {
        self.color.height()
    }

    pub fn rect(&self) -> IntRect {
        self.color.rect()
    }

    pub fn color_buffer(&self) -> &Buffer<ColorType> {
        &self.color
    }

    pub fn color_buffer_mut(&mut self) -> &mut Buffer<ColorType> {
        &mut self.color
    }

    pub fn depth_buffer(&self) -> &Buffer<DepthType> {
        &self.depth
    }

    pub fn depth_buffer_mut(&mut self) -> &mut Buffer<DepthType> {
        &mut self.depth
    }

    pub fn stencil_buffer(&self) -> &Buffer<StencilType> {
        &self.stencil
    }

    pub fn stencil_buffer_mut(&mut self) -> &mut Buffer<StencilType> {
        &mut self.stencil
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_is_clipped_to_rect() {
        let mut buffer = Buffer::new(8, 4, 0u8);
        buffer.fill(7, IntRect::new(6, 2, 10, 10));
        assert_eq!(buffer.scanline(1), &[0; 8]);
        assert_eq!(buffer.scanline(2), &[0, 0, 0, 0, 0, 0, 7, 7]);
        assert_eq!(buffer.scanline(3), &[0, 0, 0, 0, 0, 0, 7, 7]);
    }

    #[test]
    fn test_masked_store_skips_cleared_lanes() {
        let mut buffer = Buffer::new(2, 2, 0u32);
        buffer.store4([0, 1, 0, 1], [0, 0, 1, 1], [1, 2, 3, 4], [true, false, false, true]);
        assert_eq!(buffer.pixels(), &[1, 0, 0, 4]);
    }

    #[test]
    #[should_panic]
    fn test_zero_sized_framebuffer_panics() {
        let _ = FrameBuffer::new(0, 10);
    }
}
