//! Core types for the rasterizer

use serde::{Deserialize, Serialize};

use super::math::{Vec3, Vec4};
use super::simd::{F32x4, Vec4x4};
use super::NUM_TEXTURE_UNITS;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack as `0xAARRGGBB`, the color buffer format
    pub fn to_argb32(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    pub fn from_argb32(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
            a: (argb >> 24) as u8,
        }
    }

    /// Clamp to [0, 1] and quantize by truncation
    pub fn from_vec4(v: Vec4) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        Self { r: q(v.x), g: q(v.y), b: q(v.z), a: q(v.w) }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    /// Convert to [u8; 4] for RGBA bitmaps
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Quantize four lanes of RGBA into ARGB32 words
pub fn to_argb32(color: &Vec4x4) -> [u32; 4] {
    std::array::from_fn(|i| Color::from_vec4(color.lane(i)).to_argb32())
}

/// Expand four ARGB32 words into RGBA lanes
pub fn from_argb32(pixels: [u32; 4]) -> Vec4x4 {
    let channel = |shift: u32| F32x4::from_fn(|i| ((pixels[i] >> shift) & 0xff) as f32 / 255.0);
    Vec4x4 {
        x: channel(16),
        y: channel(8),
        z: channel(0),
        w: channel(24),
    }
}

/// A vertex as it travels through the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Object-space position
    pub position: Vec4,
    pub eye_coordinates: Vec4,
    pub clip_coordinates: Vec4,
    /// Window x, y, depth, and 1 / clip w
    pub window_coordinates: Vec4,
    pub color: Vec4,
    pub tex_coords: [Vec4; NUM_TEXTURE_UNITS],
    pub normal: Vec3,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            eye_coordinates: Vec4::ZERO,
            clip_coordinates: Vec4::ZERO,
            window_coordinates: Vec4::ZERO,
            color: Vec4::ONE,
            tex_coords: [Vec4::new(0.0, 0.0, 0.0, 1.0); NUM_TEXTURE_UNITS],
            normal: Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

impl Vertex {
    pub fn new(position: Vec4, color: Vec4) -> Self {
        Self { position, color, ..Default::default() }
    }

    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vec4::new(x, y, z, 1.0), Vec4::ONE)
    }

    pub fn with_tex_coord(mut self, unit: usize, tex_coord: Vec4) -> Self {
        self.tex_coords[unit] = tex_coord;
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

/// Three vertices assembled from a primitive topology
#[derive(Debug, Clone, Copy, Default)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self { vertices: [a, b, c] }
    }
}

/// Primitive topology of a vertex list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

/// Polygon face selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Face {
    Front = 0,
    Back = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_packing() {
        let c = Color::with_alpha(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.to_argb32(), 0x7812_3456);
        assert_eq!(Color::from_argb32(0x7812_3456), c);
    }

    #[test]
    fn test_quantization_clamps_then_truncates() {
        let c = Color::from_vec4(Vec4::new(1.5, -0.2, 0.5, 1.0));
        assert_eq!(c, Color::with_alpha(255, 0, 127, 255));
    }
}
