//! Quad-based software rasterizer
//!
//! Features:
//! - Fixed-point edge functions with a top-left fill rule
//! - 2x2 pixel quads with monotonically narrowing lane masks
//! - Perspective-correct attribute interpolation
//! - Stencil, depth and alpha tests, blending and masked color writes

mod blend;
mod framebuffer;
mod math;
mod options;
mod quad;
mod render;
mod shading;
pub mod simd;
mod types;

pub use blend::*;
pub use framebuffer::*;
pub use math::*;
pub use options::*;
pub use quad::*;
pub use render::edge_function;
pub use types::*;

/// Number of fixed-function texture units
pub const NUM_TEXTURE_UNITS: usize = 2;

/// Number of fixed-function lights
pub const NUM_LIGHTS: usize = 8;

/// Maximum number of user-defined clip planes
pub const MAX_CLIP_PLANES: usize = 6;

/// Fractional bits of fixed-point window coordinates
pub const SUBPIXEL_BITS: u32 = 6;

/// Largest side of an aliased point, in pixels
pub const MAX_ALIASED_POINT_SIZE: i32 = 64;
