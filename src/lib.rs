//! SoftGPU: a software GPU device
//!
//! Fixed-function rendering entirely on the CPU:
//! - Vertex transform, per-vertex lighting and texture coordinate generation
//! - Frustum and user-plane clipping
//! - Quad-based rasterization of points, lines and triangles
//! - Stencil, depth and alpha tests, blending and masked color writes
//! - Clears, blits and raster-position pixel rectangles

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod device;
pub mod error;
pub mod rasterizer;
pub mod scene;
pub mod shader;
pub mod texture;

pub use device::{Device, RenderDevice, Statistics};
pub use error::{Error, Result};
pub use scene::{load_scene, render_scene, save_scene, Scene};
