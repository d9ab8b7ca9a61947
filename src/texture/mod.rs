//! Texture images and samplers used by the fixed-function fragment stage

mod texel_image;
mod sampler;

pub use texel_image::*;
pub use sampler::*;
