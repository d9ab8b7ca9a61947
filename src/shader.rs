//! Programmable fragment stage
//!
//! A bound [`FragmentShader`] replaces the whole fixed-function texture and fog
//! chain. It reads the quad's interpolated inputs and must write the color
//! output slots; it may also narrow the quad mask to discard fragments.

use crate::rasterizer::PixelQuad;

pub trait FragmentShader {
    /// Shade all active lanes of `quad` in place
    fn execute(&self, quad: &mut PixelQuad);
}

impl<F: Fn(&mut PixelQuad)> FragmentShader for F {
    fn execute(&self, quad: &mut PixelQuad) {
        self(quad)
    }
}
