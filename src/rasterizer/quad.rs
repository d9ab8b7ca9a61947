//! 2x2 pixel batch flowing through the fragment pipeline

use super::simd::{F32x4, I32x4, IVec2x4, Mask4, Vec3x4, Vec4x4};
use super::NUM_TEXTURE_UNITS;

/// Shader input slot holding the interpolated vertex color (4 lanes wide)
pub const SHADER_INPUT_VERTEX_COLOR: usize = 0;
/// First texture coordinate slot; unit `i` lives at `FIRST_TEXCOORD + 4 * i`
pub const SHADER_INPUT_FIRST_TEXCOORD: usize = 4;
pub const NUM_SHADER_INPUTS: usize = SHADER_INPUT_FIRST_TEXCOORD + 4 * NUM_TEXTURE_UNITS;

/// Output slot of the fragment color (RGBA)
pub const SHADER_OUTPUT_FIRST_COLOR: usize = 0;
pub const NUM_SHADER_OUTPUTS: usize = 4;

/// A 2x2 block of pixels processed together
#[derive(Debug, Clone)]
pub struct PixelQuad {
    pub screen_coordinates: IVec2x4,
    pub barycentrics: Vec3x4,
    pub depth: F32x4,
    pub fog_depth: F32x4,
    /// Anti-aliasing coverage per lane, multiplied into the output alpha
    pub coverage: F32x4,
    mask: Mask4,
    inputs: [F32x4; NUM_SHADER_INPUTS],
    outputs: [F32x4; NUM_SHADER_OUTPUTS],
}

impl PixelQuad {
    /// Quad with its top-left pixel at (`qx`, `qy`)
    pub fn new(qx: i32, qy: i32) -> Self {
        Self {
            screen_coordinates: IVec2x4 {
                x: I32x4::new(qx, qx + 1, qx, qx + 1),
                y: I32x4::new(qy, qy, qy + 1, qy + 1),
            },
            barycentrics: Vec3x4::default(),
            depth: F32x4::ZERO,
            fog_depth: F32x4::ZERO,
            coverage: F32x4::ONE,
            mask: Mask4::NONE,
            inputs: [F32x4::ZERO; NUM_SHADER_INPUTS],
            outputs: [F32x4::ZERO; NUM_SHADER_OUTPUTS],
        }
    }

    pub fn mask(&self) -> Mask4 {
        self.mask
    }

    /// Initial coverage; only the coverage stage calls this
    pub(crate) fn set_coverage_mask(&mut self, mask: Mask4) {
        self.mask = mask;
    }

    /// Clear lanes that are not in `passed`. Lanes are never re-enabled.
    pub fn narrow_mask(&mut self, passed: Mask4) {
        self.mask &= passed;
    }

    /// Pixel centers of the four lanes as floats
    pub fn pixel_centers(&self) -> (F32x4, F32x4) {
        (
            self.screen_coordinates.x.to_f32() + 0.5,
            self.screen_coordinates.y.to_f32() + 0.5,
        )
    }

    pub fn input(&self, index: usize) -> F32x4 {
        self.inputs[index]
    }

    pub fn set_input(&mut self, index: usize, value: F32x4) {
        self.inputs[index] = value;
    }

    pub fn input_vec4(&self, index: usize) -> Vec4x4 {
        Vec4x4 {
            x: self.inputs[index],
            y: self.inputs[index + 1],
            z: self.inputs[index + 2],
            w: self.inputs[index + 3],
        }
    }

    pub fn set_input_vec4(&mut self, index: usize, value: Vec4x4) {
        self.inputs[index] = value.x;
        self.inputs[index + 1] = value.y;
        self.inputs[index + 2] = value.z;
        self.inputs[index + 3] = value.w;
    }

    pub fn output(&self, index: usize) -> F32x4 {
        self.outputs[index]
    }

    pub fn set_output(&mut self, index: usize, value: F32x4) {
        self.outputs[index] = value;
    }

    pub fn output_vec4(&self, index: usize) -> Vec4x4 {
        Vec4x4 {
            x: self.outputs[index],
            y: self.outputs[index + 1],
            z: self.outputs[index + 2],
            w: self.outputs[index + 3],
        }
    }

    pub fn set_output_vec4(&mut self, index: usize, value: Vec4x4) {
        self.outputs[index] = value.x;
        self.outputs[index + 1] = value.y;
        self.outputs[index + 2] = value.z;
        self.outputs[index + 3] = value.w;
    }

    /// Screen coordinates as arrays, for buffer loads and stores
    pub(crate) fn xs_ys(&self) -> ([i32; 4], [i32; 4]) {
        (self.screen_coordinates.x.0, self.screen_coordinates.y.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_lane_layout() {
        let quad = PixelQuad::new(4, 8);
        assert_eq!(quad.screen_coordinates.x, I32x4::new(4, 5, 4, 5));
        assert_eq!(quad.screen_coordinates.y, I32x4::new(8, 8, 9, 9));
        let (cx, cy) = quad.pixel_centers();
        assert_eq!(cx.lane(1), 5.5);
        assert_eq!(cy.lane(2), 9.5);
    }

    #[test]
    fn test_narrow_mask_is_monotonic() {
        let mut quad = PixelQuad::new(0, 0);
        quad.set_coverage_mask(Mask4([true, true, false, true]));
        quad.narrow_mask(Mask4([false, true, true, true]));
        quad.narrow_mask(Mask4::ALL);
        assert_eq!(quad.mask(), Mask4([false, true, false, true]));
    }
}
