//! Four-lane value types for 2x2 pixel quads
//!
//! Each type is a plain array of four lanes with element-wise operators, so the
//! pixel pipeline reads like SIMD code while compiling on stable Rust. Lane
//! order inside a quad is: top-left, top-right, bottom-left, bottom-right.

use std::ops::{Add, BitAnd, BitAndAssign, BitOr, Div, Mul, Not, Sub};

use super::math::{Vec2, Vec3, Vec4};

/// Number of lanes (pixels) in a quad
pub const LANES: usize = 4;

/// Per-lane boolean mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mask4(pub [bool; LANES]);

impl Mask4 {
    pub const ALL: Mask4 = Mask4([true; LANES]);
    pub const NONE: Mask4 = Mask4([false; LANES]);

    pub fn splat(value: bool) -> Self {
        Mask4([value; LANES])
    }

    pub fn from_fn(f: impl FnMut(usize) -> bool) -> Self {
        Mask4(std::array::from_fn(f))
    }

    pub fn any(self) -> bool {
        self.0.iter().any(|&b| b)
    }

    pub fn none(self) -> bool {
        !self.any()
    }

    pub fn all(self) -> bool {
        self.0.iter().all(|&b| b)
    }

    pub fn count(self) -> u64 {
        self.0.iter().filter(|&&b| b).count() as u64
    }

    /// Lane mask packed into the low four bits
    pub fn bits(self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &b)| acc | ((b as u8) << i))
    }

    pub fn lane(self, i: usize) -> bool {
        self.0[i]
    }
}

impl BitAnd for Mask4 {
    type Output = Mask4;
    fn bitand(self, o: Mask4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] && o.0[i])
    }
}

impl BitAndAssign for Mask4 {
    fn bitand_assign(&mut self, o: Mask4) {
        *self = *self & o;
    }
}

impl BitOr for Mask4 {
    type Output = Mask4;
    fn bitor(self, o: Mask4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] || o.0[i])
    }
}

impl Not for Mask4 {
    type Output = Mask4;
    fn not(self) -> Mask4 {
        Mask4::from_fn(|i| !self.0[i])
    }
}

/// Four f32 lanes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct F32x4(pub [f32; LANES]);

impl F32x4 {
    pub const ZERO: F32x4 = F32x4([0.0; LANES]);
    pub const ONE: F32x4 = F32x4([1.0; LANES]);

    pub const fn splat(v: f32) -> Self {
        F32x4([v; LANES])
    }

    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        F32x4(std::array::from_fn(f))
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        F32x4::from_fn(|i| f(self.0[i]))
    }

    pub fn lane(self, i: usize) -> f32 {
        self.0[i]
    }

    pub fn clamp(self, min: f32, max: f32) -> Self {
        self.map(|v| v.clamp(min, max))
    }

    pub fn abs(self) -> Self {
        self.map(f32::abs)
    }

    pub fn sqrt(self) -> Self {
        self.map(f32::sqrt)
    }

    pub fn exp(self) -> Self {
        self.map(f32::exp)
    }

    pub fn lt(self, o: F32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] < o.0[i])
    }

    pub fn le(self, o: F32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] <= o.0[i])
    }

    pub fn gt(self, o: F32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] > o.0[i])
    }

    pub fn ge(self, o: F32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] >= o.0[i])
    }

    /// Bitwise equality, so that `-0.0 != 0.0` and NaN payloads compare exactly
    pub fn bits_eq(self, o: F32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i].to_bits() == o.0[i].to_bits())
    }

    pub fn float_eq(self, o: F32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] == o.0[i])
    }

    /// Lane-wise `mask ? self : other`
    pub fn select(mask: Mask4, a: F32x4, b: F32x4) -> F32x4 {
        F32x4::from_fn(|i| if mask.0[i] { a.0[i] } else { b.0[i] })
    }

    /// Linear interpolation `a + (b - a) * t`
    pub fn mix(a: F32x4, b: F32x4, t: F32x4) -> F32x4 {
        a + (b - a) * t
    }
}

macro_rules! lane_binop {
    ($ty:ident, $trait:ident, $fn:ident, $op:tt, $scalar:ty) => {
        impl $trait for $ty {
            type Output = $ty;
            fn $fn(self, o: $ty) -> $ty {
                $ty(std::array::from_fn(|i| self.0[i] $op o.0[i]))
            }
        }

        impl $trait<$scalar> for $ty {
            type Output = $ty;
            fn $fn(self, o: $scalar) -> $ty {
                $ty(std::array::from_fn(|i| self.0[i] $op o))
            }
        }
    };
}

lane_binop!(F32x4, Add, add, +, f32);
lane_binop!(F32x4, Sub, sub, -, f32);
lane_binop!(F32x4, Mul, mul, *, f32);
lane_binop!(F32x4, Div, div, /, f32);

impl Sub<F32x4> for f32 {
    type Output = F32x4;
    fn sub(self, o: F32x4) -> F32x4 {
        F32x4::splat(self) - o
    }
}

/// Four i32 lanes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct I32x4(pub [i32; LANES]);

impl I32x4 {
    pub const fn splat(v: i32) -> Self {
        I32x4([v; LANES])
    }

    pub const fn new(a: i32, b: i32, c: i32, d: i32) -> Self {
        I32x4([a, b, c, d])
    }

    pub fn lane(self, i: usize) -> i32 {
        self.0[i]
    }

    pub fn to_f32(self) -> F32x4 {
        F32x4::from_fn(|i| self.0[i] as f32)
    }

    pub fn ge(self, o: I32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] >= o.0[i])
    }

    pub fn le(self, o: I32x4) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] <= o.0[i])
    }
}

lane_binop!(I32x4, Add, add, +, i32);
lane_binop!(I32x4, Sub, sub, -, i32);
lane_binop!(I32x4, Mul, mul, *, i32);

/// Integer screen coordinates of a quad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IVec2x4 {
    pub x: I32x4,
    pub y: I32x4,
}

/// Two-component vector of lanes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2x4 {
    pub x: F32x4,
    pub y: F32x4,
}

impl Vec2x4 {
    pub fn splat(v: Vec2) -> Self {
        Self { x: F32x4::splat(v.x), y: F32x4::splat(v.y) }
    }

    pub fn dot(self, o: Vec2x4) -> F32x4 {
        self.x * o.x + self.y * o.y
    }

    pub fn len(self) -> F32x4 {
        self.dot(self).sqrt()
    }
}

impl Sub for Vec2x4 {
    type Output = Vec2x4;
    fn sub(self, o: Vec2x4) -> Vec2x4 {
        Vec2x4 { x: self.x - o.x, y: self.y - o.y }
    }
}

impl Mul<F32x4> for Vec2x4 {
    type Output = Vec2x4;
    fn mul(self, s: F32x4) -> Vec2x4 {
        Vec2x4 { x: self.x * s, y: self.y * s }
    }
}

/// Three-component vector of lanes (barycentric weights)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3x4 {
    pub x: F32x4,
    pub y: F32x4,
    pub z: F32x4,
}

impl Vec3x4 {
    pub fn splat(v: Vec3) -> Self {
        Self { x: F32x4::splat(v.x), y: F32x4::splat(v.y), z: F32x4::splat(v.z) }
    }

    pub fn dot(self, o: Vec3x4) -> F32x4 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }
}

impl Mul for Vec3x4 {
    type Output = Vec3x4;
    fn mul(self, o: Vec3x4) -> Vec3x4 {
        Vec3x4 { x: self.x * o.x, y: self.y * o.y, z: self.z * o.z }
    }
}

impl Mul<F32x4> for Vec3x4 {
    type Output = Vec3x4;
    fn mul(self, s: F32x4) -> Vec3x4 {
        Vec3x4 { x: self.x * s, y: self.y * s, z: self.z * s }
    }
}

impl Div<F32x4> for Vec3x4 {
    type Output = Vec3x4;
    fn div(self, s: F32x4) -> Vec3x4 {
        Vec3x4 { x: self.x / s, y: self.y / s, z: self.z / s }
    }
}

/// Four-component vector of lanes (colors, texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec4x4 {
    pub x: F32x4,
    pub y: F32x4,
    pub z: F32x4,
    pub w: F32x4,
}

impl Vec4x4 {
    pub fn splat(v: Vec4) -> Self {
        Self {
            x: F32x4::splat(v.x),
            y: F32x4::splat(v.y),
            z: F32x4::splat(v.z),
            w: F32x4::splat(v.w),
        }
    }

    /// Broadcast a single lane vector into all four components
    pub fn broadcast(v: F32x4) -> Self {
        Self { x: v, y: v, z: v, w: v }
    }

    /// Barycentric interpolation of three per-vertex values
    pub fn interpolate(a: Vec4, b: Vec4, c: Vec4, weights: Vec3x4) -> Self {
        let lerp = |a: f32, b: f32, c: f32| weights.x * a + weights.y * b + weights.z * c;
        Self {
            x: lerp(a.x, b.x, c.x),
            y: lerp(a.y, b.y, c.y),
            z: lerp(a.z, b.z, c.z),
            w: lerp(a.w, b.w, c.w),
        }
    }

    /// Linear interpolation from `a` to `b` by per-lane `t`
    pub fn mix(a: Vec4x4, b: Vec4x4, t: F32x4) -> Self {
        Self {
            x: F32x4::mix(a.x, b.x, t),
            y: F32x4::mix(a.y, b.y, t),
            z: F32x4::mix(a.z, b.z, t),
            w: F32x4::mix(a.w, b.w, t),
        }
    }

    pub fn clamp(self, min: f32, max: f32) -> Self {
        Self {
            x: self.x.clamp(min, max),
            y: self.y.clamp(min, max),
            z: self.z.clamp(min, max),
            w: self.w.clamp(min, max),
        }
    }

    pub fn lane(&self, i: usize) -> Vec4 {
        Vec4::new(self.x.0[i], self.y.0[i], self.z.0[i], self.w.0[i])
    }

    pub fn xy(&self) -> Vec2x4 {
        Vec2x4 { x: self.x, y: self.y }
    }
}

impl Add for Vec4x4 {
    type Output = Vec4x4;
    fn add(self, o: Vec4x4) -> Vec4x4 {
        Vec4x4 { x: self.x + o.x, y: self.y + o.y, z: self.z + o.z, w: self.w + o.w }
    }
}

impl Sub for Vec4x4 {
    type Output = Vec4x4;
    fn sub(self, o: Vec4x4) -> Vec4x4 {
        Vec4x4 { x: self.x - o.x, y: self.y - o.y, z: self.z - o.z, w: self.w - o.w }
    }
}

impl Mul for Vec4x4 {
    type Output = Vec4x4;
    fn mul(self, o: Vec4x4) -> Vec4x4 {
        Vec4x4 { x: self.x * o.x, y: self.y * o.y, z: self.z * o.z, w: self.w * o.w }
    }
}

impl Mul<F32x4> for Vec4x4 {
    type Output = Vec4x4;
    fn mul(self, s: F32x4) -> Vec4x4 {
        Vec4x4 { x: self.x * s, y: self.y * s, z: self.z * s, w: self.w * s }
    }
}

impl Mul<f32> for Vec4x4 {
    type Output = Vec4x4;
    fn mul(self, s: f32) -> Vec4x4 {
        Vec4x4 { x: self.x * s, y: self.y * s, z: self.z * s, w: self.w * s }
    }
}

/// Weights in [0, 1] broadcast as a 4-vector (used by blend factors)
impl Mul<Vec4> for Vec4x4 {
    type Output = Vec4x4;
    fn mul(self, v: Vec4) -> Vec4x4 {
        Vec4x4 { x: self.x * v.x, y: self.y * v.y, z: self.z * v.z, w: self.w * v.w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_narrowing_never_sets_lanes() {
        let mut mask = Mask4([true, false, true, true]);
        mask &= Mask4([true, true, false, true]);
        assert_eq!(mask, Mask4([true, false, false, true]));
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.bits(), 0b1001);
    }

    #[test]
    fn test_select_and_mix() {
        let a = F32x4([1.0, 2.0, 3.0, 4.0]);
        let b = F32x4::splat(10.0);
        let picked = F32x4::select(Mask4([true, false, true, false]), a, b);
        assert_eq!(picked, F32x4([1.0, 10.0, 3.0, 10.0]));

        let mixed = F32x4::mix(F32x4::ZERO, b, F32x4::splat(0.25));
        assert_eq!(mixed, F32x4::splat(2.5));
    }

    #[test]
    fn test_bits_eq_distinguishes_signed_zero() {
        let a = F32x4([0.0, -0.0, 1.0, 1.0]);
        let b = F32x4([0.0, 0.0, 1.0, 2.0]);
        assert_eq!(a.bits_eq(b), Mask4([true, false, true, false]));
        assert_eq!(a.float_eq(b), Mask4([true, true, true, false]));
    }
}
