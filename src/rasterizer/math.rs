//! Vector and matrix math for the vertex and pixel pipelines
//!
//! Row-major matrices, column vectors: `m * v` transforms `v`.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 2D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Component by index (0 = x, 1 = y, 2 = z)
    pub fn get(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }
}

/// 4D Vector (homogeneous positions, RGBA colors, texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    pub const ONE: Vec4 = Vec4 { x: 1.0, y: 1.0, z: 1.0, w: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v, w: v }
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn dot(self, other: Vec4) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec4 {
        let l = self.len();
        if l == 0.0 {
            return Vec4::ZERO;
        }
        self * (1.0 / l)
    }

    /// Component-wise product
    pub fn modulate(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x * other.x, self.y * other.y, self.z * other.z, self.w * other.w)
    }

    pub fn clamp(self, min: f32, max: f32) -> Vec4 {
        Vec4::new(
            self.x.clamp(min, max),
            self.y.clamp(min, max),
            self.z.clamp(min, max),
            self.w.clamp(min, max),
        )
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1)
    pub fn mix(self, other: Vec4, t: f32) -> Vec4 {
        self + (other - self) * t
    }

    pub fn get(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => self.w,
        }
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x + o.x, self.y + o.y, self.z + o.z, self.w + o.w)
    }
}

impl AddAssign for Vec4 {
    fn add_assign(&mut self, o: Vec4) {
        *self = *self + o;
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x - o.x, self.y - o.y, self.z - o.z, self.w - o.w)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

/// 3x3 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub rows: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn transpose(&self) -> Mat3 {
        let r = &self.rows;
        Mat3 {
            rows: [
                [r[0][0], r[1][0], r[2][0]],
                [r[0][1], r[1][1], r[2][1]],
                [r[0][2], r[1][2], r[2][2]],
            ],
        }
    }

    pub fn determinant(&self) -> f32 {
        let r = &self.rows;
        r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
    }

    /// Inverse via the adjugate. Singular matrices yield `None`.
    pub fn inverse(&self) -> Option<Mat3> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }
        let r = &self.rows;
        let inv_det = 1.0 / det;
        Some(Mat3 {
            rows: [
                [
                    (r[1][1] * r[2][2] - r[1][2] * r[2][1]) * inv_det,
                    (r[0][2] * r[2][1] - r[0][1] * r[2][2]) * inv_det,
                    (r[0][1] * r[1][2] - r[0][2] * r[1][1]) * inv_det,
                ],
                [
                    (r[1][2] * r[2][0] - r[1][0] * r[2][2]) * inv_det,
                    (r[0][0] * r[2][2] - r[0][2] * r[2][0]) * inv_det,
                    (r[0][2] * r[1][0] - r[0][0] * r[1][2]) * inv_det,
                ],
                [
                    (r[1][0] * r[2][1] - r[1][1] * r[2][0]) * inv_det,
                    (r[0][1] * r[2][0] - r[0][0] * r[2][1]) * inv_det,
                    (r[0][0] * r[1][1] - r[0][1] * r[1][0]) * inv_det,
                ],
            ],
        })
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }
}

/// 4x4 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub rows: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(t: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.rows[0][3] = t.x;
        m.rows[1][3] = t.y;
        m.rows[2][3] = t.z;
        m
    }

    pub fn scaling(s: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.rows[0][0] = s.x;
        m.rows[1][1] = s.y;
        m.rows[2][2] = s.z;
        m
    }

    /// Rotation of `degrees` around `axis` (right-handed)
    pub fn rotation(degrees: f32, axis: Vec3) -> Mat4 {
        let a = axis.normalize();
        let (s, c) = degrees.to_radians().sin_cos();
        let t = 1.0 - c;
        Mat4 {
            rows: [
                [t * a.x * a.x + c, t * a.x * a.y - s * a.z, t * a.x * a.z + s * a.y, 0.0],
                [t * a.x * a.y + s * a.z, t * a.y * a.y + c, t * a.y * a.z - s * a.x, 0.0],
                [t * a.x * a.z - s * a.y, t * a.y * a.z + s * a.x, t * a.z * a.z + c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Perspective projection frustum (same parameters as glFrustum)
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4 {
            rows: [
                [2.0 * near / (right - left), 0.0, (right + left) / (right - left), 0.0],
                [0.0, 2.0 * near / (top - bottom), (top + bottom) / (top - bottom), 0.0],
                [0.0, 0.0, -(far + near) / (far - near), -2.0 * far * near / (far - near)],
                [0.0, 0.0, -1.0, 0.0],
            ],
        }
    }

    /// Symmetric perspective projection with vertical field of view in degrees
    pub fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let top = near * (fovy_degrees.to_radians() / 2.0).tan();
        let right = top * aspect;
        Mat4::frustum(-right, right, -top, top, near, far)
    }

    /// Orthographic projection (same parameters as glOrtho)
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4 {
            rows: [
                [2.0 / (right - left), 0.0, 0.0, -(right + left) / (right - left)],
                [0.0, 2.0 / (top - bottom), 0.0, -(top + bottom) / (top - bottom)],
                [0.0, 0.0, -2.0 / (far - near), -(far + near) / (far - near)],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn top_left_3x3(&self) -> Mat3 {
        let r = &self.rows;
        Mat3 {
            rows: [
                [r[0][0], r[0][1], r[0][2]],
                [r[1][0], r[1][1], r[1][2]],
                [r[2][0], r[2][1], r[2][2]],
            ],
        }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let r = &self.rows;
        let row = |i: usize| r[i][0] * v.x + r[i][1] * v.y + r[i][2] * v.z + r[i][3] * v.w;
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut rows = [[0.0; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[i][k] * other.rows[k][j]).sum();
            }
        }
        Mat4 { rows }
    }
}

/// Integer rectangle in framebuffer space. `max_x`/`max_y` are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two inclusive corners
    pub fn from_corners(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    pub fn min_x(&self) -> i32 {
        self.x
    }

    pub fn min_y(&self) -> i32 {
        self.y
    }

    pub fn max_x(&self) -> i32 {
        self.x + self.width - 1
    }

    pub fn max_y(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    pub fn contains_rect(&self, other: &IntRect) -> bool {
        other.is_empty()
            || (self.contains(other.min_x(), other.min_y())
                && self.contains(other.max_x(), other.max_y()))
    }

    /// Intersection with `other`; disjoint rectangles produce an empty rectangle
    pub fn intersected(&self, other: &IntRect) -> IntRect {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        if max_x < min_x || max_y < min_y {
            return IntRect::new(min_x, min_y, 0, 0);
        }
        IntRect::from_corners(min_x, min_y, max_x, max_y)
    }

    pub fn intersect(&mut self, other: &IntRect) {
        *self = self.intersected(other);
    }

    /// Grow by `amount` pixels on every side
    pub fn inflated(&self, amount: i32) -> IntRect {
        IntRect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!((c.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_mat3_inverse_roundtrip() {
        let m = Mat4::rotation(30.0, Vec3::new(0.0, 1.0, 1.0)) * Mat4::scaling(Vec3::new(2.0, 3.0, 4.0));
        let m3 = m.top_left_3x3();
        let inv = m3.inverse().expect("invertible");
        let v = Vec3::new(0.3, -1.2, 5.0);
        let back = inv * (m3 * v);
        assert!((back - v).len() < 1e-4);
    }

    #[test]
    fn test_mat3_singular_has_no_inverse() {
        let m = Mat4::scaling(Vec3::new(1.0, 0.0, 1.0)).top_left_3x3();
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_mat4_translation() {
        let m = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let p = m * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p, Vec4::new(2.0, 3.0, 4.0, 1.0));
        // Directions are unaffected
        let d = m * Vec4::new(1.0, 1.0, 1.0, 0.0);
        assert_eq!(d, Vec4::new(1.0, 1.0, 1.0, 0.0));
    }

    #[test]
    fn test_rect_intersection() {
        let a = IntRect::new(0, 0, 100, 100);
        let b = IntRect::new(90, -5, 20, 20);
        let c = a.intersected(&b);
        assert_eq!(c, IntRect::new(90, 0, 10, 15));
        assert_eq!(c.max_x(), 99);

        let disjoint = a.intersected(&IntRect::new(200, 200, 5, 5));
        assert!(disjoint.is_empty());
    }
}
