use std::ops::Mul;

use super::vector::Vec3;

// Based on Physically Based Rendering 3rd ed.
// http://www.pbr-book.org/3ed-2018/Geometry_and_Transforms/Transforms.html

/// An affine transform with its inverse cached.
///
/// Only the top three rows are stored, the bottom row is implicitly `[0 0 0 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    m: [[f32; 4]; 3],
    m_inv: [[f32; 4]; 3],
}

const IDENTITY_ROWS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Creates a new `Transform` from raw affine rows, computing the inverse.
    pub fn new(m: [[f32; 4]; 3]) -> Self {
        let m_inv = quick_inverse(&m);
        Self { m, m_inv }
    }

    /// Creates a new `Transform` from rows and their known inverse.
    pub fn new_full(m: [[f32; 4]; 3], m_inv: [[f32; 4]; 3]) -> Self {
        Self { m, m_inv }
    }

    /// Creates a new identity `Transform`.
    pub fn identity() -> Self {
        Self::new_full(IDENTITY_ROWS, IDENTITY_ROWS)
    }

    /// Creates a translation by `v`.
    pub fn translation(v: Vec3<f32>) -> Self {
        Self::new_full(
            [
                [1.0, 0.0, 0.0, v.x],
                [0.0, 1.0, 0.0, v.y],
                [0.0, 0.0, 1.0, v.z],
            ],
            [
                [1.0, 0.0, 0.0, -v.x],
                [0.0, 1.0, 0.0, -v.y],
                [0.0, 0.0, 1.0, -v.z],
            ],
        )
    }

    /// Creates a non-uniform scale by `v`.
    pub fn scale(v: Vec3<f32>) -> Self {
        Self::new_full(
            [
                [v.x, 0.0, 0.0, 0.0],
                [0.0, v.y, 0.0, 0.0],
                [0.0, 0.0, v.z, 0.0],
            ],
            [
                [1.0 / v.x, 0.0, 0.0, 0.0],
                [0.0, 1.0 / v.y, 0.0, 0.0],
                [0.0, 0.0, 1.0 / v.z, 0.0],
            ],
        )
    }

    /// Returns the inverse of this `Transform`.
    pub fn inverted(&self) -> Self {
        Self::new_full(self.m_inv, self.m)
    }

    /// Checks if this `Transform` is the identity transform.
    pub fn is_identity(&self) -> bool {
        self.m == IDENTITY_ROWS
    }

    /// Checks if this `Transform` swaps the handedness of the coordinate system.
    pub fn swaps_handedness(&self) -> bool {
        det3(&self.m) < 0.0
    }

    /// Transforms `p` as a position.
    pub fn point(&self, p: Vec3<f32>) -> Vec3<f32> {
        let m = &self.m;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    /// Transforms `v` as a direction, ignoring translation.
    pub fn direction(&self, v: Vec3<f32>) -> Vec3<f32> {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Transforms `n` as a normal, i.e. with the inverse transpose.
    ///
    /// The result is not normalized.
    pub fn normal(&self, n: Vec3<f32>) -> Vec3<f32> {
        let mi = &self.m_inv;
        Vec3::new(
            mi[0][0] * n.x + mi[1][0] * n.y + mi[2][0] * n.z,
            mi[0][1] * n.x + mi[1][1] * n.y + mi[2][1] * n.z,
            mi[0][2] * n.x + mi[1][2] * n.y + mi[2][2] * n.z,
        )
    }
}

impl<'a> Mul<&'a Transform> for &'a Transform {
    type Output = Transform;

    /// Composes the transforms so that `other` is applied first.
    fn mul(self, other: &'a Transform) -> Transform {
        Transform::new_full(
            affine_mul(&self.m, &other.m),
            affine_mul(&other.m_inv, &self.m_inv),
        )
    }
}

fn det3(m: &[[f32; 4]; 3]) -> f32 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn affine_mul(a: &[[f32; 4]; 3], b: &[[f32; 4]; 3]) -> [[f32; 4]; 3] {
    let mut ret = [[0.0; 4]; 3];
    for row in 0..3 {
        for col in 0..4 {
            let mut v = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
            if col == 3 {
                v += a[row][3];
            }
            ret[row][col] = v;
        }
    }
    ret
}

/// Inverts an affine transform through the adjugate of its linear part.
///
/// Singular input gives a zero linear part instead of infinities.
fn quick_inverse(m: &[[f32; 4]; 3]) -> [[f32; 4]; 3] {
    let det = det3(m);
    let inv_det = if det != 0.0 { 1.0 / det } else { 0.0 };

    let mut l = [[0.0f32; 3]; 3];
    l[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
    l[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
    l[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
    l[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
    l[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
    l[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
    l[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
    l[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
    l[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

    let t = [m[0][3], m[1][3], m[2][3]];
    let mut ret = [[0.0; 4]; 3];
    for row in 0..3 {
        ret[row][0] = l[row][0];
        ret[row][1] = l[row][1];
        ret[row][2] = l[row][2];
        ret[row][3] = -(l[row][0] * t[0] + l[row][1] * t[1] + l[row][2] * t[2]);
    }
    ret
}
