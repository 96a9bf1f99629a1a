use crate::{math::Vec3, shader::ShaderId};

/// Object-space data of one triangle.
///
/// Barycentrics follow `p = u * p0 + v * p1 + (1 - u - v) * p2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleGeometry {
    pub p: [Vec3<f32>; 3],
    /// Vertex normals for smooth shading
    pub n: Option<[Vec3<f32>; 3]>,
    pub shader: ShaderId,
}

impl TriangleGeometry {
    pub fn new(p: [Vec3<f32>; 3], shader: ShaderId) -> Self {
        Self { p, n: None, shader }
    }

    pub fn with_normals(self, n: [Vec3<f32>; 3]) -> Self {
        Self { n: Some(n), ..self }
    }

    /// Geometric normal from the winding order.
    pub fn normal(&self) -> Vec3<f32> {
        (self.p[1] - self.p[0])
            .cross(self.p[2] - self.p[0])
            .safe_normalized()
    }

    /// Position at barycentrics `(u, v)`.
    pub fn point(&self, u: f32, v: f32) -> Vec3<f32> {
        let w = 1.0 - u - v;
        self.p[0] * u + self.p[1] * v + self.p[2] * w
    }

    /// Interpolated vertex normal, or `None` if there are no vertex normals.
    pub fn smooth_normal(&self, u: f32, v: f32) -> Option<Vec3<f32>> {
        let n = self.n?;
        let w = 1.0 - u - v;
        let interpolated = n[0] * u + n[1] * v + n[2] * w;
        if interpolated.is_zero() {
            None
        } else {
            Some(interpolated.normalized())
        }
    }

    /// Position derivatives with respect to the barycentrics.
    pub fn dpdudv(&self) -> (Vec3<f32>, Vec3<f32>) {
        (self.p[0] - self.p[2], self.p[1] - self.p[2])
    }

    /// Vertex normal derivatives with respect to the barycentrics, zero without vertex normals.
    pub fn dndudv(&self) -> (Vec3<f32>, Vec3<f32>) {
        match self.n {
            Some(n) => (n[0] - n[2], n[1] - n[2]),
            None => (Vec3::zeros(), Vec3::zeros()),
        }
    }
}
