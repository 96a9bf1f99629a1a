mod common;
mod ray;
mod spectrum;
mod transform;
mod vector;

pub use common::{FloatValueType, Maxi, Mini, ValueType};
pub use ray::{
    differential_dudv, differential_incoming, differential_transfer, Differential,
    Differential3, Ray,
};
pub use spectrum::Spectrum;
pub use transform::Transform;
pub use vector::{vec2, vec3, Vec2, Vec3};

/// Returns `a / b` or zero if `b` is zero.
#[inline]
pub fn safe_divide(a: f32, b: f32) -> f32 {
    if b != 0.0 {
        a / b
    } else {
        0.0
    }
}

/// Builds two tangents perpendicular to `n` and each other.
///
/// `n` is expected to be normalized.
pub fn make_orthonormals(n: Vec3<f32>) -> (Vec3<f32>, Vec3<f32>) {
    // Based on "Building an Orthonormal Basis, Revisited", Duff et al. 2017
    let sign = 1.0f32.copysign(n.z);
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let t = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bt = Vec3::new(b, sign + n.y * n.y * a, -n.y);
    (t, bt)
}
