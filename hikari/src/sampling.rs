use crate::math::{make_orthonormals, Vec2, Vec3};

use std::f32::consts::{FRAC_1_PI, FRAC_PI_2, FRAC_PI_4, PI};

// Based on Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Monte_Carlo_Integration/2D_Sampling_with_Multidimensional_Transformations

pub fn concentric_sample_disk(u: Vec2<f32>) -> Vec2<f32> {
    let offset = u * 2.0 - Vec2::new(1.0, 1.0);
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::zeros();
    }

    let (theta, r) = if offset.x.abs() > offset.y.abs() {
        (FRAC_PI_4 * (offset.y / offset.x), offset.x)
    } else {
        (FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y), offset.y)
    };

    Vec2::new(theta.cos(), theta.sin()) * r
}

/// Samples a direction around `n` with a cosine-weighted distribution.
///
/// Returns the direction and its solid angle pdf.
pub fn cosine_sample_hemisphere(n: Vec3<f32>, u: Vec2<f32>) -> (Vec3<f32>, f32) {
    let d = concentric_sample_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    let (t, b) = make_orthonormals(n);
    let wi = t * d.x + b * d.y + n * z;
    (wi, z * FRAC_1_PI)
}

/// Samples a direction around `n` with a uniform distribution.
///
/// Returns the direction and its solid angle pdf.
pub fn uniform_sample_hemisphere(n: Vec3<f32>, u: Vec2<f32>) -> (Vec3<f32>, f32) {
    let z = u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    let (t, b) = make_orthonormals(n);
    let wi = t * (r * phi.cos()) + b * (r * phi.sin()) + n * z;
    (wi, 0.5 * FRAC_1_PI)
}

// Based on Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Monte_Carlo_Integration/Importance_Sampling#MultipleImportanceSampling

/// Single-sample balance heuristic weight for the technique with `f_pdf`.
pub fn balance_heuristic(f_pdf: f32, g_pdf: f32) -> f32 {
    let denom = f_pdf + g_pdf;
    if denom > 0.0 {
        f_pdf / denom
    } else {
        0.0
    }
}

/// Single-sample power heuristic (beta = 2) weight for the technique with `f_pdf`.
pub fn power_heuristic(f_pdf: f32, g_pdf: f32) -> f32 {
    let f = f_pdf * f_pdf;
    let denom = f + g_pdf * g_pdf;
    if denom > 0.0 {
        f / denom
    } else {
        0.0
    }
}
