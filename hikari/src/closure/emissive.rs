use crate::math::{Spectrum, Vec3};

/// Emission seen from `i`, cut off when looking exactly along the surface.
pub fn emissive_simple_eval(ng: Vec3<f32>, i: Vec3<f32>) -> Spectrum<f32> {
    let cos_no = ng.dot(i).abs();
    Spectrum::from(if cos_no > 0.0 { 1.0 } else { 0.0 })
}
