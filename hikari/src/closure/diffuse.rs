use super::{ClosureSample, Label};
use crate::{
    math::{Differential3, Spectrum, Vec2, Vec3},
    sampling::cosine_sample_hemisphere,
};

use std::f32::consts::FRAC_1_PI;

/// Lambertian lobe around `n`, shared by diffuse, translucent and subsurface diffuse closures.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiffuseBsdf {
    pub n: Vec3<f32>,
}

impl DiffuseBsdf {
    pub fn new(n: Vec3<f32>) -> Self {
        Self { n }
    }

    pub fn merge(&self, other: &Self) -> bool {
        self.n == other.n
    }

    pub fn eval_reflect(&self, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        let cos_pi = self.n.dot(omega_in).max(0.0) * FRAC_1_PI;
        (Spectrum::from(cos_pi), cos_pi)
    }

    pub fn sample(
        &self,
        ng: Vec3<f32>,
        di: &Differential3,
        u: Vec2<f32>,
    ) -> ClosureSample {
        let (omega_in, pdf) = cosine_sample_hemisphere(self.n, u);
        if ng.dot(omega_in) <= 0.0 {
            return ClosureSample::default();
        }

        // Mirror the incoming differentials, there's no better estimate for a diffuse bounce
        let domega_in = Differential3 {
            dx: self.n * (2.0 * self.n.dot(di.dx)) - di.dx,
            dy: self.n * (2.0 * self.n.dot(di.dy)) - di.dy,
        };

        ClosureSample {
            label: Label::REFLECT | Label::DIFFUSE,
            eval: Spectrum::from(pdf),
            omega_in,
            domega_in,
            pdf,
        }
    }

    /// Diffuse transmission through the surface.
    pub fn eval_translucent(&self, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        let cos_pi = (-self.n.dot(omega_in)).max(0.0) * FRAC_1_PI;
        (Spectrum::from(cos_pi), cos_pi)
    }

    pub fn sample_translucent(
        &self,
        ng: Vec3<f32>,
        di: &Differential3,
        u: Vec2<f32>,
    ) -> ClosureSample {
        let (omega_in, pdf) = cosine_sample_hemisphere(-self.n, u);
        if ng.dot(omega_in) >= 0.0 {
            return ClosureSample::default();
        }

        let domega_in = Differential3 {
            dx: -(self.n * (2.0 * self.n.dot(di.dx)) - di.dx),
            dy: -(self.n * (2.0 * self.n.dot(di.dy)) - di.dy),
        };

        ClosureSample {
            label: Label::TRANSMIT | Label::DIFFUSE,
            eval: Spectrum::from(pdf),
            omega_in,
            domega_in,
            pdf,
        }
    }
}
