use super::{ClosureSample, Label};
use crate::math::{make_orthonormals, Differential3, Spectrum, Vec2, Vec3};

use std::f32::consts::PI;

// Based on "Microfacet Models for Refraction through Rough Surfaces", Walter et al. 2007
// and Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Reflection_Models/Microfacet_Models

/// Roughness below which a GGX lobe is handled as a singular one.
pub const SINGULAR_ALPHA: f32 = 1e-4;

/// Isotropic GGX lobe.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MicrofacetBsdf {
    pub n: Vec3<f32>,
    pub alpha: f32,
    /// Index of refraction of the inside relative to the outside
    pub ior: f32,
}

fn ggx_d(alpha2: f32, cos_m: f32) -> f32 {
    if cos_m <= 0.0 {
        return 0.0;
    }
    let cos2 = cos_m * cos_m;
    let tan2 = (1.0 - cos2) / cos2;
    let e = alpha2 + tan2;
    alpha2 / (PI * cos2 * cos2 * e * e)
}

/// Smith masking for one direction.
fn ggx_g1(alpha2: f32, cos_n: f32) -> f32 {
    let cos2 = cos_n * cos_n;
    if cos2 == 0.0 {
        return 0.0;
    }
    2.0 / (1.0 + (1.0 + alpha2 * (1.0 - cos2) / cos2).sqrt())
}

impl MicrofacetBsdf {
    pub fn new(n: Vec3<f32>, alpha: f32, ior: f32) -> Self {
        Self {
            n,
            alpha: alpha.clamp(0.0, 1.0),
            ior,
        }
    }

    pub fn is_singular(&self) -> bool {
        self.alpha <= SINGULAR_ALPHA
    }

    pub fn merge(&self, other: &Self) -> bool {
        self.n == other.n && self.alpha == other.alpha && self.ior == other.ior
    }

    /// Widens the lobe to at least `roughness`.
    pub fn blur(&mut self, roughness: f32) {
        self.alpha = self.alpha.max(roughness).min(1.0);
    }

    /// Samples a microfacet normal proportional to `D(m) * cos(theta_m)`.
    fn sample_m(&self, u: Vec2<f32>) -> Vec3<f32> {
        let alpha2 = self.alpha * self.alpha;
        let ux = u.x.min(1.0 - f32::EPSILON);
        let tan2 = alpha2 * ux / (1.0 - ux);
        let cos_theta = 1.0 / (1.0 + tan2).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * u.y;

        let (t, b) = make_orthonormals(self.n);
        t * (sin_theta * phi.cos()) + b * (sin_theta * phi.sin()) + self.n * cos_theta
    }

    pub fn eval_reflect(&self, i: Vec3<f32>, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        let cos_no = self.n.dot(i);
        let cos_ni = self.n.dot(omega_in);
        if self.is_singular() || cos_no <= 0.0 || cos_ni <= 0.0 {
            return (Spectrum::zeros(), 0.0);
        }

        let m = (i + omega_in).normalized();
        let cos_m = self.n.dot(m);
        let cos_mi = m.dot(omega_in);
        if cos_mi <= 0.0 {
            return (Spectrum::zeros(), 0.0);
        }

        let alpha2 = self.alpha * self.alpha;
        let d = ggx_d(alpha2, cos_m);
        let g = ggx_g1(alpha2, cos_no) * ggx_g1(alpha2, cos_ni);

        let eval = d * g / (4.0 * cos_no);
        let pdf = d * cos_m / (4.0 * cos_mi);
        (Spectrum::from(eval), pdf)
    }

    pub fn eval_transmit(&self, i: Vec3<f32>, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        let cos_no = self.n.dot(i);
        let cos_ni = self.n.dot(omega_in);
        if self.is_singular() || cos_no <= 0.0 || cos_ni >= 0.0 {
            return (Spectrum::zeros(), 0.0);
        }

        let eta = self.ior;
        let ht = -(omega_in * eta + i);
        let ht2 = ht.len_sqr();
        if ht2 == 0.0 {
            return (Spectrum::zeros(), 0.0);
        }
        let m = ht.normalized().faceforward(self.n);

        let cos_hi = m.dot(omega_in);
        let cos_ho = m.dot(i);
        if cos_ho <= 0.0 || cos_hi >= 0.0 {
            return (Spectrum::zeros(), 0.0);
        }

        let alpha2 = self.alpha * self.alpha;
        let cos_m = self.n.dot(m);
        let d = ggx_d(alpha2, cos_m);
        let g = ggx_g1(alpha2, cos_no) * ggx_g1(alpha2, cos_ni);

        let eta2 = eta * eta;
        let eval = d * g * eta2 * (cos_hi * cos_ho).abs() / (cos_no * ht2);
        let pdf = d * cos_m * eta2 * cos_hi.abs() / ht2;
        (Spectrum::from(eval), pdf)
    }

    pub fn sample_reflect(
        &self,
        ng: Vec3<f32>,
        i: Vec3<f32>,
        di: &Differential3,
        u: Vec2<f32>,
    ) -> ClosureSample {
        if self.n.dot(i) <= 0.0 {
            return ClosureSample::default();
        }

        let m = self.sample_m(u);
        let cos_mo = m.dot(i);
        if cos_mo <= 0.0 {
            return ClosureSample::default();
        }

        let omega_in = m * (2.0 * cos_mo) - i;
        if ng.dot(omega_in) <= 0.0 {
            return ClosureSample::default();
        }

        let (eval, pdf) = self.eval_reflect(i, omega_in);
        if pdf <= 0.0 {
            return ClosureSample::default();
        }

        ClosureSample {
            label: Label::REFLECT | Label::GLOSSY,
            eval,
            omega_in,
            domega_in: Differential3 {
                dx: m * (2.0 * m.dot(di.dx)) - di.dx,
                dy: m * (2.0 * m.dot(di.dy)) - di.dy,
            },
            pdf,
        }
    }

    pub fn sample_refract(
        &self,
        ng: Vec3<f32>,
        i: Vec3<f32>,
        di: &Differential3,
        u: Vec2<f32>,
    ) -> ClosureSample {
        if self.n.dot(i) <= 0.0 {
            return ClosureSample::default();
        }

        let m = self.sample_m(u);
        let cos_mo = m.dot(i);
        if cos_mo <= 0.0 {
            return ClosureSample::default();
        }

        let neta = 1.0 / self.ior;
        let arg = 1.0 - neta * neta * (1.0 - cos_mo * cos_mo);
        if arg < 0.0 {
            // Total internal reflection
            return ClosureSample::default();
        }
        let omega_in = -(i * neta) + m * (neta * cos_mo - arg.sqrt());
        if ng.dot(omega_in) >= 0.0 {
            return ClosureSample::default();
        }

        let (eval, pdf) = self.eval_transmit(i, omega_in);
        if pdf <= 0.0 {
            return ClosureSample::default();
        }

        ClosureSample {
            label: Label::TRANSMIT | Label::GLOSSY,
            eval,
            omega_in,
            domega_in: Differential3 {
                dx: -di.dx * neta,
                dy: -di.dy * neta,
            },
            pdf,
        }
    }
}
