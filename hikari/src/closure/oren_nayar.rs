use super::{ClosureSample, Label};
use crate::{
    math::{Differential3, Spectrum, Vec2, Vec3},
    sampling::uniform_sample_hemisphere,
};

use std::f32::consts::{FRAC_1_PI, PI};

// Qualitative Oren-Nayar with the energy normalization from
// "A tiny improvement of Oren-Nayar reflectance model", Fujii 2012

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrenNayarBsdf {
    pub n: Vec3<f32>,
    pub roughness: f32,
    a: f32,
    b: f32,
}

impl OrenNayarBsdf {
    pub fn new(n: Vec3<f32>, roughness: f32) -> Self {
        let sigma = roughness.clamp(0.0, 1.0);
        let div = 1.0 / (PI + ((3.0 * PI - 4.0) / 6.0) * sigma);
        Self {
            n,
            roughness,
            a: div,
            b: sigma * div,
        }
    }

    pub fn merge(&self, other: &Self) -> bool {
        self.n == other.n && self.roughness == other.roughness
    }

    fn intensity(&self, v: Vec3<f32>, l: Vec3<f32>) -> Spectrum<f32> {
        let nl = self.n.dot(l).max(0.0);
        let nv = self.n.dot(v).max(0.0);
        let mut t = l.dot(v) - nl * nv;
        if t > 0.0 {
            t /= nl.max(nv) + f32::MIN_POSITIVE;
        }
        Spectrum::from(nl * (self.a + self.b * t))
    }

    pub fn eval_reflect(&self, i: Vec3<f32>, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        if self.n.dot(omega_in) > 0.0 {
            (self.intensity(i, omega_in), 0.5 * FRAC_1_PI)
        } else {
            (Spectrum::zeros(), 0.0)
        }
    }

    pub fn sample(
        &self,
        ng: Vec3<f32>,
        i: Vec3<f32>,
        di: &Differential3,
        u: Vec2<f32>,
    ) -> ClosureSample {
        let (omega_in, pdf) = uniform_sample_hemisphere(self.n, u);
        if ng.dot(omega_in) <= 0.0 {
            return ClosureSample::default();
        }

        let domega_in = Differential3 {
            dx: self.n * (2.0 * self.n.dot(di.dx)) - di.dx,
            dy: self.n * (2.0 * self.n.dot(di.dy)) - di.dy,
        };

        ClosureSample {
            label: Label::REFLECT | Label::DIFFUSE,
            eval: self.intensity(i, omega_in),
            omega_in,
            domega_in,
            pdf,
        }
    }
}
