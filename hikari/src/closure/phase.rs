use super::{ClosureSample, Label};
use crate::math::{make_orthonormals, Differential3, Spectrum, Vec2, Vec3};

use std::f32::consts::{FRAC_1_PI, PI};

// Based on Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Volume_Scattering/Phase_Functions

const ISOTROPIC: f32 = 0.25 * FRAC_1_PI;

/// Henyey-Greenstein phase function.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HenyeyGreenstein {
    /// Mean cosine, positive for forward scattering
    pub g: f32,
}

fn hg_density(cos_theta: f32, g: f32) -> f32 {
    let denom = (1.0 + g * g - 2.0 * g * cos_theta).max(0.0);
    ((1.0 - g * g) / denom.powf(1.5)) * ISOTROPIC
}

impl HenyeyGreenstein {
    pub fn new(g: f32) -> Self {
        // Exactly +-1 is a delta that can't be sampled
        Self {
            g: g.signum() * g.abs().min(1.0 - 1e-3),
        }
    }

    pub fn merge(&self, other: &Self) -> bool {
        self.g == other.g
    }

    /// `i` points back towards where the ray came from.
    pub fn eval(&self, i: Vec3<f32>, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        let pdf = if self.g.abs() < 1e-3 {
            ISOTROPIC
        } else {
            hg_density((-i).dot(omega_in), self.g)
        };
        (Spectrum::from(pdf), pdf)
    }

    pub fn sample(&self, i: Vec3<f32>, di: &Differential3, u: Vec2<f32>) -> ClosureSample {
        let g = self.g;
        let (cos_theta, pdf) = if g.abs() < 1e-3 {
            (1.0 - 2.0 * u.x, ISOTROPIC)
        } else {
            let k = (1.0 - g * g) / (1.0 - g + 2.0 * g * u.x);
            let cos_theta = ((1.0 + g * g - k * k) / (2.0 * g)).clamp(-1.0, 1.0);
            (cos_theta, hg_density(cos_theta, g))
        };

        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * u.y;
        let (t, b) = make_orthonormals(-i);
        let omega_in =
            t * (sin_theta * phi.cos()) + b * (sin_theta * phi.sin()) + (-i) * cos_theta;

        ClosureSample {
            label: Label::VOLUME_SCATTER,
            eval: Spectrum::from(pdf),
            omega_in,
            domega_in: Differential3 {
                dx: -di.dx,
                dy: -di.dy,
            },
            pdf,
        }
    }
}
