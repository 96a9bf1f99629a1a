use serde::{Deserialize, Serialize};
use strum::Display;

use crate::math::{Spectrum, Vec3};

use std::f32::consts::{FRAC_1_PI, PI};

/// Radius below which a channel is treated as plain diffuse.
pub const BSSRDF_MIN_RADIUS: f32 = 1e-8;

const GAUSS_TRUNCATE: f32 = 12.46;
const BURLEY_TRUNCATE: f32 = 16.0;
// Burley cdf evaluated at the truncation radius
const BURLEY_TRUNCATE_CDF: f32 = 0.996_379;

/// Radial falloff profile of a subsurface closure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display)]
pub enum Falloff {
    Cubic,
    Gaussian,
    Burley,
}

/// Subsurface scattering profile.
///
/// Profiles are planar area densities, integrating `2 * pi * r * eval(r)`
/// over the truncated radius gives one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bssrdf {
    pub n: Vec3<f32>,
    pub falloff: Falloff,
    /// Scatter distance per channel, zero for channels handled as diffuse
    pub radius: Spectrum<f32>,
    pub sharpness: f32,
    pub texture_blur: f32,
    pub albedo: Spectrum<f32>,
    channels: u32,
}

impl Bssrdf {
    pub fn new(
        falloff: Falloff,
        n: Vec3<f32>,
        radius: Spectrum<f32>,
        sharpness: f32,
        texture_blur: f32,
        albedo: Spectrum<f32>,
    ) -> Self {
        let cut = |r: f32| if r < BSSRDF_MIN_RADIUS { 0.0 } else { r };
        let radius = Spectrum::new(cut(radius.r), cut(radius.g), cut(radius.b));
        let channels = [radius.r, radius.g, radius.b]
            .iter()
            .filter(|&&r| r > 0.0)
            .count() as u32;
        Self {
            n,
            falloff,
            radius,
            sharpness: sharpness.clamp(0.0, 1.0),
            texture_blur: texture_blur.clamp(0.0, 1.0),
            albedo,
            channels,
        }
    }

    /// Number of channels with a scatter radius.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn merge(&self, other: &Self) -> bool {
        self.n == other.n
            && self.falloff == other.falloff
            && self.radius == other.radius
            && self.sharpness == other.sharpness
            && self.texture_blur == other.texture_blur
            && self.albedo == other.albedo
    }

    fn channel_eval(&self, radius: f32, albedo: f32, r: f32) -> f32 {
        if radius <= 0.0 {
            return 0.0;
        }
        match self.falloff {
            Falloff::Cubic => cubic_eval(radius, self.sharpness, r),
            Falloff::Gaussian => gaussian_eval(radius, r),
            Falloff::Burley => burley_eval(burley_d(radius, albedo), r),
        }
    }

    fn channel_pdf(&self, radius: f32, albedo: f32, r: f32) -> f32 {
        if radius <= 0.0 {
            return 0.0;
        }
        match self.falloff {
            Falloff::Cubic => cubic_eval(radius, self.sharpness, r),
            Falloff::Gaussian => gaussian_pdf(radius, r),
            Falloff::Burley => burley_eval(burley_d(radius, albedo), r) / BURLEY_TRUNCATE_CDF,
        }
    }

    /// Profile value per channel at distance `r`.
    pub fn eval(&self, r: f32) -> Spectrum<f32> {
        Spectrum::new(
            self.channel_eval(self.radius.r, self.albedo.r, r),
            self.channel_eval(self.radius.g, self.albedo.g, r),
            self.channel_eval(self.radius.b, self.albedo.b, r),
        )
    }

    /// Density of [`Bssrdf::sample`] returning `r`, averaged over the sampled channels.
    pub fn pdf(&self, r: f32) -> f32 {
        if self.channels == 0 {
            return 0.0;
        }
        let sum = self.channel_pdf(self.radius.r, self.albedo.r, r)
            + self.channel_pdf(self.radius.g, self.albedo.g, r)
            + self.channel_pdf(self.radius.b, self.albedo.b, r);
        sum / self.channels as f32
    }

    /// Samples a planar distance `r` and the half chord `h` of the sampling sphere at `r`.
    ///
    /// The channel is picked with `xi` which is then reused for the radius.
    pub fn sample(&self, xi: f32) -> Option<(f32, f32)> {
        if self.channels == 0 {
            return None;
        }

        let radii: Vec<(f32, f32)> = [
            (self.radius.r, self.albedo.r),
            (self.radius.g, self.albedo.g),
            (self.radius.b, self.albedo.b),
        ]
        .into_iter()
        .filter(|(r, _)| *r > 0.0)
        .collect();

        let scaled = xi * self.channels as f32;
        let channel = (scaled as usize).min(radii.len() - 1);
        let xi = scaled - channel as f32;
        let (radius, albedo) = radii[channel];

        let sample = match self.falloff {
            Falloff::Cubic => cubic_sample(radius, self.sharpness, xi),
            Falloff::Gaussian => gaussian_sample(radius, xi),
            Falloff::Burley => burley_sample(burley_d(radius, albedo), xi),
        };
        Some(sample)
    }
}

// Cubic falloff with optional sharpness

fn cubic_eval(radius: f32, sharpness: f32, r: f32) -> f32 {
    if sharpness == 0.0 {
        let rm = radius;
        if r >= rm {
            return 0.0;
        }
        let rm5 = (rm * rm) * (rm * rm) * rm;
        let f = rm - r;
        (10.0 * f * f * f) / (rm5 * PI)
    } else {
        let rm = radius * (1.0 + sharpness);
        if r >= rm {
            return 0.0;
        }
        let y = 1.0 / (1.0 + sharpness);
        let (rmy, ry, ryinv) = if sharpness == 1.0 {
            let ry = r.sqrt();
            (rm.sqrt(), ry, if ry > 0.0 { 1.0 / ry } else { 0.0 })
        } else {
            let ryinv = if r > 0.0 { r.powf(2.0 * y - 2.0) } else { 0.0 };
            (rm.powf(y), r.powf(y), ryinv)
        };
        let rmy5 = (rmy * rmy) * (rmy * rmy) * rmy;
        let f = rmy - ry;
        let num = f * (f * f) * (y * ryinv);
        (10.0 * num) / (rmy5 * PI)
    }
}

/// Inverts the cubic cdf `10x^2 - 20x^3 + 15x^4 - 4x^5` with Newton-Raphson.
fn cubic_quintic_root_find(xi: f32) -> f32 {
    const TOLERANCE: f32 = 1e-6;
    const MAX_ITERATIONS: usize = 10;

    let mut x = 0.25;
    for _ in 0..MAX_ITERATIONS {
        let x2 = x * x;
        let x3 = x2 * x;
        let nx = 1.0 - x;
        let f = 10.0 * x2 - 20.0 * x3 + 15.0 * x2 * x2 - 4.0 * x2 * x3 - xi;
        let f_ = 20.0 * (x * nx) * (nx * nx);
        if f.abs() < TOLERANCE || f_ == 0.0 {
            break;
        }
        x = (x - f / f_).clamp(0.0, 1.0);
    }
    x
}

fn cubic_sample(radius: f32, sharpness: f32, xi: f32) -> (f32, f32) {
    let mut rm = radius;
    let mut r = cubic_quintic_root_find(xi);
    if sharpness != 0.0 {
        r = r.powf(1.0 + sharpness);
        rm *= 1.0 + sharpness;
    }
    let r = r * rm;
    (r, (rm * rm - r * r).max(0.0).sqrt())
}

// Gaussian falloff truncated where the tail becomes negligible

fn gaussian_v(radius: f32) -> f32 {
    // Radius set so the result matches the cubic falloff of the same radius
    radius * radius * (0.25 * 0.25)
}

fn gaussian_eval(radius: f32, r: f32) -> f32 {
    let v = gaussian_v(radius);
    let rm = (v * GAUSS_TRUNCATE).sqrt();
    if r >= rm {
        return 0.0;
    }
    (-r * r / (2.0 * v)).exp() / (2.0 * PI * v)
}

fn gaussian_pdf(radius: f32, r: f32) -> f32 {
    let area_truncated = 1.0 - (-0.5 * GAUSS_TRUNCATE).exp();
    gaussian_eval(radius, r) / area_truncated
}

fn gaussian_sample(radius: f32, xi: f32) -> (f32, f32) {
    let v = gaussian_v(radius);
    let rm = (v * GAUSS_TRUNCATE).sqrt();
    let area_truncated = 1.0 - (-0.5 * GAUSS_TRUNCATE).exp();
    let r_squared = (-2.0 * v * (1.0 - xi * area_truncated).ln()).max(0.0);
    let r = r_squared.sqrt();
    (r, (rm * rm - r_squared).max(0.0).sqrt())
}

// Based on "Approximate Reflectance Profiles for Efficient Subsurface Scattering", Christensen and Burley 2015

/// Shape parameter from the searchlight configuration fit.
fn burley_d(radius: f32, albedo: f32) -> f32 {
    let a = albedo.clamp(0.0, 1.0);
    let s = 1.9 - a + 3.5 * (a - 0.8) * (a - 0.8);
    // Scale the mean free path so the result looks like the cubic and gaussian falloffs
    let l = 0.25 * FRAC_1_PI * radius;
    l / s
}

fn burley_eval(d: f32, r: f32) -> f32 {
    let rm = BURLEY_TRUNCATE * d;
    if r >= rm {
        return 0.0;
    }
    let r = r.max(d * 1e-6);
    let exp_r_3_d = (-r / (3.0 * d)).exp();
    let exp_r_d = exp_r_3_d * exp_r_3_d * exp_r_3_d;
    (exp_r_d + exp_r_3_d) / (8.0 * PI * d * r)
}

/// Inverts the scaled Burley cdf `1 - e^-x / 4 - 3 e^(-x / 3) / 4` with Newton-Raphson.
fn burley_root_find(xi: f32) -> f32 {
    const TOLERANCE: f32 = 1e-6;
    const MAX_ITERATIONS: usize = 10;

    // Initial guess from a curve fit keeps the iteration count low over [0, 1]
    let mut r = if xi <= 0.9 {
        (xi * xi * 2.4).exp() - 1.0
    } else {
        15.0
    };
    for _ in 0..MAX_ITERATIONS {
        let exp_r_3 = (-r / 3.0).exp();
        let exp_r = exp_r_3 * exp_r_3 * exp_r_3;
        let f = 1.0 - 0.25 * exp_r - 0.75 * exp_r_3 - xi;
        let f_ = 0.25 * exp_r + 0.25 * exp_r_3;
        if f.abs() < TOLERANCE || f_ == 0.0 {
            break;
        }
        r = (r - f / f_).max(0.0);
    }
    r
}

fn burley_sample(d: f32, xi: f32) -> (f32, f32) {
    let rm = BURLEY_TRUNCATE * d;
    let r = burley_root_find(xi * BURLEY_TRUNCATE_CDF) * d;
    (r, (rm * rm - r * r).max(0.0).sqrt())
}
