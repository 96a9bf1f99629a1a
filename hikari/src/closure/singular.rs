use super::{ClosureSample, Label};
use crate::math::{Differential3, Spectrum, Vec3};

/// Stand-in density and value for delta lobes so that MIS against them still works.
pub const SINGULAR_PDF: f32 = 1e6;

/// Result of [`fresnel_dielectric`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FresnelDielectric {
    /// Reflectance
    pub fresnel: f32,
    /// Mirrored direction
    pub r: Vec3<f32>,
    /// Refracted direction, `None` on total internal reflection
    pub t: Option<Vec3<f32>>,
    /// Set if `i` came from the back side of `n`
    pub inside: bool,
}

// Based on Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Reflection_Models/Specular_Reflection_and_Transmission

/// Reflects and refracts `i` about `n` for relative index of refraction `eta`.
///
/// `i` points away from the surface.
pub fn fresnel_dielectric(eta: f32, n: Vec3<f32>, i: Vec3<f32>) -> FresnelDielectric {
    let mut cos = n.dot(i);
    let (neta, nn, inside) = if cos > 0.0 {
        (1.0 / eta, n, false)
    } else {
        cos = -cos;
        (eta, -n, true)
    };

    let r = nn * (2.0 * cos) - i;
    let arg = 1.0 - (neta * neta * (1.0 - cos * cos));
    if arg < 0.0 {
        return FresnelDielectric {
            fresnel: 1.0,
            r,
            t: None,
            inside,
        };
    }

    let dnp = arg.sqrt().max(1e-7);
    let nk = neta * cos - dnp;
    let t = -(i * neta) + nn * nk;

    let cos_theta_1 = cos;
    let cos_theta_2 = -nn.dot(t);
    let p_para = (cos_theta_1 - eta * cos_theta_2) / (cos_theta_1 + eta * cos_theta_2);
    let p_perp = (eta * cos_theta_1 - cos_theta_2) / (eta * cos_theta_1 + cos_theta_2);

    FresnelDielectric {
        fresnel: 0.5 * (p_para * p_para + p_perp * p_perp),
        r,
        t: Some(t),
        inside,
    }
}

fn mirror_differential(n: Vec3<f32>, di: &Differential3) -> Differential3 {
    Differential3 {
        dx: n * (2.0 * n.dot(di.dx)) - di.dx,
        dy: n * (2.0 * n.dot(di.dy)) - di.dy,
    }
}

/// Perfect mirror around `n`.
pub fn sample_reflection(
    n: Vec3<f32>,
    ng: Vec3<f32>,
    i: Vec3<f32>,
    di: &Differential3,
) -> ClosureSample {
    let cos_no = n.dot(i);
    if cos_no <= 0.0 {
        return ClosureSample::default();
    }

    let omega_in = n * (2.0 * cos_no) - i;
    if ng.dot(omega_in) <= 0.0 {
        return ClosureSample::default();
    }

    ClosureSample {
        label: Label::REFLECT | Label::SINGULAR,
        eval: Spectrum::from(SINGULAR_PDF),
        omega_in,
        domega_in: mirror_differential(n, di),
        pdf: SINGULAR_PDF,
    }
}

/// Perfect refraction into a medium with index of refraction `ior` relative to the outside.
pub fn sample_refraction(
    n: Vec3<f32>,
    ior: f32,
    i: Vec3<f32>,
    di: &Differential3,
) -> ClosureSample {
    let FresnelDielectric {
        fresnel, t, inside, ..
    } = fresnel_dielectric(ior, n, i);
    match t {
        Some(t) if !inside && fresnel != 1.0 => ClosureSample {
            label: Label::TRANSMIT | Label::SINGULAR,
            eval: Spectrum::from(SINGULAR_PDF),
            omega_in: t,
            domega_in: Differential3 {
                dx: -di.dx / ior,
                dy: -di.dy / ior,
            },
            pdf: SINGULAR_PDF,
        },
        _ => ClosureSample::default(),
    }
}

/// Straight pass-through, not counted as a real bounce.
pub fn sample_transparent(i: Vec3<f32>, di: &Differential3) -> ClosureSample {
    ClosureSample {
        label: Label::TRANSMIT | Label::TRANSPARENT,
        eval: Spectrum::ones(),
        omega_in: -i,
        domega_in: Differential3 {
            dx: -di.dx,
            dy: -di.dy,
        },
        pdf: 1.0,
    }
}
