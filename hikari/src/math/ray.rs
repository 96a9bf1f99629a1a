use super::vector::Vec3;

/// Screen-space derivatives of a scalar quantity.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Differential {
    pub dx: f32,
    pub dy: f32,
}

/// Screen-space derivatives of a vector quantity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Differential3 {
    pub dx: Vec3<f32>,
    pub dy: Vec3<f32>,
}

impl Default for Differential3 {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Differential3 {
    pub fn zeros() -> Self {
        Self {
            dx: Vec3::zeros(),
            dy: Vec3::zeros(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.dx.is_zero() && self.dy.is_zero()
    }
}

/// A ray with the time it was cast at and its differentials.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin
    pub o: Vec3<f32>,
    /// Direction
    pub d: Vec3<f32>,
    pub t_max: f32,
    /// Shutter time in `[0, 1]`
    pub time: f32,
    /// Origin differentials
    pub dp: Differential3,
    /// Direction differentials
    pub dd: Differential3,
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0), f32::INFINITY)
    }
}

impl Ray {
    /// Creates a new ray at the middle of the shutter interval with no differentials.
    pub fn new(o: Vec3<f32>, d: Vec3<f32>, t_max: f32) -> Self {
        debug_assert!(!t_max.is_nan());
        Self {
            o,
            d,
            t_max,
            time: 0.5,
            dp: Differential3::zeros(),
            dd: Differential3::zeros(),
        }
    }

    /// Returns the point at distance `t` along the ray.
    pub fn point(&self, t: f32) -> Vec3<f32> {
        self.o + self.d * t
    }
}

// Based on "Tracing Ray Differentials", Igehy 1999

/// Transfers the position differential `dp` along `d` by `t` onto the plane with normal `ng`.
pub fn differential_transfer(
    dp: &Differential3,
    d: Vec3<f32>,
    dd: &Differential3,
    ng: Vec3<f32>,
    t: f32,
) -> Differential3 {
    let d_ng = d.dot(ng);
    if d_ng == 0.0 {
        return Differential3::zeros();
    }
    let tmp = d / d_ng;

    let transfer = |dp: Vec3<f32>, dd: Vec3<f32>| {
        let v = dp + dd * t;
        v - tmp * v.dot(ng)
    };

    Differential3 {
        dx: transfer(dp.dx, dd.dx),
        dy: transfer(dp.dy, dd.dy),
    }
}

/// Incoming direction differentials from ray direction differentials.
pub fn differential_incoming(dd: &Differential3) -> Differential3 {
    Differential3 {
        dx: -dd.dx,
        dy: -dd.dy,
    }
}

/// Solves the parametric differentials `(du, dv)` from the position differentials.
///
/// The 3x2 system is projected onto the plane where `ng` is the largest to
/// keep the solve well conditioned.
pub fn differential_dudv(
    dpdu: Vec3<f32>,
    dpdv: Vec3<f32>,
    dp: &Differential3,
    ng: Vec3<f32>,
) -> (Differential, Differential) {
    let n = ng.abs();
    let (a, b) = if n.x > n.y && n.x > n.z {
        (1, 2)
    } else if n.y > n.z {
        (0, 2)
    } else {
        (0, 1)
    };

    let det = dpdu[a] * dpdv[b] - dpdv[a] * dpdu[b];
    let inv_det = if det != 0.0 { 1.0 / det } else { 0.0 };

    let solve = |d: Vec3<f32>| {
        let du = (d[a] * dpdv[b] - d[b] * dpdv[a]) * inv_det;
        let dv = (d[b] * dpdu[a] - d[a] * dpdu[b]) * inv_det;
        (du, dv)
    };

    let (du_dx, dv_dx) = solve(dp.dx);
    let (du_dy, dv_dy) = solve(dp.dy);

    (
        Differential {
            dx: du_dx,
            dy: du_dy,
        },
        Differential {
            dx: dv_dx,
            dy: dv_dy,
        },
    )
}
