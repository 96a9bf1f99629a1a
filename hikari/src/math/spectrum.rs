use approx::{AbsDiffEq, RelativeEq};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign,
};

use super::{
    common::{FloatValueType, ValueType},
    vector::{impl_vec_like_approx_eq, impl_vec_like_ops},
};

// Based on Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Color_and_Radiometry/Spectral_Representation

/// A spectral power distribution stored as RGB
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spectrum<T>
where
    T: ValueType,
{
    /// The r component of the spd
    pub r: T,
    /// The g component of the spd
    pub g: T,
    /// The b component of the spd
    pub b: T,
}

impl_vec_like_ops!(Spectrum [r g b]);
impl_vec_like_approx_eq!(Spectrum<f32> [r g b], Spectrum<f64> [r g b]);

impl<T> Spectrum<T>
where
    T: ValueType,
{
    /// Creates a new `Spectrum`.
    ///
    /// Has a debug assert that checks for NaNs.
    #[inline]
    pub fn new(r: T, g: T, b: T) -> Self {
        let s = Self { r, g, b };
        debug_assert!(!s.has_nans());
        s
    }

    /// Checks if all the samples are zero.
    #[inline]
    pub fn is_black(&self) -> bool {
        self.r == T::zero() && self.g == T::zero() && self.b == T::zero()
    }

    /// Returns the sum of the samples.
    #[inline]
    pub fn sum(&self) -> T {
        self.r + self.g + self.b
    }

    /// Returns the largest sample.
    #[inline]
    pub fn max_comp(&self) -> T {
        self.r.maxi(self.g.maxi(self.b))
    }

    /// Returns the spectrum with each sample clamped to `[lo, hi]`.
    #[inline]
    pub fn clamped(&self, lo: T, hi: T) -> Self {
        self.max(Self::from(lo)).min(Self::from(hi))
    }
}

impl<T> Spectrum<T>
where
    T: FloatValueType,
{
    /// Returns the mean of the samples.
    #[inline]
    pub fn average(&self) -> T {
        // 3 is exactly representable in every float type
        self.sum() / T::from_u8(3).unwrap_or_else(T::one)
    }

    /// Returns the spectrum with the absolute value of each sample.
    #[inline]
    pub fn abs(&self) -> Self {
        Self::new(self.r.abs(), self.g.abs(), self.b.abs())
    }
}

impl<T> Mul for Spectrum<T>
where
    T: ValueType,
{
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }
}

impl<T> MulAssign for Spectrum<T>
where
    T: ValueType,
{
    #[inline]
    fn mul_assign(&mut self, other: Self) {
        self.r = self.r * other.r;
        self.g = self.g * other.g;
        self.b = self.b * other.b;
    }
}

impl<T> Div for Spectrum<T>
where
    T: ValueType,
{
    type Output = Self;

    #[inline]
    fn div(self, other: Self) -> Self {
        Self::new(self.r / other.r, self.g / other.g, self.b / other.b)
    }
}
