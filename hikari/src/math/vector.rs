use approx::{AbsDiffEq, RelativeEq};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign,
};

use super::common::{FloatValueType, ValueType};

// Based on Physically Based Rendering 3rd ed.
// http://www.pbr-book.org/3ed-2018/Geometry_and_Transformations/Vectors.html

/// A two-dimensional vector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vec2<T>
where
    T: ValueType,
{
    /// The x component of the vector.
    pub x: T,
    /// The y component of the vector.
    pub y: T,
}

/// A three-dimensional vector.
///
/// Positions, directions and normals all use this type, the transform
/// used on them is picked by the caller.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vec3<T>
where
    T: ValueType,
{
    /// The x component of the vector.
    pub x: T,
    /// The y component of the vector.
    pub y: T,
    /// The z component of the vector.
    pub z: T,
}

/// Shorthand constructor for [`Vec2`].
pub fn vec2<T: ValueType>(x: T, y: T) -> Vec2<T> {
    Vec2::new(x, y)
}

/// Shorthand constructor for [`Vec3`].
pub fn vec3<T: ValueType>(x: T, y: T, z: T) -> Vec3<T> {
    Vec3::new(x, y, z)
}

// Component-wise ops shared by the vector-like types of this module and the
// spectrum module.
macro_rules! impl_vec_like_ops {
    ( $vec:ident [ $( $c:ident )+ ] ) => {
        impl<T: ValueType> $vec<T> {
            /// Returns a new value with all components set to zero.
            #[inline]
            pub fn zeros() -> Self {
                Self { $( $c: T::zero() ),+ }
            }

            /// Returns a new value with all components set to one.
            #[inline]
            pub fn ones() -> Self {
                Self { $( $c: T::one() ),+ }
            }

            /// Returns `true` if any component is NaN.
            pub fn has_nans(&self) -> bool {
                // Cast to f64 since it is the largest floating point type
                false $( || self.$c.to_f64().map_or(true, |v| v.is_nan()) )+
            }

            /// Returns the component-wise minimum of the two values.
            #[inline]
            pub fn min(&self, other: Self) -> Self {
                Self { $( $c: self.$c.mini(other.$c) ),+ }
            }

            /// Returns the component-wise maximum of the two values.
            #[inline]
            pub fn max(&self, other: Self) -> Self {
                Self { $( $c: self.$c.maxi(other.$c) ),+ }
            }
        }

        impl<T: ValueType> Default for $vec<T> {
            fn default() -> Self {
                Self::zeros()
            }
        }

        impl<T: ValueType> From<T> for $vec<T> {
            fn from(v: T) -> Self {
                Self { $( $c: v ),+ }
            }
        }

        impl<T: ValueType> Add for $vec<T> {
            type Output = Self;

            #[inline]
            fn add(self, other: Self) -> Self {
                Self { $( $c: self.$c + other.$c ),+ }
            }
        }

        impl<T: ValueType> Sub for $vec<T> {
            type Output = Self;

            #[inline]
            fn sub(self, other: Self) -> Self {
                Self { $( $c: self.$c - other.$c ),+ }
            }
        }

        impl<T: ValueType> AddAssign for $vec<T> {
            #[inline]
            fn add_assign(&mut self, other: Self) {
                $( self.$c = self.$c + other.$c; )+
            }
        }

        impl<T: ValueType> SubAssign for $vec<T> {
            #[inline]
            fn sub_assign(&mut self, other: Self) {
                $( self.$c = self.$c - other.$c; )+
            }
        }

        impl<T: ValueType> Mul<T> for $vec<T> {
            type Output = Self;

            #[inline]
            fn mul(self, s: T) -> Self {
                Self { $( $c: self.$c * s ),+ }
            }
        }

        impl<T: ValueType> Div<T> for $vec<T> {
            type Output = Self;

            #[inline]
            fn div(self, s: T) -> Self {
                Self { $( $c: self.$c / s ),+ }
            }
        }

        impl<T: ValueType> MulAssign<T> for $vec<T> {
            #[inline]
            fn mul_assign(&mut self, s: T) {
                $( self.$c = self.$c * s; )+
            }
        }

        impl<T: ValueType> DivAssign<T> for $vec<T> {
            #[inline]
            fn div_assign(&mut self, s: T) {
                $( self.$c = self.$c / s; )+
            }
        }

        impl<T: ValueType + Neg<Output = T>> Neg for $vec<T> {
            type Output = Self;

            #[inline]
            fn neg(self) -> Self {
                Self { $( $c: -self.$c ),+ }
            }
        }
    };
}
pub(crate) use impl_vec_like_ops;

// Approx comparisons, only needed for the float instantiations
macro_rules! impl_vec_like_approx_eq {
    ( $( $vec:ident < $t:ty > [ $( $c:ident )+ ] ),+ ) => {
        $(
            impl AbsDiffEq for $vec<$t> {
                type Epsilon = $t;

                fn default_epsilon() -> $t {
                    <$t>::default_epsilon()
                }

                fn abs_diff_eq(&self, other: &Self, epsilon: $t) -> bool {
                    true $( && self.$c.abs_diff_eq(&other.$c, epsilon) )+
                }
            }

            impl RelativeEq for $vec<$t> {
                fn default_max_relative() -> $t {
                    <$t>::default_max_relative()
                }

                fn relative_eq(&self, other: &Self, epsilon: $t, max_relative: $t) -> bool {
                    true $( && self.$c.relative_eq(&other.$c, epsilon, max_relative) )+
                }
            }
        )+
    };
}
pub(crate) use impl_vec_like_approx_eq;

impl_vec_like_ops!(Vec2 [x y]);
impl_vec_like_ops!(Vec3 [x y z]);

impl_vec_like_approx_eq!(
    Vec2<f32> [x y],
    Vec3<f32> [x y z],
    Vec2<f64> [x y],
    Vec3<f64> [x y z]
);

impl<T> Vec2<T>
where
    T: ValueType,
{
    /// Creates a new `Vec2`.
    ///
    /// Has a debug assert that checks for NaNs.
    #[inline]
    pub fn new(x: T, y: T) -> Self {
        let v = Self { x, y };
        debug_assert!(!v.has_nans());
        v
    }

    /// Returns the dot product of the two vectors.
    #[inline]
    pub fn dot(&self, other: Self) -> T {
        self.x * other.x + self.y * other.y
    }
}

impl<T> Vec3<T>
where
    T: ValueType,
{
    /// Creates a new `Vec3`.
    ///
    /// Has a debug assert that checks for NaNs.
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Self {
        let v = Self { x, y, z };
        debug_assert!(!v.has_nans());
        v
    }

    /// Returns the dot product of the two vectors.
    #[inline]
    pub fn dot(&self, other: Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the cross product of the two vectors.
    #[inline]
    pub fn cross(&self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Returns the squared length of the vector.
    #[inline]
    pub fn len_sqr(&self) -> T {
        self.dot(*self)
    }

    /// Finds the value of the minimum component in this `Vec3`.
    #[inline]
    pub fn min_comp(&self) -> T {
        self.x.mini(self.y.mini(self.z))
    }

    /// Finds the value of the maximum component in this `Vec3`.
    #[inline]
    pub fn max_comp(&self) -> T {
        self.x.maxi(self.y.maxi(self.z))
    }

    /// Returns `true` if all components are exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == T::zero() && self.y == T::zero() && self.z == T::zero()
    }
}

impl<T> Vec3<T>
where
    T: FloatValueType,
{
    /// Returns the length of the vector.
    #[inline]
    pub fn len(&self) -> T {
        self.len_sqr().sqrt()
    }

    /// Returns the vector scaled to unit length.
    #[inline]
    pub fn normalized(&self) -> Self {
        let l = self.len();
        debug_assert!(l > T::zero());
        *self / l
    }

    /// Returns the vector scaled to unit length or zero if its length is zero.
    #[inline]
    pub fn safe_normalized(&self) -> Self {
        let l = self.len();
        if l > T::zero() {
            *self / l
        } else {
            Self::zeros()
        }
    }

    /// Returns the component-wise absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Flips the vector to the same hemisphere as `v`.
    #[inline]
    pub fn faceforward(&self, v: Self) -> Self {
        if self.dot(v) < T::zero() {
            -*self
        } else {
            *self
        }
    }
}

impl<T> Index<usize> for Vec3<T>
where
    T: ValueType,
{
    type Output = T;

    fn index(&self, component: usize) -> &Self::Output {
        match component {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Out of bounds Vec3 access with component {}", component),
        }
    }
}

impl<T> IndexMut<usize> for Vec3<T>
where
    T: ValueType,
{
    fn index_mut(&mut self, component: usize) -> &mut Self::Output {
        match component {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Out of bounds Vec3 access with component {}", component),
        }
    }
}
