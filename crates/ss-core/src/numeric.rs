use crate::{CoreError, CoreResult};
use nalgebra::{ComplexField, RealField};

/// Scalar type a matrix or controller can be built over (`f32`, `f64`).
pub trait Scalar: RealField + Copy {}

impl<T: RealField + Copy> Scalar for T {}

/// Floating point type used for tolerances and file data
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal<T: Scalar>(a: T, b: T, tol: Tolerances) -> bool {
    let diff = ComplexField::abs(a - b);
    if diff <= from_f64(tol.abs) {
        return true;
    }
    let scale = RealField::max(ComplexField::abs(a), ComplexField::abs(b));
    diff <= from_f64::<T>(tol.rel) * scale
}

pub fn ensure_finite<T: Scalar>(v: T, what: &'static str) -> CoreResult<T> {
    if ComplexField::is_finite(&v) {
        Ok(v)
    } else {
        Err(CoreError::NonFinite {
            what,
            value: v.to_string(),
        })
    }
}

/// Lossless widening of file data into the working scalar.
pub fn from_f64<T: Scalar>(v: Real) -> T {
    nalgebra::convert(v)
}

/// Narrowing back to `f64` for printing and export.
pub fn to_f64<T: Scalar>(v: T) -> Real {
    nalgebra::try_convert(v).unwrap_or(Real::NAN)
}
