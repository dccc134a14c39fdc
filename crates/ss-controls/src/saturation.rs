//! Input saturation (clamp-to-bound).

use crate::error::{ControlError, ControlResult};
use nalgebra::ComplexField;
use ss_core::{Scalar, Vector};

/// Lower/upper bounds applied to the controller input before it is used.
#[derive(Debug, Clone, PartialEq)]
pub enum Saturation<T: Scalar> {
    /// Same bounds for every input element.
    Uniform { min: T, max: T },
    /// One pair of bounds per input element.
    PerElement { min: Vector<T>, max: Vector<T> },
}

impl<T: Scalar> Saturation<T> {
    pub fn uniform(min: T, max: T) -> ControlResult<Self> {
        check_pair(min, max)?;
        Ok(Saturation::Uniform { min, max })
    }

    pub fn per_element(min: Vector<T>, max: Vector<T>) -> ControlResult<Self> {
        if min.len() != max.len() {
            return Err(ControlError::InvalidArg {
                what: "saturation min and max must have the same length",
            });
        }
        for (lo, hi) in min.iter().zip(max.iter()) {
            check_pair(*lo, *hi)?;
        }
        Ok(Saturation::PerElement { min, max })
    }

    /// Whether these bounds can be applied to an input of length `m`.
    pub fn fits(&self, m: usize) -> bool {
        match self {
            Saturation::Uniform { .. } => true,
            Saturation::PerElement { min, .. } => min.len() == m,
        }
    }

    /// Bounds for input element `i`.
    pub fn bounds(&self, i: usize) -> Option<(T, T)> {
        match self {
            Saturation::Uniform { min, max } => Some((*min, *max)),
            Saturation::PerElement { min, max } => Some((*min.get(i)?, *max.get(i)?)),
        }
    }

    /// Clamp `u` element-wise.
    ///
    /// Fails with `DimensionMismatch` when per-element bounds do not match
    /// the length of `u`.
    pub fn clamp(&self, u: &Vector<T>) -> ControlResult<Vector<T>> {
        if !self.fits(u.len()) {
            return Err(ControlError::dimension(format!(
                "input has {} elements, saturation bounds have {}",
                u.len(),
                self.len().unwrap_or(0)
            )));
        }
        let mut out = u.clone();
        for (i, v) in out.iter_mut().enumerate() {
            if let Some((lo, hi)) = self.bounds(i) {
                *v = clamp(*v, lo, hi);
            }
        }
        Ok(out)
    }

    /// Number of bound pairs, `None` for uniform bounds.
    fn len(&self) -> Option<usize> {
        match self {
            Saturation::Uniform { .. } => None,
            Saturation::PerElement { min, .. } => Some(min.len()),
        }
    }
}

fn check_pair<T: Scalar>(min: T, max: T) -> ControlResult<()> {
    if !ComplexField::is_finite(&min) || !ComplexField::is_finite(&max) {
        return Err(ControlError::InvalidArg {
            what: "saturation bounds must be finite",
        });
    }
    if min > max {
        return Err(ControlError::InvalidArg {
            what: "saturation min must not exceed max",
        });
    }
    Ok(())
}

fn clamp<T: Scalar>(v: T, lo: T, hi: T) -> T {
    if v > hi {
        hi
    } else if v < lo {
        lo
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_clamps_every_element() {
        let sat = Saturation::uniform(-1.0, 1.0).unwrap();
        let u = Vector::from_vec(vec![-5.0, 0.25, 3.0]);
        assert_eq!(sat.clamp(&u).unwrap(), Vector::from_vec(vec![-1.0, 0.25, 1.0]));
        assert!(sat.fits(7));
    }

    #[test]
    fn per_element_uses_own_bounds() {
        let sat = Saturation::per_element(
            Vector::from_vec(vec![0.0, -2.0]),
            Vector::from_vec(vec![1.0, 2.0]),
        )
        .unwrap();
        let u = Vector::from_vec(vec![1.5, -3.0]);
        assert_eq!(sat.clamp(&u).unwrap(), Vector::from_vec(vec![1.0, -2.0]));
        assert!(sat.fits(2));
        assert!(!sat.fits(3));
        assert_eq!(sat.bounds(1), Some((-2.0, 2.0)));
        assert_eq!(sat.bounds(2), None);
    }

    #[test]
    fn per_element_rejects_wrong_length() {
        let sat = Saturation::per_element(
            Vector::from_vec(vec![0.0, -2.0]),
            Vector::from_vec(vec![1.0, 2.0]),
        )
        .unwrap();
        let long = Vector::from_vec(vec![1.5, -3.0, 4.0]);
        assert!(matches!(
            sat.clamp(&long),
            Err(ControlError::DimensionMismatch { .. })
        ));
        let short = Vector::from_vec(vec![1.5]);
        assert!(sat.clamp(&short).is_err());
    }

    #[test]
    fn equal_bounds_pin_the_value() {
        let sat = Saturation::uniform(0.5, 0.5).unwrap();
        let u = Vector::from_vec(vec![-1.0, 2.0]);
        assert_eq!(sat.clamp(&u).unwrap(), Vector::from_vec(vec![0.5, 0.5]));
    }

    #[test]
    fn invalid_bounds_rejected() {
        assert!(Saturation::uniform(1.0, -1.0).is_err());
        assert!(Saturation::uniform(f64::NAN, 1.0).is_err());
        assert!(
            Saturation::per_element(Vector::from_vec(vec![0.0]), Vector::from_vec(vec![1.0, 2.0]))
                .is_err()
        );
        assert!(
            Saturation::per_element(
                Vector::from_vec(vec![0.0, 3.0]),
                Vector::from_vec(vec![1.0, 2.0])
            )
            .is_err()
        );
    }
}
