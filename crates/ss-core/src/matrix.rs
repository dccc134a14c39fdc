//! Dense matrix container with dimension-checked arithmetic.
//!
//! `Matrix<T>` owns its buffer (an `nalgebra::DMatrix`). Every operation that
//! needs conformant shapes returns a [`CoreResult`] instead of panicking, so the
//! controller can reject bad models at the point of mutation. Scalar operations
//! always succeed and are exposed as operators.

use crate::error::{CoreError, CoreResult};
use crate::numeric::{Scalar, ensure_finite, to_f64};
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// Column vector used for states, inputs and outputs.
pub type Vector<T> = DVector<T>;

/// Matrix dimensions as (rows, cols).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Owned dense matrix over a generic scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T: Scalar> {
    inner: DMatrix<T>,
}

impl<T: Scalar> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            inner: DMatrix::zeros(rows, cols),
        }
    }

    pub fn from_element(rows: usize, cols: usize, value: T) -> Self {
        Self {
            inner: DMatrix::from_element(rows, cols, value),
        }
    }

    pub fn identity(n: usize) -> Self {
        Self {
            inner: DMatrix::identity(n, n),
        }
    }

    /// Build from row-major data. `data.len()` must equal `rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[T]) -> CoreResult<Self> {
        if data.len() != rows * cols {
            return Err(CoreError::LengthMismatch {
                what: "row-major matrix data",
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Self {
            inner: DMatrix::from_row_slice(rows, cols, data),
        })
    }

    /// Build from a list of rows. All rows must have the same length.
    ///
    /// An empty list yields a 0x0 matrix.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> CoreResult<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            let len = row.as_ref().len();
            if len != ncols {
                return Err(CoreError::RaggedRows {
                    row: i,
                    expected: ncols,
                    found: len,
                });
            }
        }
        Ok(Self {
            inner: DMatrix::from_fn(nrows, ncols, |r, c| rows[r].as_ref()[c]),
        })
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.nrows(), self.ncols())
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.inner.get((row, col)).copied()
    }

    pub fn checked_add(&self, rhs: &Self) -> CoreResult<Self> {
        self.require_same_shape(rhs, "matrix addition")?;
        Ok(Self {
            inner: &self.inner + &rhs.inner,
        })
    }

    pub fn checked_sub(&self, rhs: &Self) -> CoreResult<Self> {
        self.require_same_shape(rhs, "matrix subtraction")?;
        Ok(Self {
            inner: &self.inner - &rhs.inner,
        })
    }

    /// Matrix product `self * rhs`. Requires `self.ncols() == rhs.nrows()`.
    pub fn checked_mul(&self, rhs: &Self) -> CoreResult<Self> {
        if self.ncols() != rhs.nrows() {
            return Err(CoreError::DimensionMismatch {
                what: "matrix product",
                expected: Shape::new(self.ncols(), rhs.ncols()),
                found: rhs.shape(),
            });
        }
        Ok(Self {
            inner: &self.inner * &rhs.inner,
        })
    }

    /// Matrix-vector product `self * v`. Requires `v.len() == self.ncols()`.
    pub fn mul_vector(&self, v: &Vector<T>) -> CoreResult<Vector<T>> {
        if v.len() != self.ncols() {
            return Err(CoreError::LengthMismatch {
                what: "matrix-vector product",
                expected: self.ncols(),
                found: v.len(),
            });
        }
        Ok(&self.inner * v)
    }

    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose(),
        }
    }

    /// Diagonal elements, `min(rows, cols)` of them.
    pub fn diagonal(&self) -> Vector<T> {
        let n = self.nrows().min(self.ncols());
        Vector::from_fn(n, |i, _| self.inner[(i, i)])
    }

    /// Copy out as nested rows.
    pub fn rows(&self) -> Vec<Vec<T>> {
        (0..self.nrows())
            .map(|r| (0..self.ncols()).map(|c| self.inner[(r, c)]).collect())
            .collect()
    }

    pub fn ensure_finite(&self, what: &'static str) -> CoreResult<()> {
        for v in self.inner.iter() {
            ensure_finite(*v, what)?;
        }
        Ok(())
    }

    /// Compact text form: values rounded up to two decimals, one row per line,
    /// terminated by a blank line.
    pub fn representation(&self) -> String {
        let mut out = String::new();
        for r in 0..self.nrows() {
            let row: Vec<String> = (0..self.ncols())
                .map(|c| {
                    let v = to_f64(self.inner[(r, c)]);
                    format!("{}", (v * 100.0).ceil() / 100.0)
                })
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out.push('\n');
        out
    }

    fn require_same_shape(&self, rhs: &Self, what: &'static str) -> CoreResult<()> {
        if self.shape() != rhs.shape() {
            return Err(CoreError::DimensionMismatch {
                what,
                expected: self.shape(),
                found: rhs.shape(),
            });
        }
        Ok(())
    }
}

impl<T: Scalar> From<DMatrix<T>> for Matrix<T> {
    fn from(inner: DMatrix<T>) -> Self {
        Self { inner }
    }
}

impl<T: Scalar> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &T {
        &self.inner[index]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut T {
        &mut self.inner[index]
    }
}

impl<T: Scalar> Add<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn add(self, rhs: T) -> Matrix<T> {
        Matrix {
            inner: self.inner.map(|v| v + rhs),
        }
    }
}

impl<T: Scalar> Sub<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn sub(self, rhs: T) -> Matrix<T> {
        Matrix {
            inner: self.inner.map(|v| v - rhs),
        }
    }
}

impl<T: Scalar> Mul<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn mul(self, rhs: T) -> Matrix<T> {
        Matrix {
            inner: self.inner.map(|v| v * rhs),
        }
    }
}

impl<T: Scalar> Div<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn div(self, rhs: T) -> Matrix<T> {
        Matrix {
            inner: self.inner.map(|v| v / rhs),
        }
    }
}

impl<T: Scalar> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.nrows() {
            for c in 0..self.ncols() {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.inner[(r, c)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn vector_add<T: Scalar>(a: &Vector<T>, b: &Vector<T>) -> CoreResult<Vector<T>> {
    if a.len() != b.len() {
        return Err(CoreError::LengthMismatch {
            what: "vector addition",
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a + b)
}

pub fn vector_sub<T: Scalar>(a: &Vector<T>, b: &Vector<T>) -> CoreResult<Vector<T>> {
    if a.len() != b.len() {
        return Err(CoreError::LengthMismatch {
            what: "vector subtraction",
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a - b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m2x3() -> Matrix<f64> {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn from_rows_is_row_major() {
        let m = m2x3();
        assert_eq!(m.shape(), Shape::new(2, 3));
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            CoreError::RaggedRows {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn from_rows_empty_is_0x0() {
        let rows: Vec<Vec<f64>> = Vec::new();
        let m = Matrix::from_rows(&rows).unwrap();
        assert_eq!(m.shape(), Shape::new(0, 0));
    }

    #[test]
    fn from_row_slice_checks_length() {
        assert!(Matrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0]).is_err());
        let m = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m[(1, 0)], 3.0);
    }

    #[test]
    fn checked_add_requires_same_shape() {
        let a = m2x3();
        let b = Matrix::zeros(3, 2);
        let err = a.checked_add(&b).unwrap_err();
        assert!(matches!(err, CoreError::DimensionMismatch { .. }));
        let sum = a.checked_add(&a).unwrap();
        assert_eq!(sum[(1, 2)], 12.0);
        let diff = a.checked_sub(&a).unwrap();
        assert_eq!(diff, Matrix::zeros(2, 3));
    }

    #[test]
    fn checked_mul_conformance() {
        let a = m2x3();
        let b = a.transpose();
        let p = a.checked_mul(&b).unwrap();
        assert_eq!(p.shape(), Shape::new(2, 2));
        assert_eq!(p[(0, 0)], 14.0);
        assert_eq!(p[(1, 1)], 77.0);
        assert!(a.checked_mul(&a).is_err());
    }

    #[test]
    fn mul_vector_checks_length() {
        let a = m2x3();
        let v = Vector::from_vec(vec![1.0, 0.0, -1.0]);
        let y = a.mul_vector(&v).unwrap();
        assert_eq!(y, Vector::from_vec(vec![-2.0, -2.0]));
        assert!(a.mul_vector(&Vector::zeros(2)).is_err());
    }

    #[test]
    fn scalar_operators() {
        let a = m2x3();
        assert_eq!((&a * 2.0)[(1, 2)], 12.0);
        assert_eq!((&a + 1.0)[(0, 0)], 2.0);
        assert_eq!((&a - 1.0)[(0, 0)], 0.0);
        assert_eq!((&a / 2.0)[(1, 1)], 2.5);
    }

    #[test]
    fn diagonal_of_rectangular() {
        let d = m2x3().diagonal();
        assert_eq!(d, Vector::from_vec(vec![1.0, 5.0]));
        let tall = m2x3().transpose().diagonal();
        assert_eq!(tall, Vector::from_vec(vec![1.0, 5.0]));
        assert_eq!(Matrix::<f64>::zeros(0, 3).diagonal().len(), 0);
    }

    #[test]
    fn vector_helpers() {
        let a = Vector::from_vec(vec![1.0, 2.0]);
        let b = Vector::from_vec(vec![0.5, 0.5]);
        assert_eq!(vector_add(&a, &b).unwrap(), Vector::from_vec(vec![1.5, 2.5]));
        assert_eq!(vector_sub(&a, &b).unwrap(), Vector::from_vec(vec![0.5, 1.5]));
        assert!(vector_add(&a, &Vector::zeros(3)).is_err());
    }

    #[test]
    fn representation_rounds_up() {
        let m = Matrix::from_rows(&[vec![1.234, -0.001], vec![2.0, 0.5]]).unwrap();
        assert_eq!(m.representation(), "1.24 -0\n2 0.5\n\n");
    }

    #[test]
    fn ensure_finite_reports_nan() {
        let mut m = Matrix::<f64>::identity(2);
        assert!(m.ensure_finite("A").is_ok());
        m[(0, 1)] = f64::NAN;
        assert!(matches!(
            m.ensure_finite("A"),
            Err(CoreError::NonFinite { what: "A", .. })
        ));
    }

    #[test]
    fn rows_round_trip() {
        let m = m2x3();
        assert_eq!(Matrix::from_rows(&m.rows()).unwrap(), m);
    }
}
