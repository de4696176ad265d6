//! Tolerance policy and structural predicates.
//!
//! A [`Property`] carries the absolute tolerance used by equality tests and
//! every structural test. It is an immutable value: to compare under a
//! different tolerance, construct a new instance.

use crate::matrix::{Matrix, Matrix2};
use crate::scalar::Real;
use crate::DEFAULT_TOLERANCE;

/// Value-comparison policy with an absolute tolerance.
#[derive(Clone, Copy, Debug)]
pub struct Property<T: Real> {
    tolerance: T,
}

impl<T: Real> Default for Property<T> {
    fn default() -> Self {
        Property {
            tolerance: T::of(DEFAULT_TOLERANCE),
        }
    }
}

impl<T: Real> Property<T> {
    /// A policy with the given absolute tolerance.
    pub fn new(tolerance: T) -> Self {
        Property {
            tolerance: tolerance.abs(),
        }
    }

    /// The absolute tolerance of this policy.
    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    /// True iff `|a - b| <= tolerance`.
    #[inline]
    pub fn equals_scalar(&self, a: T, b: T) -> bool {
        (a - b).abs() <= self.tolerance
    }

    /// True iff the shapes match and every pair of cells is within
    /// tolerance.
    pub fn equals<const N: usize>(&self, a: &Matrix<T, N>, b: &Matrix<T, N>) -> bool {
        if a.size() != b.size() {
            return false;
        }
        self.all_cells(a, |idx, v| self.equals_scalar(v, b.get(idx)))
    }

    /// True iff every cell equals `value` within tolerance.
    pub fn equals_value<const N: usize>(&self, a: &Matrix<T, N>, value: T) -> bool {
        self.all_cells(a, |_, v| self.equals_scalar(v, value))
    }

    /// True iff the matrix has as many rows as columns. Exact.
    pub fn is_square(&self, a: &Matrix2<T>) -> bool {
        a.rows() == a.columns()
    }

    /// True iff `A[i,j] ~ A[j,i]` for all cells. Requires a square matrix.
    pub fn is_symmetric(&self, a: &Matrix2<T>) -> bool {
        if !self.is_square(a) {
            return false;
        }
        for i in 0..a.rows() {
            for j in 0..i {
                if !self.equals_scalar(a.get([i, j]), a.get([j, i])) {
                    return false;
                }
            }
        }
        true
    }

    /// True iff every off-diagonal cell is zero within tolerance.
    pub fn is_diagonal(&self, a: &Matrix2<T>) -> bool {
        for i in 0..a.rows() {
            for j in 0..a.columns() {
                if i != j && !self.equals_scalar(a.get([i, j]), T::zero()) {
                    return false;
                }
            }
        }
        true
    }

    /// True iff the matrix is square with unit diagonal and zero elsewhere,
    /// within tolerance.
    pub fn is_identity(&self, a: &Matrix2<T>) -> bool {
        if !self.is_square(a) {
            return false;
        }
        for i in 0..a.rows() {
            for j in 0..a.columns() {
                let want = if i == j { T::one() } else { T::zero() };
                if !self.equals_scalar(a.get([i, j]), want) {
                    return false;
                }
            }
        }
        true
    }

    /// True iff every cell above the diagonal is zero within tolerance.
    pub fn is_lower_triangular(&self, a: &Matrix2<T>) -> bool {
        for i in 0..a.rows() {
            for j in (i + 1)..a.columns() {
                if !self.equals_scalar(a.get([i, j]), T::zero()) {
                    return false;
                }
            }
        }
        true
    }

    /// True iff every cell below the diagonal is zero within tolerance.
    pub fn is_upper_triangular(&self, a: &Matrix2<T>) -> bool {
        for i in 0..a.rows() {
            for j in 0..i.min(a.columns()) {
                if !self.equals_scalar(a.get([i, j]), T::zero()) {
                    return false;
                }
            }
        }
        true
    }

    /// True iff every cell is zero within tolerance.
    pub fn is_zero<const N: usize>(&self, a: &Matrix<T, N>) -> bool {
        self.equals_value(a, T::zero())
    }

    /// True iff the columns are orthonormal within tolerance
    /// (`Aᵗ·A ~ I`).
    pub fn is_orthogonal(&self, a: &Matrix2<T>) -> bool {
        let n = a.columns();
        for p in 0..n {
            for q in p..n {
                let mut dot = T::zero();
                for i in 0..a.rows() {
                    dot += a.get([i, p]) * a.get([i, q]);
                }
                let want = if p == q { T::one() } else { T::zero() };
                if !self.equals_scalar(dot, want) {
                    return false;
                }
            }
        }
        true
    }

    fn all_cells<const N: usize>(
        &self,
        a: &Matrix<T, N>,
        pred: impl Fn([usize; N], T) -> bool,
    ) -> bool {
        if a.is_empty() {
            return true;
        }
        let size = a.size();
        let mut idx = [0usize; N];
        loop {
            if !pred(idx, a.get(idx)) {
                return false;
            }
            if !crate::matrix::increment(&mut idx, &size) {
                return true;
            }
        }
    }
}
