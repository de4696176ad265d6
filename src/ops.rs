//! Elementwise and aggregate operations on matrices of any rank.
//!
//! Binary operations require equal shapes and defensively copy the
//! right-hand side when it shares storage with the receiver, so assigning a
//! matrix from one of its own views behaves as if the view had been
//! materialized first.

use crate::matrix::{decrement, increment, Matrix};
use crate::scalar::{Real, Scalar};
use crate::{MatrixError, Result};

pub(crate) fn ensure_same_shape<const N: usize>(a: &[usize; N], b: &[usize; N]) -> Result<()> {
    if a != b {
        return Err(MatrixError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}

impl<T: Scalar, const N: usize> Matrix<T, N> {
    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.for_each_index(|m, idx| m.set(idx, value));
    }

    /// Replace every cell with `f(cell)`.
    pub fn apply(&mut self, f: impl Fn(T) -> T) {
        self.for_each_index(|m, idx| {
            let v = m.get(idx);
            m.set(idx, f(v));
        });
    }

    /// Copy every cell of `other` into `self`.
    ///
    /// Fails on shape mismatch. When `other` shares storage with `self` it
    /// is copied to an independent buffer first.
    pub fn assign(&mut self, other: &Self) -> Result<()> {
        ensure_same_shape(&self.size(), &other.size())?;
        if self.shares_storage(other) {
            let detached = other.duplicate();
            return self.assign(&detached);
        }
        self.for_each_index(|m, idx| m.set(idx, other.get(idx)));
        Ok(())
    }

    /// Replace every cell with `f(cell, other_cell)`.
    ///
    /// Same shape and aliasing rules as [`Matrix::assign`].
    pub fn zip_assign(&mut self, other: &Self, f: impl Fn(T, T) -> T) -> Result<()> {
        ensure_same_shape(&self.size(), &other.size())?;
        if self.shares_storage(other) {
            let detached = other.duplicate();
            return self.zip_assign(&detached, f);
        }
        self.for_each_index(|m, idx| {
            let v = m.get(idx);
            m.set(idx, f(v, other.get(idx)));
        });
        Ok(())
    }

    /// Number of cells that are exactly non-zero.
    ///
    /// The comparison is exact: tolerance policies apply to equality tests,
    /// not to sparsity counting.
    pub fn cardinality(&self) -> usize {
        let mut count = 0;
        self.for_each_index_ref(|m, idx| {
            if m.get(idx) != T::zero() {
                count += 1;
            }
        });
        count
    }

    /// The indexes and values of all exactly non-zero cells, in row-major
    /// order.
    pub fn non_zeros(&self) -> Vec<([usize; N], T)> {
        let mut out = Vec::new();
        self.for_each_index_ref(|m, idx| {
            let v = m.get(idx);
            if v != T::zero() {
                out.push((idx, v));
            }
        });
        out
    }

    /// The cells in row-major order as an owned `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        self.for_each_index_ref(|m, idx| out.push(m.get(idx)));
        out
    }

    fn for_each_index(&mut self, mut f: impl FnMut(&mut Self, [usize; N])) {
        if self.is_empty() {
            return;
        }
        let size = self.size();
        let mut idx = [0usize; N];
        loop {
            f(self, idx);
            if !increment(&mut idx, &size) {
                return;
            }
        }
    }

    fn for_each_index_ref(&self, mut f: impl FnMut(&Self, [usize; N])) {
        if self.is_empty() {
            return;
        }
        let size = self.size();
        let mut idx = [0usize; N];
        loop {
            f(self, idx);
            if !increment(&mut idx, &size) {
                return;
            }
        }
    }
}

impl<T: Real, const N: usize> Matrix<T, N> {
    /// Fold `transform(cell)` over all cells with `combine`, iterating
    /// right-to-left in row-major order; the last cell seeds the fold.
    ///
    /// Returns NaN for an empty matrix. The fold order is an implementation
    /// detail: callers needing a deterministic result must supply an
    /// associative and commutative `combine`.
    pub fn aggregate(&self, combine: impl Fn(T, T) -> T, transform: impl Fn(T) -> T) -> T {
        if self.is_empty() {
            return T::nan();
        }
        let size = self.size();
        let mut idx = size.map(|d| d - 1);
        let mut acc = transform(self.get(idx));
        while decrement(&mut idx, &size) {
            acc = combine(acc, transform(self.get(idx)));
        }
        acc
    }
}
