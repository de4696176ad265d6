//! The dense matrix container and its view algebra.
//!
//! [`Matrix<T, N>`] couples a shared storage handle with one [`AxisMap`] per
//! dimension. Concrete matrices and views are the same type; a view differs
//! only in its addressing parameters. Cloning a `Matrix` clones the handle,
//! not the elements — use [`Matrix::duplicate`] for an independent copy.

use crate::axis::AxisMap;
use crate::buffer::Buffer;
use crate::scalar::Scalar;
use crate::{MatrixError, Result};
use std::sync::Arc;

/// A dense 1-dimensional matrix (vector).
pub type Vector<T> = Matrix<T, 1>;
/// A dense 2-dimensional matrix, addressed as `[row, column]`.
pub type Matrix2<T> = Matrix<T, 2>;
/// A dense 3-dimensional matrix, addressed as `[slice, row, column]`.
pub type Matrix3<T> = Matrix<T, 3>;

/// A dense N-dimensional matrix over shared strided storage.
///
/// `Clone` is shallow: the clone addresses the same cells. Writing through
/// any handle is visible through every handle of the same storage.
#[derive(Clone)]
pub struct Matrix<T, const N: usize> {
    buf: Arc<Buffer<T>>,
    size: [usize; N],
    axes: [AxisMap; N],
}

fn contiguous_axes<const N: usize>(size: &[usize; N]) -> [AxisMap; N] {
    let mut strides = [1isize; N];
    let mut acc = 1isize;
    for d in (0..N).rev() {
        strides[d] = acc;
        acc *= size[d] as isize;
    }
    std::array::from_fn(|d| AxisMap::Strided {
        zero: 0,
        stride: strides[d],
    })
}

// ============================================================================
// Construction
// ============================================================================

impl<T: Scalar, const N: usize> Matrix<T, N> {
    /// A matrix of the given shape with every cell set to zero.
    pub fn zeros(size: [usize; N]) -> Self {
        Self::filled(size, T::zero())
    }

    /// A matrix of the given shape with every cell set to `value`.
    pub fn filled(size: [usize; N], value: T) -> Self {
        let len = size.iter().product();
        Matrix {
            buf: Arc::new(Buffer::filled(len, value)),
            axes: contiguous_axes(&size),
            size,
        }
    }

    /// A matrix of the given shape with cells computed from their index.
    pub fn from_fn(size: [usize; N], mut f: impl FnMut([usize; N]) -> T) -> Self {
        let mut m = Self::zeros(size);
        if m.len() == 0 {
            return m;
        }
        let mut idx = [0usize; N];
        loop {
            m.set(idx, f(idx));
            if !increment(&mut idx, &size) {
                return m;
            }
        }
    }

    /// A matrix of the given shape over `values` in row-major order.
    ///
    /// Fails with a shape mismatch when the element count disagrees.
    pub fn from_vec(values: Vec<T>, size: [usize; N]) -> Result<Self> {
        let len: usize = size.iter().product();
        if values.len() != len {
            return Err(MatrixError::ShapeMismatch(
                vec![values.len()],
                size.to_vec(),
            ));
        }
        Ok(Matrix {
            buf: Arc::new(Buffer::from_vec(values)),
            axes: contiguous_axes(&size),
            size,
        })
    }

    /// An independent deep copy with contiguous row-major storage.
    pub fn duplicate(&self) -> Self {
        Self::from_fn(self.size, |idx| self.get(idx))
    }
}

impl<T: Scalar> Matrix<T, 2> {
    /// A 2D matrix from row arrays.
    pub fn from_rows<const R: usize, const C: usize>(rows: [[T; C]; R]) -> Self {
        Self::from_fn([R, C], |[i, j]| rows[i][j])
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn([n, n], |[i, j]| if i == j { T::one() } else { T::zero() })
    }
}

// ============================================================================
// Shape and element access
// ============================================================================

impl<T: Scalar, const N: usize> Matrix<T, N> {
    /// The logical extent of each dimension.
    #[inline]
    pub fn size(&self) -> [usize; N] {
        self.size
    }

    /// The total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.size.iter().product()
    }

    /// True when any dimension has extent zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.contains(&0)
    }

    #[inline]
    fn offset_of(&self, idx: [usize; N]) -> usize {
        let mut off = 0isize;
        for d in 0..N {
            off += self.axes[d].offset(idx[d]);
        }
        debug_assert!(off >= 0 && (off as usize) < self.buf.len());
        off as usize
    }

    /// The cell at `idx`.
    ///
    /// # Panics
    /// Panics when any coordinate is out of bounds for this view.
    #[inline]
    pub fn get(&self, idx: [usize; N]) -> T {
        for d in 0..N {
            assert!(idx[d] < self.size[d], "index out of bounds");
        }
        // SAFETY: in-bounds by the axis invariant; concurrent writers only
        // ever touch disjoint cells (dispatcher contract).
        unsafe { self.buf.read(self.offset_of(idx)) }
    }

    /// Store `value` at `idx`.
    ///
    /// # Panics
    /// Panics when any coordinate is out of bounds for this view.
    #[inline]
    pub fn set(&mut self, idx: [usize; N], value: T) {
        for d in 0..N {
            assert!(idx[d] < self.size[d], "index out of bounds");
        }
        // SAFETY: as in `get`; `&mut self` serializes writers per handle and
        // the dispatcher keeps concurrent handles on disjoint cells.
        unsafe { self.buf.write(self.offset_of(idx), value) }
    }

    /// True iff `other` addresses the same underlying storage.
    ///
    /// Assignments use this to decide whether a defensive copy is needed.
    pub fn shares_storage<const M: usize>(&self, other: &Matrix<T, M>) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }
}

// ============================================================================
// View composition
// ============================================================================

impl<T: Scalar, const N: usize> Matrix<T, N> {
    fn with_axes(&self, size: [usize; N], axes: [AxisMap; N]) -> Self {
        Matrix {
            buf: Arc::clone(&self.buf),
            size,
            axes,
        }
    }

    /// A view iterating `axis` in reverse order.
    pub fn flip(&self, axis: usize) -> Result<Self> {
        if axis >= N {
            return Err(MatrixError::InvalidAxis { axis, rank: N });
        }
        let mut axes = self.axes.clone();
        axes[axis] = axes[axis].flipped(self.size[axis]);
        Ok(self.with_axes(self.size, axes))
    }

    /// A sub-range view covering `start[d]..start[d] + extent[d]` per axis.
    pub fn part(&self, start: [usize; N], extent: [usize; N]) -> Result<Self> {
        for d in 0..N {
            if start[d] + extent[d] > self.size[d] {
                return Err(MatrixError::RangeOutOfBounds {
                    axis: d,
                    start: start[d],
                    len: extent[d],
                    size: self.size[d],
                });
            }
        }
        let axes = std::array::from_fn(|d| self.axes[d].narrowed(start[d], extent[d]));
        Ok(self.with_axes(extent, axes))
    }

    /// A view keeping every `steps[d]`-th cell per axis.
    ///
    /// Each step must be positive; the new extent is `ceil(size / step)`.
    pub fn step_by(&self, steps: [usize; N]) -> Result<Self> {
        for (axis, &step) in steps.iter().enumerate() {
            if step == 0 {
                return Err(MatrixError::InvalidStep { axis, step });
            }
        }
        let size = std::array::from_fn(|d| self.size[d].div_ceil(steps[d]));
        let axes = std::array::from_fn(|d| self.axes[d].stepped(steps[d]));
        Ok(self.with_axes(size, axes))
    }

    /// A view with axes rearranged by `perm` (`perm[d]` is the source axis
    /// for new axis `d`).
    ///
    /// # Panics
    /// Panics when `perm` is not a permutation of `0..N`.
    pub fn permute(&self, perm: [usize; N]) -> Self {
        let mut seen = [false; N];
        for &p in &perm {
            assert!(p < N && !seen[p], "invalid permutation");
            seen[p] = true;
        }
        let size = std::array::from_fn(|d| self.size[perm[d]]);
        let axes = std::array::from_fn(|d| self.axes[perm[d]].clone());
        self.with_axes(size, axes)
    }

    /// A selection view: per axis, either an explicit index list (arbitrary
    /// order, repeats allowed) or `None` for "all indexes".
    ///
    /// An empty list yields a zero-size view along that axis.
    pub fn select(&self, picks: [Option<&[usize]>; N]) -> Result<Self> {
        for (axis, pick) in picks.iter().enumerate() {
            if let Some(indexes) = pick {
                for &index in *indexes {
                    if index >= self.size[axis] {
                        return Err(MatrixError::InvalidSelection {
                            axis,
                            index,
                            size: self.size[axis],
                        });
                    }
                }
            }
        }
        let size = std::array::from_fn(|d| match picks[d] {
            Some(indexes) => indexes.len(),
            None => self.size[d],
        });
        let axes = std::array::from_fn(|d| match picks[d] {
            Some(indexes) => self.axes[d].picked(indexes),
            None => self.axes[d].clone(),
        });
        Ok(self.with_axes(size, axes))
    }
}

// ============================================================================
// Dimension-specific views
// ============================================================================

impl<T: Scalar> Matrix<T, 2> {
    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.size[0]
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.size[1]
    }

    /// The transposed view: swapped extents and addressing, same storage.
    pub fn t(&self) -> Self {
        self.permute([1, 0])
    }

    /// The 1D view of row `i`.
    pub fn row(&self, i: usize) -> Result<Vector<T>> {
        if i >= self.size[0] {
            return Err(MatrixError::RangeOutOfBounds {
                axis: 0,
                start: i,
                len: 1,
                size: self.size[0],
            });
        }
        Ok(Matrix {
            buf: Arc::clone(&self.buf),
            size: [self.size[1]],
            axes: [self.axes[1].shifted(self.axes[0].offset(i))],
        })
    }

    /// The 1D view of column `j`.
    pub fn column(&self, j: usize) -> Result<Vector<T>> {
        if j >= self.size[1] {
            return Err(MatrixError::RangeOutOfBounds {
                axis: 1,
                start: j,
                len: 1,
                size: self.size[1],
            });
        }
        Ok(Matrix {
            buf: Arc::clone(&self.buf),
            size: [self.size[0]],
            axes: [self.axes[0].shifted(self.axes[1].offset(j))],
        })
    }
}

impl<T: Scalar> Matrix<T, 3> {
    /// Number of slices.
    #[inline]
    pub fn slices(&self) -> usize {
        self.size[0]
    }

    /// Number of rows per slice.
    #[inline]
    pub fn rows(&self) -> usize {
        self.size[1]
    }

    /// Number of columns per row.
    #[inline]
    pub fn columns(&self) -> usize {
        self.size[2]
    }

    /// The 2D view of slice `k`.
    pub fn slice_at(&self, k: usize) -> Result<Matrix2<T>> {
        if k >= self.size[0] {
            return Err(MatrixError::RangeOutOfBounds {
                axis: 0,
                start: k,
                len: 1,
                size: self.size[0],
            });
        }
        let base = self.axes[0].offset(k);
        Ok(Matrix {
            buf: Arc::clone(&self.buf),
            size: [self.size[1], self.size[2]],
            axes: [self.axes[1].shifted(base), self.axes[2].clone()],
        })
    }
}

/// Advance a row-major index tuple; false once exhausted.
pub(crate) fn increment<const N: usize>(idx: &mut [usize; N], size: &[usize; N]) -> bool {
    for d in (0..N).rev() {
        idx[d] += 1;
        if idx[d] < size[d] {
            return true;
        }
        idx[d] = 0;
    }
    false
}

/// Step a row-major index tuple backwards; false once exhausted.
pub(crate) fn decrement<const N: usize>(idx: &mut [usize; N], size: &[usize; N]) -> bool {
    for d in (0..N).rev() {
        if idx[d] > 0 {
            idx[d] -= 1;
            return true;
        }
        idx[d] = size[d] - 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let m = Matrix2::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(m.size(), [2, 3]);
        assert_eq!(m.get([0, 0]), 1.0);
        assert_eq!(m.get([1, 2]), 6.0);
    }

    #[test]
    fn test_transpose_is_zero_copy() {
        let mut m = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let t = m.t();
        assert_eq!(t.get([0, 1]), 3.0);
        assert!(t.shares_storage(&m));
        m.set([1, 0], 9.0);
        assert_eq!(t.get([0, 1]), 9.0);
    }

    #[test]
    fn test_part_range_check() {
        let m = Matrix2::<f64>::zeros([4, 4]);
        assert!(m.part([2, 2], [2, 2]).is_ok());
        assert!(matches!(
            m.part([2, 2], [3, 1]),
            Err(MatrixError::RangeOutOfBounds { axis: 0, .. })
        ));
    }

    #[test]
    fn test_flip_part_step_compose() {
        let v = Vector::from_fn([10], |[i]| i as f64);
        let w = v.flip(0).unwrap().part([2], [6]).unwrap().step_by([2]).unwrap();
        // flip: 9..0; part 2..8 of that: 7,6,5,4,3,2; step 2: 7,5,3
        assert_eq!(w.size(), [3]);
        assert_eq!(w.get([0]), 7.0);
        assert_eq!(w.get([1]), 5.0);
        assert_eq!(w.get([2]), 3.0);
    }

    #[test]
    fn test_step_rounds_up() {
        let v = Vector::from_fn([7], |[i]| i as f64);
        let w = v.step_by([3]).unwrap();
        assert_eq!(w.size(), [3]);
        assert_eq!(w.get([2]), 6.0);
    }

    #[test]
    fn test_select_arbitrary_and_identity() {
        let m = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let s = m.select([Some(&[2, 0, 2]), None]).unwrap();
        assert_eq!(s.size(), [3, 2]);
        assert_eq!(s.get([0, 1]), 6.0);
        assert_eq!(s.get([1, 0]), 1.0);
        assert_eq!(s.get([2, 1]), 6.0);

        let id = m.select([None, None]).unwrap();
        assert_eq!(id.size(), m.size());
        assert_eq!(id.get([1, 1]), 4.0);
    }

    #[test]
    fn test_select_empty_and_out_of_range() {
        let m = Matrix2::<f64>::zeros([3, 3]);
        let empty = m.select([Some(&[]), None]).unwrap();
        assert_eq!(empty.size(), [0, 3]);
        assert!(empty.is_empty());
        assert!(matches!(
            m.select([None, Some(&[3])]),
            Err(MatrixError::InvalidSelection { axis: 1, .. })
        ));
    }

    #[test]
    fn test_row_column_views_write_through() {
        let mut m = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let mut r = m.row(1).unwrap();
        r.set([0], 30.0);
        assert_eq!(m.get([1, 0]), 30.0);
        let c = m.column(1).unwrap();
        assert_eq!(c.get([0]), 2.0);
        assert_eq!(c.get([1]), 4.0);
    }

    #[test]
    fn test_slice_view_3d() {
        let m = Matrix3::from_fn([2, 3, 4], |[s, r, c]| (s * 12 + r * 4 + c) as f64);
        let s1 = m.slice_at(1).unwrap();
        assert_eq!(s1.size(), [3, 4]);
        assert_eq!(s1.get([2, 3]), 23.0);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut m = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let d = m.duplicate();
        assert!(!d.shares_storage(&m));
        m.set([0, 0], 99.0);
        assert_eq!(d.get([0, 0]), 1.0);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_get_out_of_bounds_panics() {
        let m = Matrix2::<f64>::zeros([2, 2]);
        m.get([2, 0]);
    }

    #[test]
    fn test_view_of_view_bounds_are_local() {
        let m = Matrix2::from_fn([6, 6], |[i, j]| (i * 6 + j) as f64);
        let p = m.part([2, 2], [2, 2]).unwrap();
        assert_eq!(p.get([0, 0]), 14.0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| p.get([2, 0])));
        assert!(result.is_err());
    }
}
