//! Linear-algebra utilities composed from the decompositions and the BLAS
//! primitives.
//!
//! [`Algebra`] is stateless apart from its comparison policy and its
//! execution context: the policy feeds the structural fast paths (diagonal
//! inverse), the context lets the multiply-based operations (`mult`, `pow`)
//! dispatch in parallel.

use crate::decomp::{LuDecomposition, QrDecomposition, SvdDecomposition};
use crate::dispatch::ExecutionContext;
use crate::matrix::{Matrix2, Vector};
use crate::property::Property;
use crate::scalar::Real;
use crate::{blas, MatrixError, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct Algebra<T: Real> {
    property: Property<T>,
    ctx: ExecutionContext,
}

impl<T: Real> Algebra<T> {
    /// An algebra with the given comparison policy and execution context.
    pub fn new(property: Property<T>, ctx: ExecutionContext) -> Self {
        Algebra { property, ctx }
    }

    /// The comparison policy used by the structural fast paths.
    pub fn property(&self) -> &Property<T> {
        &self.property
    }

    // ------------------------------------------------------------------
    // Multiplication
    // ------------------------------------------------------------------

    /// `A·B` into a fresh matrix, parallel-dispatched when large.
    pub fn mult(&self, a: &Matrix2<T>, b: &Matrix2<T>) -> Result<Matrix2<T>> {
        let mut c = Matrix2::zeros([a.rows(), b.columns()]);
        self.ctx.gemm(T::one(), a, b, T::zero(), &mut c)?;
        Ok(c)
    }

    /// `A·x` into a fresh vector, parallel-dispatched when large.
    pub fn mult_vec(&self, a: &Matrix2<T>, x: &Vector<T>) -> Result<Vector<T>> {
        let mut y = Vector::zeros([a.rows()]);
        self.ctx.gemv(T::one(), a, x, T::zero(), &mut y)?;
        Ok(y)
    }

    // ------------------------------------------------------------------
    // Decomposition-backed queries
    // ------------------------------------------------------------------

    /// The determinant, via LU.
    pub fn det(&self, a: &Matrix2<T>) -> Result<T> {
        LuDecomposition::new(a).det()
    }

    /// True iff the determinant vanishes within tolerance.
    pub fn is_singular(&self, a: &Matrix2<T>) -> Result<bool> {
        Ok(self.property.equals_scalar(self.det(a)?, T::zero()))
    }

    /// Solve `A·X = B`: exactly via LU for square `A`, in the least-squares
    /// sense via QR otherwise.
    pub fn solve(&self, a: &Matrix2<T>, b: &Matrix2<T>) -> Result<Matrix2<T>> {
        if a.rows() == a.columns() {
            LuDecomposition::new(a).solve(b)
        } else {
            QrDecomposition::new(a)?.solve(b)
        }
    }

    /// The inverse (or pseudo-inverse for rectangular input).
    ///
    /// A square diagonal matrix inverts on the fast path by reciprocating
    /// its diagonal; anything else solves against the identity.
    pub fn inverse(&self, a: &Matrix2<T>) -> Result<Matrix2<T>> {
        if self.property.is_square(a) && self.property.is_diagonal(a) {
            let n = a.rows();
            let mut inv = Matrix2::zeros([n, n]);
            for i in 0..n {
                let d = a.get([i, i]);
                if d == T::zero() {
                    return Err(MatrixError::Singular);
                }
                inv.set([i, i], T::one() / d);
            }
            return Ok(inv);
        }
        self.solve(a, &Matrix2::identity(a.rows()))
    }

    /// The effective numerical rank, via SVD.
    pub fn rank(&self, a: &Matrix2<T>) -> usize {
        SvdDecomposition::new(a).rank()
    }

    /// The 2-norm condition number, via SVD.
    pub fn cond(&self, a: &Matrix2<T>) -> T {
        SvdDecomposition::new(a).cond()
    }

    // ------------------------------------------------------------------
    // Norms and trace
    // ------------------------------------------------------------------

    /// The maximum absolute column sum.
    pub fn norm1(&self, a: &Matrix2<T>) -> T {
        let mut max = T::zero();
        for j in 0..a.columns() {
            let mut sum = T::zero();
            for i in 0..a.rows() {
                sum += a.get([i, j]).abs();
            }
            max = max.max(sum);
        }
        max
    }

    /// The 2-norm: the largest singular value.
    pub fn norm2(&self, a: &Matrix2<T>) -> T {
        SvdDecomposition::new(a).norm2()
    }

    /// The Frobenius norm, accumulated overflow-safely; NaN for an empty
    /// matrix, like every aggregate.
    pub fn norm_f(&self, a: &Matrix2<T>) -> T {
        a.aggregate(|acc, x| acc.hypot(x), |x| x)
    }

    /// The maximum absolute row sum.
    pub fn norm_infinity(&self, a: &Matrix2<T>) -> T {
        let mut max = T::zero();
        for i in 0..a.rows() {
            let mut sum = T::zero();
            for j in 0..a.columns() {
                sum += a.get([i, j]).abs();
            }
            max = max.max(sum);
        }
        max
    }

    /// Sum of absolute values of a vector.
    pub fn vector_norm1(&self, x: &Vector<T>) -> T {
        blas::asum(x)
    }

    /// Euclidean norm of a vector.
    pub fn vector_norm2(&self, x: &Vector<T>) -> T {
        blas::nrm2(x)
    }

    /// Largest absolute value of a vector.
    pub fn vector_norm_infinity(&self, x: &Vector<T>) -> T {
        match blas::iamax(x) {
            Some(i) => x.get([i]).abs(),
            None => T::zero(),
        }
    }

    /// Sum of the diagonal.
    pub fn trace(&self, a: &Matrix2<T>) -> T {
        let mut sum = T::zero();
        for i in 0..a.rows().min(a.columns()) {
            sum += a.get([i, i]);
        }
        sum
    }

    // ------------------------------------------------------------------
    // Matrix power
    // ------------------------------------------------------------------

    /// `A^exp` by binary exponentiation; negative exponents go through the
    /// inverse, `A^0` is the identity.
    pub fn pow(&self, a: &Matrix2<T>, exp: i32) -> Result<Matrix2<T>> {
        if a.rows() != a.columns() {
            return Err(MatrixError::NonSquare {
                rows: a.rows(),
                cols: a.columns(),
            });
        }
        if exp == 0 {
            return Ok(Matrix2::identity(a.rows()));
        }
        let mut base = if exp < 0 {
            self.inverse(a)?
        } else {
            a.duplicate()
        };
        let mut k = exp.unsigned_abs();
        let mut result = Matrix2::identity(a.rows());
        loop {
            if k & 1 == 1 {
                result = self.mult(&result, &base)?;
            }
            k >>= 1;
            if k == 0 {
                break;
            }
            base = self.mult(&base, &base)?;
        }
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Permutation
    // ------------------------------------------------------------------

    /// The selection view `A[row_indexes, col_indexes]`; `None` keeps an
    /// axis as is. No elements are copied.
    pub fn permute(
        &self,
        a: &Matrix2<T>,
        row_indexes: Option<&[usize]>,
        col_indexes: Option<&[usize]>,
    ) -> Result<Matrix2<T>> {
        a.select([row_indexes, col_indexes])
    }

    /// Reorder rows in place so that new row `i` is old row `indexes[i]`.
    ///
    /// Narrow matrices follow the permutation cycles row by row; wide
    /// matrices go column by column through a scratch buffer instead, which
    /// touches each cell once.
    pub fn permute_rows(&self, a: &mut Matrix2<T>, indexes: &[usize]) -> Result<()> {
        validate_permutation(indexes, a.rows())?;
        if a.columns() < 10 {
            let columns = a.columns();
            permute_in_place(indexes, |r1, r2| {
                for j in 0..columns {
                    let t = a.get([r1, j]);
                    a.set([r1, j], a.get([r2, j]));
                    a.set([r2, j], t);
                }
            });
        } else {
            let mut scratch = vec![T::zero(); a.rows()];
            for j in 0..a.columns() {
                for (i, slot) in scratch.iter_mut().enumerate() {
                    *slot = a.get([indexes[i], j]);
                }
                for (i, &v) in scratch.iter().enumerate() {
                    a.set([i, j], v);
                }
            }
        }
        Ok(())
    }

    /// Reorder columns in place so that new column `j` is old column
    /// `indexes[j]`. Runs the row permutation through the transposed view.
    pub fn permute_columns(&self, a: &mut Matrix2<T>, indexes: &[usize]) -> Result<()> {
        let mut diced = a.t();
        self.permute_rows(&mut diced, indexes)
    }
}

/// Apply a permutation through an arbitrary swap callback, following each
/// cycle once: after the call, position `i` holds what position
/// `indexes[i]` held before.
pub fn permute_in_place(indexes: &[usize], mut swap: impl FnMut(usize, usize)) {
    let mut visited = vec![false; indexes.len()];
    for start in 0..indexes.len() {
        if visited[start] {
            continue;
        }
        let mut i = start;
        loop {
            visited[i] = true;
            let j = indexes[i];
            if j == start {
                break;
            }
            swap(i, j);
            i = j;
        }
    }
}

fn validate_permutation(indexes: &[usize], len: usize) -> Result<()> {
    if indexes.len() != len {
        return Err(MatrixError::ShapeMismatch(vec![indexes.len()], vec![len]));
    }
    let mut seen = vec![false; len];
    for &index in indexes {
        if index >= len || seen[index] {
            return Err(MatrixError::InvalidSelection {
                axis: 0,
                index,
                size: len,
            });
        }
        seen[index] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn algebra() -> Algebra<f64> {
        Algebra::default()
    }

    #[test]
    fn test_det_and_singularity() {
        let alg = algebra();
        let a = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        assert_relative_eq!(alg.det(&a).unwrap(), -2.0);
        assert!(!alg.is_singular(&a).unwrap());
        let s = Matrix2::from_rows([[1.0, 2.0], [2.0, 4.0]]);
        assert!(alg.is_singular(&s).unwrap());
    }

    #[test]
    fn test_inverse_diagonal_fast_path() {
        let alg = algebra();
        let a = Matrix2::from_rows([[2.0, 0.0], [0.0, 4.0]]);
        let inv = alg.inverse(&a).unwrap();
        assert_relative_eq!(inv.get([0, 0]), 0.5);
        assert_relative_eq!(inv.get([1, 1]), 0.25);
        assert_relative_eq!(inv.get([0, 1]), 0.0);

        let zero_diag = Matrix2::from_rows([[1.0, 0.0], [0.0, 0.0]]);
        assert!(matches!(
            alg.inverse(&zero_diag),
            Err(MatrixError::Singular)
        ));
    }

    #[test]
    fn test_inverse_general() {
        let alg = algebra();
        let a = Matrix2::from_rows([[4.0, 7.0], [2.0, 6.0]]);
        let inv = alg.inverse(&a).unwrap();
        let prod = alg.mult(&a, &inv).unwrap();
        assert!(alg.property().is_identity(&prod));
    }

    #[test]
    fn test_norms() {
        let alg = algebra();
        let a = Matrix2::from_rows([[1.0, -2.0], [-3.0, 4.0]]);
        assert_relative_eq!(alg.norm1(&a), 6.0);
        assert_relative_eq!(alg.norm_infinity(&a), 7.0);
        assert_relative_eq!(alg.norm_f(&a), 30.0f64.sqrt(), epsilon = 1e-12);
        assert!(alg.norm_f(&Matrix2::<f64>::zeros([0, 2])).is_nan());
    }

    #[test]
    fn test_rank_and_cond() {
        let alg = algebra();
        let full = Matrix2::from_rows([[3.0, 0.0], [0.0, 4.0]]);
        assert_eq!(alg.rank(&full), 2);
        assert_relative_eq!(alg.cond(&full), 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(alg.norm2(&full), 4.0, epsilon = 1e-12);

        let deficient = Matrix2::from_rows([[1.0, 2.0], [2.0, 4.0]]);
        assert_eq!(alg.rank(&deficient), 1);
    }

    #[test]
    fn test_trace() {
        let alg = algebra();
        let a = Matrix2::from_rows([[1.0, 9.0, 9.0], [9.0, 2.0, 9.0]]);
        assert_relative_eq!(alg.trace(&a), 3.0);
    }

    #[test]
    fn test_pow() {
        let alg = algebra();
        let a = Matrix2::from_rows([[1.0, 1.0], [0.0, 1.0]]);
        let a5 = alg.pow(&a, 5).unwrap();
        assert_relative_eq!(a5.get([0, 1]), 5.0);

        let a0 = alg.pow(&a, 0).unwrap();
        assert!(alg.property().is_identity(&a0));

        let am2 = alg.pow(&a, -2).unwrap();
        let a2 = alg.pow(&a, 2).unwrap();
        let prod = alg.mult(&a2, &am2).unwrap();
        assert!(alg.property().is_identity(&prod));
    }

    #[test]
    fn test_permute_rows_both_strategies() {
        let alg = algebra();
        // Narrow path (cycle-following).
        let mut narrow = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        alg.permute_rows(&mut narrow, &[2, 0, 1]).unwrap();
        assert_eq!(narrow.get([0, 0]), 5.0);
        assert_eq!(narrow.get([1, 0]), 1.0);
        assert_eq!(narrow.get([2, 0]), 3.0);

        // Wide path (scratch buffer).
        let mut wide = Matrix2::from_fn([3, 12], |[i, j]| (i * 12 + j) as f64);
        let expected = wide.select([Some(&[2, 0, 1]), None]).unwrap().duplicate();
        alg.permute_rows(&mut wide, &[2, 0, 1]).unwrap();
        assert!(alg.property().equals(&wide, &expected));
    }

    #[test]
    fn test_permute_columns_via_dice() {
        let alg = algebra();
        let mut a = Matrix2::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        alg.permute_columns(&mut a, &[1, 2, 0]).unwrap();
        assert_eq!(a.get([0, 0]), 2.0);
        assert_eq!(a.get([0, 1]), 3.0);
        assert_eq!(a.get([0, 2]), 1.0);
    }

    #[test]
    fn test_permute_validation() {
        let alg = algebra();
        let mut a = Matrix2::<f64>::zeros([3, 3]);
        assert!(alg.permute_rows(&mut a, &[0, 1]).is_err());
        assert!(alg.permute_rows(&mut a, &[0, 1, 3]).is_err());
        assert!(alg.permute_rows(&mut a, &[0, 1, 1]).is_err());
    }

    #[test]
    fn test_solve_rectangular_least_squares() {
        let alg = algebra();
        let a = Matrix2::from_rows([[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let b = Matrix2::from_rows([[1.0], [2.0], [3.0]]);
        let x = alg.solve(&a, &b).unwrap();
        assert_eq!(x.size(), [2, 1]);
        assert_relative_eq!(x.get([0, 0]), 1.0, epsilon = 1e-10);
        assert_relative_eq!(x.get([1, 0]), 2.0, epsilon = 1e-10);
    }
}
