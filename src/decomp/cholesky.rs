//! Cholesky decomposition of square matrices.
//!
//! For a symmetric positive-definite `A`, produces a lower-triangular `L`
//! with `A = L·Lᵗ`. Asymmetry or a non-positive pivot clears the
//! [`CholeskyDecomposition::is_spd`] flag but never aborts the sweep: the
//! flag, not an error, communicates failure.

use crate::matrix::Matrix2;
use crate::scalar::Real;
use crate::{MatrixError, Result};

pub struct CholeskyDecomposition<T: Real> {
    l: Vec<T>,
    n: usize,
    spd: bool,
}

impl<T: Real> CholeskyDecomposition<T> {
    /// Decompose a square matrix.
    ///
    /// Fails only on a non-square input; numerical problems are reported
    /// through [`CholeskyDecomposition::is_spd`].
    pub fn new(a: &Matrix2<T>) -> Result<Self> {
        let n = a.rows();
        if a.columns() != n {
            return Err(MatrixError::NonSquare {
                rows: a.rows(),
                cols: a.columns(),
            });
        }
        let mut l = vec![T::zero(); n * n];
        let mut spd = true;

        for j in 0..n {
            let mut d = T::zero();
            for k in 0..j {
                let mut s = T::zero();
                for i in 0..k {
                    s += l[k * n + i] * l[j * n + i];
                }
                // A zero pivot turns this into inf/NaN; the sweep still
                // finishes and the flag reports the failure.
                s = (a.get([j, k]) - s) / l[k * n + k];
                l[j * n + k] = s;
                d += s * s;
                spd = spd && a.get([k, j]) == a.get([j, k]);
            }
            d = a.get([j, j]) - d;
            spd = spd && d > T::zero();
            l[j * n + j] = d.max(T::zero()).sqrt();
        }

        Ok(CholeskyDecomposition { l, n, spd })
    }

    /// True iff the input was symmetric and all pivots were positive.
    pub fn is_spd(&self) -> bool {
        self.spd
    }

    /// The lower-triangular factor `L`.
    pub fn l(&self) -> Matrix2<T> {
        let n = self.n;
        Matrix2::from_fn([n, n], |[i, j]| {
            if j <= i {
                self.l[i * n + j]
            } else {
                T::zero()
            }
        })
    }

    /// Solve `A·X = B` by substitution through `L` and `Lᵗ`.
    ///
    /// Only the shape of `B` is validated. The result is meaningful only
    /// when [`CholeskyDecomposition::is_spd`] holds; on a degenerate
    /// decomposition the substitution divides by (near-)zero pivots and the
    /// caller gets the garbage it asked for.
    pub fn solve(&self, b: &Matrix2<T>) -> Result<Matrix2<T>> {
        let n = self.n;
        if b.rows() != n {
            return Err(MatrixError::ShapeMismatch(
                vec![n, n],
                b.size().to_vec(),
            ));
        }
        let nx = b.columns();
        let mut x = b.to_vec();

        // L·Y = B
        for k in 0..n {
            for j in 0..nx {
                for i in 0..k {
                    let t = x[i * nx + j] * self.l[k * n + i];
                    x[k * nx + j] -= t;
                }
                x[k * nx + j] /= self.l[k * n + k];
            }
        }
        // Lᵗ·X = Y
        for k in (0..n).rev() {
            for j in 0..nx {
                for i in (k + 1)..n {
                    let t = x[i * nx + j] * self.l[i * n + k];
                    x[k * nx + j] -= t;
                }
                x[k * nx + j] /= self.l[k * n + k];
            }
        }

        Matrix2::from_vec(x, [n, nx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;
    use approx::assert_relative_eq;

    #[test]
    fn test_classic_3x3_factor() {
        let a = Matrix2::from_rows([
            [4.0, 12.0, -16.0],
            [12.0, 37.0, -43.0],
            [-16.0, -43.0, 98.0],
        ]);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        assert!(ch.is_spd());
        let l = ch.l();
        let expected = [[2.0, 0.0, 0.0], [6.0, 1.0, 0.0], [-8.0, 5.0, 3.0]];
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(l.get([i, j]), expected[i][j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_reconstruction() {
        let a = Matrix2::from_rows([[25.0, 15.0, -5.0], [15.0, 18.0, 0.0], [-5.0, 0.0, 11.0]]);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        let l = ch.l();
        let mut llt = Matrix2::<f64>::zeros([3, 3]);
        crate::blas::gemm(1.0, &l, &l.t(), 0.0, &mut llt).unwrap();
        assert!(Property::default().equals(&llt, &a));
    }

    #[test]
    fn test_indefinite_clears_flag_without_error() {
        let a = Matrix2::from_rows([[1.0, 2.0], [2.0, 1.0]]);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        assert!(!ch.is_spd());
    }

    #[test]
    fn test_asymmetric_clears_flag() {
        let a = Matrix2::from_rows([[4.0, 1.0], [2.0, 3.0]]);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        assert!(!ch.is_spd());
    }

    #[test]
    fn test_non_square_is_an_error() {
        let a = Matrix2::<f64>::zeros([2, 3]);
        assert!(matches!(
            CholeskyDecomposition::new(&a),
            Err(MatrixError::NonSquare { .. })
        ));
    }

    #[test]
    fn test_solve() {
        let a = Matrix2::from_rows([
            [4.0, 12.0, -16.0],
            [12.0, 37.0, -43.0],
            [-16.0, -43.0, 98.0],
        ]);
        let b = Matrix2::from_rows([[1.0], [2.0], [3.0]]);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        let x = ch.solve(&b).unwrap();
        let mut ax = Matrix2::<f64>::zeros([3, 1]);
        crate::blas::gemm(1.0, &a, &x, 0.0, &mut ax).unwrap();
        for i in 0..3 {
            assert_relative_eq!(ax.get([i, 0]), b.get([i, 0]), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_solve_shape_check() {
        let a = Matrix2::<f64>::identity(3);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        let b = Matrix2::<f64>::zeros([2, 1]);
        assert!(ch.solve(&b).is_err());
    }
}
