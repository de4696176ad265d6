//! LU decomposition with partial pivoting.
//!
//! For an `m x n` matrix `A` produces unit-lower-triangular `L`, upper
//! triangular `U` and a row permutation `piv` with `A[piv] = L·U`. Backs the
//! determinant and the square-matrix solve/inverse paths of the algebra
//! facade. The decomposition itself never fails on singular input; `solve`
//! does.

use crate::matrix::Matrix2;
use crate::scalar::Real;
use crate::{MatrixError, Result};

pub struct LuDecomposition<T: Real> {
    lu: Vec<T>,
    m: usize,
    n: usize,
    piv: Vec<usize>,
    pivsign: T,
}

impl<T: Real> LuDecomposition<T> {
    /// Decompose an `m x n` matrix.
    pub fn new(a: &Matrix2<T>) -> Self {
        let (m, n) = (a.rows(), a.columns());
        let mut lu = a.to_vec();
        let mut piv: Vec<usize> = (0..m).collect();
        let mut pivsign = T::one();
        let mut col = vec![T::zero(); m];

        for j in 0..n {
            for (i, c) in col.iter_mut().enumerate().take(m) {
                *c = lu[i * n + j];
            }

            // Dot-product update of column j.
            for i in 0..m {
                let kmax = i.min(j);
                let mut s = T::zero();
                for k in 0..kmax {
                    s += lu[i * n + k] * col[k];
                }
                col[i] -= s;
                lu[i * n + j] = col[i];
            }

            // Pivot on the largest remaining magnitude.
            let mut p = j;
            for i in (j + 1)..m {
                if col[i].abs() > col[p].abs() {
                    p = i;
                }
            }
            if p != j {
                for k in 0..n {
                    lu.swap(p * n + k, j * n + k);
                }
                piv.swap(p, j);
                pivsign = -pivsign;
            }

            if j < m && lu[j * n + j] != T::zero() {
                for i in (j + 1)..m {
                    let t = lu[i * n + j] / lu[j * n + j];
                    lu[i * n + j] = t;
                }
            }
        }

        LuDecomposition {
            lu,
            m,
            n,
            piv,
            pivsign,
        }
    }

    /// True iff `U` has no zero on its diagonal.
    pub fn is_nonsingular(&self) -> bool {
        (0..self.n).all(|j| self.lu[j * self.n + j] != T::zero())
    }

    /// The unit-lower-triangular factor `L` (`m x n`).
    pub fn l(&self) -> Matrix2<T> {
        Matrix2::from_fn([self.m, self.n], |[i, j]| {
            if i > j {
                self.lu[i * self.n + j]
            } else if i == j {
                T::one()
            } else {
                T::zero()
            }
        })
    }

    /// The upper-triangular factor `U` (`n x n`).
    pub fn u(&self) -> Matrix2<T> {
        Matrix2::from_fn([self.n, self.n], |[i, j]| {
            if i <= j {
                self.lu[i * self.n + j]
            } else {
                T::zero()
            }
        })
    }

    /// The row permutation applied by pivoting.
    pub fn pivot(&self) -> &[usize] {
        &self.piv
    }

    /// The determinant of the (square) source matrix.
    pub fn det(&self) -> Result<T> {
        if self.m != self.n {
            return Err(MatrixError::NonSquare {
                rows: self.m,
                cols: self.n,
            });
        }
        let mut d = self.pivsign;
        for j in 0..self.n {
            d *= self.lu[j * self.n + j];
        }
        Ok(d)
    }

    /// Solve `A·X = B`.
    ///
    /// Fails on a row-count mismatch or a singular decomposition.
    pub fn solve(&self, b: &Matrix2<T>) -> Result<Matrix2<T>> {
        if b.rows() != self.m {
            return Err(MatrixError::ShapeMismatch(
                vec![self.m, self.n],
                b.size().to_vec(),
            ));
        }
        if !self.is_nonsingular() {
            return Err(MatrixError::Singular);
        }

        let n = self.n;
        let nx = b.columns();
        // B rows reordered by the pivot.
        let mut x = vec![T::zero(); n * nx];
        for (i, &p) in self.piv.iter().enumerate().take(n) {
            for j in 0..nx {
                x[i * nx + j] = b.get([p, j]);
            }
        }

        // L·Y = B[piv]
        for k in 0..n {
            for i in (k + 1)..n {
                for j in 0..nx {
                    let t = x[k * nx + j] * self.lu[i * n + k];
                    x[i * nx + j] -= t;
                }
            }
        }
        // U·X = Y
        for k in (0..n).rev() {
            for j in 0..nx {
                x[k * nx + j] /= self.lu[k * n + k];
            }
            for i in 0..k {
                for j in 0..nx {
                    let t = x[k * nx + j] * self.lu[i * n + k];
                    x[i * nx + j] -= t;
                }
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
    fn test_determinant() {
        let a = Matrix2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        assert_relative_eq!(LuDecomposition::new(&a).det().unwrap(), -2.0);

        let b = Matrix2::from_rows([[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]]);
        assert_relative_eq!(LuDecomposition::new(&b).det().unwrap(), 24.0);
    }

    #[test]
    fn test_reconstruction_with_pivot() {
        let a = Matrix2::from_rows([[0.0, 1.0, 2.0], [3.0, 4.0, 5.0], [6.0, 7.0, 9.0]]);
        let lu = LuDecomposition::new(&a);
        let l = lu.l();
        let u = lu.u();
        let mut prod = Matrix2::<f64>::zeros([3, 3]);
        crate::blas::gemm(1.0, &l, &u, 0.0, &mut prod).unwrap();
        let permuted = a.select([Some(lu.pivot()), None]).unwrap();
        assert!(Property::default().equals(&prod, &permuted));
    }

    #[test]
    fn test_singular_detection_and_solve_error() {
        let a = Matrix2::from_rows([[1.0, 2.0], [2.0, 4.0]]);
        let lu = LuDecomposition::new(&a);
        assert!(!lu.is_nonsingular());
        let b = Matrix2::<f64>::zeros([2, 1]);
        assert!(matches!(lu.solve(&b), Err(MatrixError::Singular)));
    }

    #[test]
    fn test_solve() {
        let a = Matrix2::from_rows([[2.0, 1.0, 1.0], [1.0, 3.0, 2.0], [1.0, 0.0, 0.0]]);
        let b = Matrix2::from_rows([[4.0], [5.0], [6.0]]);
        let lu = LuDecomposition::new(&a);
        let x = lu.solve(&b).unwrap();
        let mut ax = Matrix2::<f64>::zeros([3, 1]);
        crate::blas::gemm(1.0, &a, &x, 0.0, &mut ax).unwrap();
        for i in 0..3 {
            assert_relative_eq!(ax.get([i, 0]), b.get([i, 0]), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_det_requires_square() {
        let a = Matrix2::<f64>::zeros([3, 2]);
        assert!(LuDecomposition::new(&a).det().is_err());
    }
}
