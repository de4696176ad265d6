//! QR decomposition via Householder reflections.
//!
//! For an `m x n` matrix with `m >= n`, produces orthonormal-column `Q` and
//! upper-triangular `R` with `A = Q·R`. The reflections are stored compactly
//! in the working matrix and `Q`, `R`, `H` are derived on demand. Column
//! norms accumulate through `hypot`, so intermediate squares cannot
//! overflow.

use crate::matrix::Matrix2;
use crate::scalar::Real;
use crate::{MatrixError, Result};

pub struct QrDecomposition<T: Real> {
    /// Upper triangle: R above its diagonal. At and below the diagonal:
    /// the Householder vectors. A zero diagonal entry marks a column that
    /// needed no reflection.
    qr: Vec<T>,
    rdiag: Vec<T>,
    m: usize,
    n: usize,
}

impl<T: Real> QrDecomposition<T> {
    /// Decompose an `m x n` matrix with `m >= n`.
    pub fn new(a: &Matrix2<T>) -> Result<Self> {
        let (m, n) = (a.rows(), a.columns());
        if m < n {
            return Err(MatrixError::RowsLessThanColumns { rows: m, cols: n });
        }
        let mut qr = a.to_vec();
        let mut rdiag = vec![T::zero(); n];

        for k in 0..n {
            let mut nrm = T::zero();
            for i in k..m {
                nrm = nrm.hypot(qr[i * n + k]);
            }
            if nrm == T::zero() {
                continue;
            }

            // A column that is already upper triangular with a positive
            // pivot needs no reflection; leave it in place so Q picks up an
            // identity block there.
            let tail_zero = ((k + 1)..m).all(|i| qr[i * n + k] == T::zero());
            if tail_zero && qr[k * n + k] > T::zero() {
                rdiag[k] = qr[k * n + k];
                qr[k * n + k] = T::zero();
                continue;
            }

            if qr[k * n + k] < T::zero() {
                nrm = -nrm;
            }
            for i in k..m {
                qr[i * n + k] /= nrm;
            }
            qr[k * n + k] += T::one();

            for j in (k + 1)..n {
                let mut s = T::zero();
                for i in k..m {
                    s += qr[i * n + k] * qr[i * n + j];
                }
                s = -s / qr[k * n + k];
                for i in k..m {
                    let t = s * qr[i * n + k];
                    qr[i * n + j] += t;
                }
            }
            rdiag[k] = -nrm;
        }

        Ok(QrDecomposition { qr, rdiag, m, n })
    }

    /// True iff `R` has no zero on its diagonal.
    pub fn has_full_rank(&self) -> bool {
        self.rdiag.iter().all(|&d| d != T::zero())
    }

    /// The Householder vectors, one per column, as a lower trapezoid.
    pub fn h(&self) -> Matrix2<T> {
        Matrix2::from_fn([self.m, self.n], |[i, j]| {
            if i >= j {
                self.qr[i * self.n + j]
            } else {
                T::zero()
            }
        })
    }

    /// The upper-triangular factor `R` (`n x n`).
    pub fn r(&self) -> Matrix2<T> {
        Matrix2::from_fn([self.n, self.n], |[i, j]| {
            if i < j {
                self.qr[i * self.n + j]
            } else if i == j {
                self.rdiag[i]
            } else {
                T::zero()
            }
        })
    }

    /// The orthonormal-column factor `Q` (`m x n`), accumulated by applying
    /// the stored reflections to the identity in reverse order.
    pub fn q(&self) -> Matrix2<T> {
        let (m, n) = (self.m, self.n);
        let mut q = vec![T::zero(); m * n];
        for k in (0..n).rev() {
            q[k * n + k] = T::one();
            for j in k..n {
                if self.qr[k * n + k] != T::zero() {
                    let mut s = T::zero();
                    for i in k..m {
                        s += self.qr[i * n + k] * q[i * n + j];
                    }
                    s = -s / self.qr[k * n + k];
                    for i in k..m {
                        let t = s * self.qr[i * n + k];
                        q[i * n + j] += t;
                    }
                }
            }
        }
        Matrix2::from_vec(q, [m, n]).expect("q buffer matches shape")
    }

    /// Solve the least-squares system `A·X = B` via `Qᵗ·B` and back
    /// substitution through `R`.
    ///
    /// Fails with a shape mismatch when `B` has the wrong row count, and
    /// with a rank error when the decomposition is rank deficient.
    pub fn solve(&self, b: &Matrix2<T>) -> Result<Matrix2<T>> {
        let (m, n) = (self.m, self.n);
        if b.rows() != m {
            return Err(MatrixError::ShapeMismatch(
                vec![m, n],
                b.size().to_vec(),
            ));
        }
        if !self.has_full_rank() {
            return Err(MatrixError::RankDeficient);
        }

        let nx = b.columns();
        let mut x = b.to_vec();

        // Y = Qᵗ·B, applied reflection by reflection.
        for k in 0..n {
            if self.qr[k * n + k] == T::zero() {
                continue;
            }
            for j in 0..nx {
                let mut s = T::zero();
                for i in k..m {
                    s += self.qr[i * n + k] * x[i * nx + j];
                }
                s = -s / self.qr[k * n + k];
                for i in k..m {
                    let t = s * self.qr[i * n + k];
                    x[i * nx + j] += t;
                }
            }
        }
        // R·X = Y
        for k in (0..n).rev() {
            for j in 0..nx {
                x[k * nx + j] /= self.rdiag[k];
            }
            for i in 0..k {
                for j in 0..nx {
                    let t = x[k * nx + j] * self.qr[i * n + k];
                    x[i * nx + j] -= t;
                }
            }
        }

        let solution = Matrix2::from_vec(x, [m, nx])?;
        solution.part([0, 0], [n, nx])
    }
}
