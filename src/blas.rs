//! Sequential reference implementation of the BLAS-style primitives.
//!
//! Every function validates operand shapes before touching data; the
//! multiply primitives additionally reject a result operand that shares
//! storage with an input, since they read and write interleaved. The
//! parallel dispatcher ([`crate::ExecutionContext`]) partitions large
//! `gemm`/`gemv` calls into disjoint sub-views and runs these primitives on
//! each partition.

use crate::matrix::{Matrix2, Vector};
use crate::ops::ensure_same_shape;
use crate::scalar::Real;
use crate::{MatrixError, Result};

/// Dot product `sum(x[i] * y[i])`.
pub fn dot<T: Real>(x: &Vector<T>, y: &Vector<T>) -> Result<T> {
    ensure_same_shape(&x.size(), &y.size())?;
    let mut acc = T::zero();
    for i in 0..x.len() {
        acc += x.get([i]) * y.get([i]);
    }
    Ok(acc)
}

/// `y = alpha * x + y`.
pub fn axpy<T: Real>(alpha: T, x: &Vector<T>, y: &mut Vector<T>) -> Result<()> {
    y.zip_assign(x, |yi, xi| alpha * xi + yi)
}

/// `x = alpha * x`.
pub fn scal<T: Real>(alpha: T, x: &mut Vector<T>) {
    x.apply(|v| alpha * v);
}

/// Exchange the contents of `x` and `y`.
pub fn swap<T: Real>(x: &mut Vector<T>, y: &mut Vector<T>) -> Result<()> {
    ensure_same_shape(&x.size(), &y.size())?;
    if x.shares_storage(y) {
        let detached = y.duplicate();
        y.assign(x)?;
        return x.assign(&detached);
    }
    for i in 0..x.len() {
        let xi = x.get([i]);
        x.set([i], y.get([i]));
        y.set([i], xi);
    }
    Ok(())
}

/// Copy `x` into `y`.
pub fn copy<T: Real>(x: &Vector<T>, y: &mut Vector<T>) -> Result<()> {
    y.assign(x)
}

/// Sum of absolute values.
pub fn asum<T: Real>(x: &Vector<T>) -> T {
    let mut acc = T::zero();
    for i in 0..x.len() {
        acc += x.get([i]).abs();
    }
    acc
}

/// Euclidean norm, accumulated overflow-safely.
pub fn nrm2<T: Real>(x: &Vector<T>) -> T {
    let mut norm = T::zero();
    for i in 0..x.len() {
        norm = norm.hypot(x.get([i]));
    }
    norm
}

/// Index of the element with the largest absolute value; `None` when empty.
/// Ties resolve to the smallest index.
pub fn iamax<T: Real>(x: &Vector<T>) -> Option<usize> {
    if x.len() == 0 {
        return None;
    }
    let mut best = 0;
    let mut best_abs = x.get([0]).abs();
    for i in 1..x.len() {
        let a = x.get([i]).abs();
        if a > best_abs {
            best = i;
            best_abs = a;
        }
    }
    Some(best)
}

/// Apply a Givens rotation: `(x[i], y[i]) = (c*x[i] + s*y[i], c*y[i] - s*x[i])`.
pub fn rot<T: Real>(x: &mut Vector<T>, y: &mut Vector<T>, c: T, s: T) -> Result<()> {
    ensure_same_shape(&x.size(), &y.size())?;
    for i in 0..x.len() {
        let xi = x.get([i]);
        let yi = y.get([i]);
        x.set([i], c * xi + s * yi);
        y.set([i], c * yi - s * xi);
    }
    Ok(())
}

/// Construct a Givens rotation annihilating `b`: returns `(r, z, c, s)` with
/// `c*a + s*b = r` and `-s*a + c*b = 0`.
pub fn rotg<T: Real>(a: T, b: T) -> (T, T, T, T) {
    let roe = if a.abs() > b.abs() { a } else { b };
    let scale = a.abs() + b.abs();
    if scale == T::zero() {
        return (T::zero(), T::zero(), T::one(), T::zero());
    }
    let ra = a / scale;
    let rb = b / scale;
    let mut r = scale * (ra * ra + rb * rb).sqrt();
    if roe < T::zero() {
        r = -r;
    }
    let c = a / r;
    let s = b / r;
    let z = if a.abs() > b.abs() {
        s
    } else if c != T::zero() {
        T::one() / c
    } else {
        T::one()
    };
    (r, z, c, s)
}

/// Rank-1 update `A = A + alpha * x * yᵗ`.
pub fn ger<T: Real>(alpha: T, x: &Vector<T>, y: &Vector<T>, a: &mut Matrix2<T>) -> Result<()> {
    if a.rows() != x.len() || a.columns() != y.len() {
        return Err(MatrixError::ShapeMismatch(
            a.size().to_vec(),
            vec![x.len(), y.len()],
        ));
    }
    for i in 0..a.rows() {
        let axi = alpha * x.get([i]);
        for j in 0..a.columns() {
            let v = a.get([i, j]) + axi * y.get([j]);
            a.set([i, j], v);
        }
    }
    Ok(())
}

/// Matrix-vector multiply `y = alpha * A * x + beta * y`.
///
/// `y` must not share storage with `A` or `x`.
pub fn gemv<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    x: &Vector<T>,
    beta: T,
    y: &mut Vector<T>,
) -> Result<()> {
    if x.len() != a.columns() || y.len() != a.rows() {
        return Err(MatrixError::ShapeMismatch(
            a.size().to_vec(),
            vec![x.len(), y.len()],
        ));
    }
    if y.shares_storage(a) || y.shares_storage(x) {
        return Err(MatrixError::AliasedResult);
    }
    for i in 0..a.rows() {
        let mut acc = T::zero();
        for j in 0..a.columns() {
            acc += a.get([i, j]) * x.get([j]);
        }
        y.set([i], alpha * acc + beta * y.get([i]));
    }
    Ok(())
}

/// Matrix-matrix multiply `C = alpha * A * B + beta * C`.
///
/// `C` must not share storage with `A` or `B`.
pub fn gemm<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    b: &Matrix2<T>,
    beta: T,
    c: &mut Matrix2<T>,
) -> Result<()> {
    if a.columns() != b.rows() {
        return Err(MatrixError::ShapeMismatch(
            a.size().to_vec(),
            b.size().to_vec(),
        ));
    }
    if c.rows() != a.rows() || c.columns() != b.columns() {
        return Err(MatrixError::ShapeMismatch(
            c.size().to_vec(),
            vec![a.rows(), b.columns()],
        ));
    }
    if c.shares_storage(a) || c.shares_storage(b) {
        return Err(MatrixError::AliasedResult);
    }
    for i in 0..c.rows() {
        for j in 0..c.columns() {
            let mut acc = T::zero();
            for k in 0..a.columns() {
                acc += a.get([i, k]) * b.get([k, j]);
            }
            c.set([i, j], alpha * acc + beta * c.get([i, j]));
        }
    }
    Ok(())
}

/// Symmetric matrix-vector multiply `y = alpha * A * x + beta * y`, reading
/// only the upper triangle of `A`.
pub fn symv<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    x: &Vector<T>,
    beta: T,
    y: &mut Vector<T>,
) -> Result<()> {
    if a.rows() != a.columns() {
        return Err(MatrixError::NonSquare {
            rows: a.rows(),
            cols: a.columns(),
        });
    }
    if x.len() != a.columns() || y.len() != a.rows() {
        return Err(MatrixError::ShapeMismatch(
            a.size().to_vec(),
            vec![x.len(), y.len()],
        ));
    }
    if y.shares_storage(a) || y.shares_storage(x) {
        return Err(MatrixError::AliasedResult);
    }
    let n = a.rows();
    for i in 0..n {
        let mut acc = T::zero();
        for j in 0..n {
            let aij = if i <= j { a.get([i, j]) } else { a.get([j, i]) };
            acc += aij * x.get([j]);
        }
        y.set([i], alpha * acc + beta * y.get([i]));
    }
    Ok(())
}

/// Triangular matrix-vector multiply `x = A * x` for triangular `A`.
///
/// `upper` selects which triangle holds the data; `unit_diagonal` treats the
/// diagonal as ones without reading it.
pub fn trmv<T: Real>(
    upper: bool,
    unit_diagonal: bool,
    a: &Matrix2<T>,
    x: &mut Vector<T>,
) -> Result<()> {
    if a.rows() != a.columns() {
        return Err(MatrixError::NonSquare {
            rows: a.rows(),
            cols: a.columns(),
        });
    }
    if x.len() != a.columns() {
        return Err(MatrixError::ShapeMismatch(a.size().to_vec(), vec![x.len()]));
    }
    let n = a.rows();
    if upper {
        for i in 0..n {
            let mut acc = if unit_diagonal {
                x.get([i])
            } else {
                a.get([i, i]) * x.get([i])
            };
            for j in (i + 1)..n {
                acc += a.get([i, j]) * x.get([j]);
            }
            x.set([i], acc);
        }
    } else {
        for i in (0..n).rev() {
            let mut acc = if unit_diagonal {
                x.get([i])
            } else {
                a.get([i, i]) * x.get([i])
            };
            for j in 0..i {
                acc += a.get([i, j]) * x.get([j]);
            }
            x.set([i], acc);
        }
    }
    Ok(())
}
