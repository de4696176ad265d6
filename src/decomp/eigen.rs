//! Eigenvalue decomposition of square matrices.
//!
//! For a symmetric `A` (tested within tolerance), Householder
//! tridiagonalization followed by implicit-shift QL iteration yields real
//! eigenvalues, sorted ascending, with an orthogonal eigenvector matrix.
//! Otherwise the matrix is reduced to upper Hessenberg form and iterated to
//! real Schur form with the double-shift QR algorithm; complex-conjugate
//! eigenvalue pairs appear as 2x2 blocks in `D` and the eigenvectors are
//! recovered by back substitution, with a safe complex division for the
//! conjugate-pair rows.
//!
//! Convergence tests are bounded by machine epsilon. The deflation loops are
//! not capped by an iteration count.

use crate::matrix::{Matrix2, Vector};
use crate::property::Property;
use crate::scalar::Real;
use crate::{MatrixError, Result};
use num_complex::Complex;

pub struct EigenDecomposition<T: Real> {
    n: usize,
    symmetric: bool,
    /// Real parts of the eigenvalues.
    d: Vec<T>,
    /// Imaginary parts of the eigenvalues.
    e: Vec<T>,
    /// Eigenvectors, one per column.
    v: Vec<T>,
}

impl<T: Real> EigenDecomposition<T> {
    /// Decompose a square matrix, testing symmetry under the default
    /// tolerance.
    pub fn new(a: &Matrix2<T>) -> Result<Self> {
        Self::with_property(a, &Property::default())
    }

    /// Decompose a square matrix, testing symmetry under the given policy.
    pub fn with_property(a: &Matrix2<T>, property: &Property<T>) -> Result<Self> {
        let n = a.rows();
        if a.columns() != n {
            return Err(MatrixError::NonSquare {
                rows: a.rows(),
                cols: a.columns(),
            });
        }
        let symmetric = property.is_symmetric(a);
        let mut d = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];
        let mut v = vec![T::zero(); n * n];

        if n == 0 {
            return Ok(EigenDecomposition {
                n,
                symmetric,
                d,
                e,
                v,
            });
        }

        if symmetric {
            v.copy_from_slice(&a.to_vec());
            tred2(n, &mut v, &mut d, &mut e);
            tql2(n, &mut v, &mut d, &mut e);
        } else {
            let mut h = a.to_vec();
            let mut ort = vec![T::zero(); n];
            orthes(n, &mut h, &mut v, &mut ort);
            hqr2(n, &mut h, &mut v, &mut d, &mut e);
        }

        Ok(EigenDecomposition {
            n,
            symmetric,
            d,
            e,
            v,
        })
    }

    /// True iff the symmetric (tridiagonal + QL) path was taken.
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// The real parts of the eigenvalues.
    pub fn real_eigenvalues(&self) -> Vector<T> {
        Vector::from_vec(self.d.clone(), [self.n]).expect("eigenvalue buffer matches shape")
    }

    /// The imaginary parts of the eigenvalues.
    pub fn imag_eigenvalues(&self) -> Vector<T> {
        Vector::from_vec(self.e.clone(), [self.n]).expect("eigenvalue buffer matches shape")
    }

    /// The eigenvalues as complex numbers.
    pub fn complex_eigenvalues(&self) -> Vec<Complex<T>> {
        self.d
            .iter()
            .zip(self.e.iter())
            .map(|(&re, &im)| Complex::new(re, im))
            .collect()
    }

    /// The eigenvector matrix `V`, one eigenvector per column.
    pub fn v(&self) -> Matrix2<T> {
        Matrix2::from_vec(self.v.clone(), [self.n, self.n])
            .expect("eigenvector buffer matches shape")
    }

    /// The block-diagonal eigenvalue matrix `D`: real eigenvalues on the
    /// diagonal, complex-conjugate pairs as 2x2 blocks.
    pub fn d(&self) -> Matrix2<T> {
        let n = self.n;
        let mut out = Matrix2::zeros([n, n]);
        for i in 0..n {
            out.set([i, i], self.d[i]);
            if self.e[i] > T::zero() {
                out.set([i, i + 1], self.e[i]);
            } else if self.e[i] < T::zero() {
                out.set([i, i - 1], self.e[i]);
            }
        }
        out
    }
}

// ============================================================================
// Symmetric path
// ============================================================================

/// Householder reduction to symmetric tridiagonal form.
fn tred2<T: Real>(n: usize, v: &mut [T], d: &mut [T], e: &mut [T]) {
    for j in 0..n {
        d[j] = v[(n - 1) * n + j];
    }

    for i in (1..n).rev() {
        // Scale to avoid under/overflow.
        let mut scale = T::zero();
        let mut h = T::zero();
        for item in d.iter().take(i) {
            scale += item.abs();
        }
        if scale == T::zero() {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[(i - 1) * n + j];
                v[i * n + j] = T::zero();
                v[j * n + i] = T::zero();
            }
        } else {
            // Generate the Householder vector.
            for k in 0..i {
                d[k] /= scale;
                h += d[k] * d[k];
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > T::zero() {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            for item in e.iter_mut().take(i) {
                *item = T::zero();
            }

            // Apply the similarity transformation to the remaining columns.
            for j in 0..i {
                f = d[j];
                v[j * n + i] = f;
                g = e[j] + v[j * n + j] * f;
                for k in (j + 1)..i {
                    g += v[k * n + j] * d[k];
                    e[k] += v[k * n + j] * f;
                }
                e[j] = g;
            }
            f = T::zero();
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    let t = f * e[k] + g * d[k];
                    v[k * n + j] -= t;
                }
                d[j] = v[(i - 1) * n + j];
                v[i * n + j] = T::zero();
            }
        }
        d[i] = h;
    }

    // Accumulate transformations.
    for i in 0..(n - 1) {
        v[(n - 1) * n + i] = v[i * n + i];
        v[i * n + i] = T::one();
        let h = d[i + 1];
        if h != T::zero() {
            for k in 0..=i {
                d[k] = v[k * n + i + 1] / h;
            }
            for j in 0..=i {
                let mut g = T::zero();
                for k in 0..=i {
                    g += v[k * n + i + 1] * v[k * n + j];
                }
                for k in 0..=i {
                    let t = g * d[k];
                    v[k * n + j] -= t;
                }
            }
        }
        for k in 0..=i {
            v[k * n + i + 1] = T::zero();
        }
    }
    for j in 0..n {
        d[j] = v[(n - 1) * n + j];
        v[(n - 1) * n + j] = T::zero();
    }
    v[(n - 1) * n + (n - 1)] = T::one();
    e[0] = T::zero();
}

/// Implicit-shift QL iteration on the tridiagonal form, deflating one
/// eigenvalue at a time; finishes by sorting eigenvalues ascending and
/// permuting the eigenvector columns to match.
fn tql2<T: Real>(n: usize, v: &mut [T], d: &mut [T], e: &mut [T]) {
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = T::zero();

    let mut f = T::zero();
    let mut tst1 = T::zero();
    let eps = T::epsilon();
    for l in 0..n {
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }

        // An eigenvalue at m == l is already isolated; otherwise iterate
        // until the sub-diagonal entry at l is negligible.
        if m > l {
            loop {
                // Implicit shift.
                let mut g = d[l];
                let two = T::of(2.0);
                let mut p = (d[l + 1] - g) / (two * e[l]);
                let mut r = p.hypot(T::one());
                if p < T::zero() {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for item in d.iter_mut().take(n).skip(l + 2) {
                    *item -= h;
                }
                f += h;

                // Implicit QL sweep.
                p = d[m];
                let mut c = T::one();
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = T::zero();
                let mut s2 = T::zero();
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for k in 0..n {
                        h = v[k * n + i + 1];
                        v[k * n + i + 1] = s * v[k * n + i] + c * h;
                        v[k * n + i] = c * v[k * n + i] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = T::zero();
    }

    // Sort ascending, carrying the eigenvector columns along.
    for i in 0..(n - 1) {
        let mut k = i;
        let mut p = d[i];
        for j in (i + 1)..n {
            if d[j] < p {
                k = j;
                p = d[j];
            }
        }
        if k != i {
            d[k] = d[i];
            d[i] = p;
            for j in 0..n {
                v.swap(j * n + i, j * n + k);
            }
        }
    }
}

// ============================================================================
// General path
// ============================================================================

/// Householder reduction to upper Hessenberg form, accumulating the
/// orthogonal similarity transformation into `v`.
fn orthes<T: Real>(n: usize, h: &mut [T], v: &mut [T], ort: &mut [T]) {
    let low = 0;
    let high = n - 1;

    for m in (low + 1)..high {
        let mut scale = T::zero();
        for i in m..=high {
            scale += h[i * n + m - 1].abs();
        }
        if scale != T::zero() {
            // Householder vector for column m-1.
            let mut hsum = T::zero();
            for i in (m..=high).rev() {
                ort[i] = h[i * n + m - 1] / scale;
                hsum += ort[i] * ort[i];
            }
            let mut g = hsum.sqrt();
            if ort[m] > T::zero() {
                g = -g;
            }
            hsum -= ort[m] * g;
            ort[m] -= g;

            // Apply the similarity transformation H = (I - u*uᵗ/h) H (I - u*uᵗ/h).
            for j in m..n {
                let mut f = T::zero();
                for i in (m..=high).rev() {
                    f += ort[i] * h[i * n + j];
                }
                f /= hsum;
                for i in m..=high {
                    let t = f * ort[i];
                    h[i * n + j] -= t;
                }
            }
            for i in 0..=high {
                let mut f = T::zero();
                for j in (m..=high).rev() {
                    f += ort[j] * h[i * n + j];
                }
                f /= hsum;
                for j in m..=high {
                    let t = f * ort[j];
                    h[i * n + j] -= t;
                }
            }
            ort[m] *= scale;
            h[m * n + m - 1] = scale * g;
        }
    }

    // Accumulate transformations.
    for i in 0..n {
        for j in 0..n {
            v[i * n + j] = if i == j { T::one() } else { T::zero() };
        }
    }
    for m in ((low + 1)..high).rev() {
        if h[m * n + m - 1] != T::zero() {
            for i in (m + 1)..=high {
                ort[i] = h[i * n + m - 1];
            }
            for j in m..=high {
                let mut g = T::zero();
                for i in m..=high {
                    g += ort[i] * v[i * n + j];
                }
                // Double division avoids a possible underflow.
                g = (g / ort[m]) / h[m * n + m - 1];
                for i in m..=high {
                    let t = g * ort[i];
                    v[i * n + j] += t;
                }
            }
        }
    }
}

/// Safe complex division `(xr + i*xi) / (yr + i*yi)`.
fn cdiv<T: Real>(xr: T, xi: T, yr: T, yi: T) -> (T, T) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

/// Double-shift implicit QR iteration from Hessenberg to real Schur form,
/// followed by back substitution for the eigenvectors.
#[allow(unused_assignments, clippy::too_many_lines)]
fn hqr2<T: Real>(nn: usize, h: &mut [T], v: &mut [T], d: &mut [T], e: &mut [T]) {
    let low: isize = 0;
    let high: isize = nn as isize - 1;
    let eps = T::epsilon();
    let mut exshift = T::zero();
    let mut p = T::zero();
    let mut q = T::zero();
    let mut r = T::zero();
    let mut s = T::zero();
    let mut z = T::zero();
    let mut t = T::zero();
    let mut w = T::zero();
    let mut x = T::zero();
    let mut y = T::zero();

    // Matrix norm over the Hessenberg band.
    let mut norm = T::zero();
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm += h[i * nn + j].abs();
        }
    }

    let mut n: isize = nn as isize - 1;
    let mut iter = 0usize;
    while n >= low {
        let nu = n as usize;

        // Look for a single small sub-diagonal element.
        let mut l = nu;
        while l as isize > low {
            s = h[(l - 1) * nn + l - 1].abs() + h[l * nn + l].abs();
            if s == T::zero() {
                s = norm;
            }
            if h[l * nn + l - 1].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == nu {
            // One root found.
            h[nu * nn + nu] += exshift;
            d[nu] = h[nu * nn + nu];
            e[nu] = T::zero();
            n -= 1;
            iter = 0;
        } else if l == nu - 1 {
            // Two roots found.
            w = h[nu * nn + nu - 1] * h[(nu - 1) * nn + nu];
            p = (h[(nu - 1) * nn + nu - 1] - h[nu * nn + nu]) / T::of(2.0);
            q = p * p + w;
            z = q.abs().sqrt();
            h[nu * nn + nu] += exshift;
            h[(nu - 1) * nn + nu - 1] += exshift;
            x = h[nu * nn + nu];

            if q >= T::zero() {
                // Real pair.
                z = if p >= T::zero() { p + z } else { p - z };
                d[nu - 1] = x + z;
                d[nu] = d[nu - 1];
                if z != T::zero() {
                    d[nu] = x - w / z;
                }
                e[nu - 1] = T::zero();
                e[nu] = T::zero();
                x = h[nu * nn + nu - 1];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p /= r;
                q /= r;

                for j in (nu - 1)..nn {
                    z = h[(nu - 1) * nn + j];
                    h[(nu - 1) * nn + j] = q * z + p * h[nu * nn + j];
                    h[nu * nn + j] = q * h[nu * nn + j] - p * z;
                }
                for i in 0..=nu {
                    z = h[i * nn + nu - 1];
                    h[i * nn + nu - 1] = q * z + p * h[i * nn + nu];
                    h[i * nn + nu] = q * h[i * nn + nu] - p * z;
                }
                for i in low as usize..=high as usize {
                    z = v[i * nn + nu - 1];
                    v[i * nn + nu - 1] = q * z + p * v[i * nn + nu];
                    v[i * nn + nu] = q * v[i * nn + nu] - p * z;
                }
            } else {
                // Complex pair.
                d[nu - 1] = x + p;
                d[nu] = x + p;
                e[nu - 1] = z;
                e[nu] = -z;
            }
            n -= 2;
            iter = 0;
        } else {
            // No convergence yet; form a shift.
            x = h[nu * nn + nu];
            y = T::zero();
            w = T::zero();
            if l < nu {
                y = h[(nu - 1) * nn + nu - 1];
                w = h[nu * nn + nu - 1] * h[(nu - 1) * nn + nu];
            }

            // Wilkinson's original ad hoc shift.
            if iter == 10 {
                exshift += x;
                for i in low as usize..=nu {
                    h[i * nn + i] -= x;
                }
                s = h[nu * nn + nu - 1].abs() + h[(nu - 1) * nn + nu - 2].abs();
                x = T::of(0.75) * s;
                y = x;
                w = T::of(-0.4375) * s * s;
            }

            // MATLAB's new ad hoc shift.
            if iter == 30 {
                s = (y - x) / T::of(2.0);
                s = s * s + w;
                if s > T::zero() {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / T::of(2.0) + s);
                    for i in low as usize..=nu {
                        h[i * nn + i] -= s;
                    }
                    exshift += s;
                    x = T::of(0.964);
                    y = x;
                    w = x;
                }
            }

            iter += 1;

            // Look for two consecutive small sub-diagonal elements.
            let mut m = nu - 2;
            loop {
                z = h[m * nn + m];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[(m + 1) * nn + m] + h[m * nn + m + 1];
                q = h[(m + 1) * nn + m + 1] - z - r - s;
                r = h[(m + 2) * nn + m + 1];
                s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if m == l {
                    break;
                }
                if h[m * nn + m - 1].abs() * (q.abs() + r.abs())
                    < eps
                        * (p.abs()
                            * (h[(m - 1) * nn + m - 1].abs()
                                + z.abs()
                                + h[(m + 1) * nn + m + 1].abs()))
                {
                    break;
                }
                m -= 1;
            }

            for i in (m + 2)..=nu {
                h[i * nn + i - 2] = T::zero();
                if i > m + 2 {
                    h[i * nn + i - 3] = T::zero();
                }
            }

            // Double QR step on rows l..=n and columns m..=n.
            for k in m..nu {
                let notlast = k != nu - 1;
                if k != m {
                    p = h[k * nn + k - 1];
                    q = h[(k + 1) * nn + k - 1];
                    r = if notlast {
                        h[(k + 2) * nn + k - 1]
                    } else {
                        T::zero()
                    };
                    x = p.abs() + q.abs() + r.abs();
                    if x != T::zero() {
                        p /= x;
                        q /= x;
                        r /= x;
                    }
                }
                if x == T::zero() {
                    break;
                }
                s = (p * p + q * q + r * r).sqrt();
                if p < T::zero() {
                    s = -s;
                }
                if s != T::zero() {
                    if k != m {
                        h[k * nn + k - 1] = -s * x;
                    } else if l != m {
                        h[k * nn + k - 1] = -h[k * nn + k - 1];
                    }
                    p += s;
                    x = p / s;
                    y = q / s;
                    z = r / s;
                    q /= p;
                    r /= p;

                    // Row modification.
                    for j in k..nn {
                        p = h[k * nn + j] + q * h[(k + 1) * nn + j];
                        if notlast {
                            p += r * h[(k + 2) * nn + j];
                            h[(k + 2) * nn + j] -= p * z;
                        }
                        h[k * nn + j] -= p * x;
                        h[(k + 1) * nn + j] -= p * y;
                    }

                    // Column modification.
                    for i in 0..=nu.min(k + 3) {
                        p = x * h[i * nn + k] + y * h[i * nn + k + 1];
                        if notlast {
                            p += z * h[i * nn + k + 2];
                            h[i * nn + k + 2] -= p * r;
                        }
                        h[i * nn + k] -= p;
                        h[i * nn + k + 1] -= p * q;
                    }

                    // Accumulate transformations.
                    for i in low as usize..=high as usize {
                        p = x * v[i * nn + k] + y * v[i * nn + k + 1];
                        if notlast {
                            p += z * v[i * nn + k + 2];
                            v[i * nn + k + 2] -= p * r;
                        }
                        v[i * nn + k] -= p;
                        v[i * nn + k + 1] -= p * q;
                    }
                }
            }
        }
    }

    // Back substitution to find the vectors of the upper triangular form.
    if norm == T::zero() {
        return;
    }

    for nb in (0..nn).rev() {
        p = d[nb];
        q = e[nb];

        if q == T::zero() {
            // Real vector.
            let mut l = nb;
            h[nb * nn + nb] = T::one();
            for i in (0..nb).rev() {
                w = h[i * nn + i] - p;
                r = T::zero();
                for j in l..=nb {
                    r += h[i * nn + j] * h[j * nn + nb];
                }
                if e[i] < T::zero() {
                    z = w;
                    s = r;
                } else {
                    l = i;
                    if e[i] == T::zero() {
                        h[i * nn + nb] = if w != T::zero() {
                            -r / w
                        } else {
                            -r / (eps * norm)
                        };
                    } else {
                        // Solve the 2x2 real system for the conjugate row
                        // pair.
                        x = h[i * nn + i + 1];
                        y = h[(i + 1) * nn + i];
                        q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                        t = (x * s - z * r) / q;
                        h[i * nn + nb] = t;
                        h[(i + 1) * nn + nb] = if x.abs() > z.abs() {
                            (-r - w * t) / x
                        } else {
                            (-s - y * t) / z
                        };
                    }

                    // Overflow control.
                    t = h[i * nn + nb].abs();
                    if (eps * t) * t > T::one() {
                        for j in i..=nb {
                            h[j * nn + nb] /= t;
                        }
                    }
                }
            }
        } else if q < T::zero() {
            // Complex vector; the pair occupies columns nb-1 and nb.
            let mut l = nb - 1;

            if h[nb * nn + nb - 1].abs() > h[(nb - 1) * nn + nb].abs() {
                h[(nb - 1) * nn + nb - 1] = q / h[nb * nn + nb - 1];
                h[(nb - 1) * nn + nb] = -(h[nb * nn + nb] - p) / h[nb * nn + nb - 1];
            } else {
                let (re, im) = cdiv(
                    T::zero(),
                    -h[(nb - 1) * nn + nb],
                    h[(nb - 1) * nn + nb - 1] - p,
                    q,
                );
                h[(nb - 1) * nn + nb - 1] = re;
                h[(nb - 1) * nn + nb] = im;
            }
            h[nb * nn + nb - 1] = T::zero();
            h[nb * nn + nb] = T::one();
            for i in (0..nb.saturating_sub(1)).rev() {
                let mut ra = T::zero();
                let mut sa = T::zero();
                for j in l..=nb {
                    ra += h[i * nn + j] * h[j * nn + nb - 1];
                    sa += h[i * nn + j] * h[j * nn + nb];
                }
                w = h[i * nn + i] - p;

                if e[i] < T::zero() {
                    z = w;
                    r = ra;
                    s = sa;
                } else {
                    l = i;
                    if e[i] == T::zero() {
                        let (re, im) = cdiv(-ra, -sa, w, q);
                        h[i * nn + nb - 1] = re;
                        h[i * nn + nb] = im;
                    } else {
                        // Solve the complex 2x2 system.
                        x = h[i * nn + i + 1];
                        y = h[(i + 1) * nn + i];
                        let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                        let vi = (d[i] - p) * T::of(2.0) * q;
                        if vr == T::zero() && vi == T::zero() {
                            vr = eps
                                * norm
                                * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                        }
                        let (re, im) =
                            cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                        h[i * nn + nb - 1] = re;
                        h[i * nn + nb] = im;
                        if x.abs() > z.abs() + q.abs() {
                            h[(i + 1) * nn + nb - 1] =
                                (-ra - w * h[i * nn + nb - 1] + q * h[i * nn + nb]) / x;
                            h[(i + 1) * nn + nb] =
                                (-sa - w * h[i * nn + nb] - q * h[i * nn + nb - 1]) / x;
                        } else {
                            let (re, im) = cdiv(
                                -r - y * h[i * nn + nb - 1],
                                -s - y * h[i * nn + nb],
                                z,
                                q,
                            );
                            h[(i + 1) * nn + nb - 1] = re;
                            h[(i + 1) * nn + nb] = im;
                        }
                    }

                    // Overflow control.
                    t = h[i * nn + nb - 1].abs().max(h[i * nn + nb].abs());
                    if (eps * t) * t > T::one() {
                        for j in i..=nb {
                            h[j * nn + nb - 1] /= t;
                            h[j * nn + nb] /= t;
                        }
                    }
                }
            }
        }
    }

    // Back transformation to eigenvectors of the original matrix.
    for j in (low as usize..nn).rev() {
        for i in low as usize..=high as usize {
            z = T::zero();
            for k in low as usize..=j.min(high as usize) {
                z += v[i * nn + k] * h[k * nn + j];
            }
            v[i * nn + j] = z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_symmetric_2x2() {
        let a = Matrix2::from_rows([[2.0, 1.0], [1.0, 2.0]]);
        let eig = EigenDecomposition::new(&a).unwrap();
        assert!(eig.is_symmetric());
        let d = eig.real_eigenvalues();
        assert_relative_eq!(d.get([0]), 1.0, epsilon = 1e-10);
        assert_relative_eq!(d.get([1]), 3.0, epsilon = 1e-10);
        assert!(eig.imag_eigenvalues().to_vec().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_symmetric_eigenvalues_sorted_ascending() {
        let a = Matrix2::from_rows([
            [4.0, 1.0, 0.0, 0.0],
            [1.0, 3.0, 1.0, 0.0],
            [0.0, 1.0, 2.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
        ]);
        let eig = EigenDecomposition::new(&a).unwrap();
        let d = eig.real_eigenvalues().to_vec();
        for w in d.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_rotation_matrix_has_complex_pair() {
        // 90-degree rotation: eigenvalues ±i.
        let a = Matrix2::from_rows([[0.0, -1.0], [1.0, 0.0]]);
        let eig = EigenDecomposition::new(&a).unwrap();
        assert!(!eig.is_symmetric());
        let e = eig.imag_eigenvalues().to_vec();
        let mut imags: Vec<f64> = e.clone();
        imags.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(imags[0], -1.0, epsilon = 1e-10);
        assert_relative_eq!(imags[1], 1.0, epsilon = 1e-10);

        // The complex pair shows up as a 2x2 block in D.
        let d = eig.d();
        assert_relative_eq!(d.get([0, 1]), e[0].max(e[1]), epsilon = 1e-10);
    }

    #[test]
    fn test_cdiv() {
        // (1 + 2i) / (3 - 4i) = (-1 + 2i) / 5
        let (re, im) = cdiv(1.0, 2.0, 3.0, -4.0);
        assert_relative_eq!(re, -0.2, epsilon = 1e-12);
        assert_relative_eq!(im, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_non_square_rejected() {
        let a = Matrix2::<f64>::zeros([2, 3]);
        assert!(matches!(
            EigenDecomposition::new(&a),
            Err(MatrixError::NonSquare { .. })
        ));
    }

    #[test]
    fn test_general_real_spectrum() {
        // Triangular matrix: eigenvalues are the diagonal.
        let a = Matrix2::from_rows([[1.0, 2.0, 3.0], [0.0, 5.0, 6.0], [0.0, 0.0, 9.0]]);
        let eig = EigenDecomposition::new(&a).unwrap();
        let mut d = eig.real_eigenvalues().to_vec();
        d.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(d[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(d[1], 5.0, epsilon = 1e-8);
        assert_relative_eq!(d[2], 9.0, epsilon = 1e-8);
    }
}
