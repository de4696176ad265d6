//! Singular value decomposition.
//!
//! Golub–Kahan bidiagonalization followed by implicit QR iteration on the
//! bidiagonal form. Singular values come out non-negative and descending;
//! they back the rank, condition-number and 2-norm queries of the algebra
//! facade. Internally the decomposition runs on `A` or `Aᵗ` so the row
//! count is never smaller than the column count, and the factors are
//! swapped back on access.

use crate::matrix::{Matrix2, Vector};
use crate::scalar::Real;

pub struct SvdDecomposition<T: Real> {
    /// Left factor of the internal (possibly transposed) problem.
    u: Vec<T>,
    /// Right factor of the internal problem.
    v: Vec<T>,
    s: Vec<T>,
    /// Internal row/column counts, `mm >= nn`.
    mm: usize,
    nn: usize,
    transposed: bool,
}

impl<T: Real> SvdDecomposition<T> {
    /// Decompose an `m x n` matrix.
    pub fn new(a: &Matrix2<T>) -> Self {
        let (m, n) = (a.rows(), a.columns());
        let transposed = m < n;
        let (mm, nn, data) = if transposed {
            (n, m, a.t().to_vec())
        } else {
            (m, n, a.to_vec())
        };
        let (u, v, s) = decompose(mm, nn, data);
        SvdDecomposition {
            u,
            v,
            s,
            mm,
            nn,
            transposed,
        }
    }

    /// The singular values, non-negative and descending.
    pub fn s(&self) -> Vector<T> {
        Vector::from_vec(self.s.clone(), [self.s.len()]).expect("singular value buffer")
    }

    /// The left singular vectors of the source matrix, one per column.
    pub fn u(&self) -> Matrix2<T> {
        if self.transposed {
            self.internal_v()
        } else {
            self.internal_u()
        }
    }

    /// The right singular vectors of the source matrix, one per column.
    pub fn v(&self) -> Matrix2<T> {
        if self.transposed {
            self.internal_u()
        } else {
            self.internal_v()
        }
    }

    /// The 2-norm: the largest singular value (zero for an empty matrix).
    pub fn norm2(&self) -> T {
        self.s.first().copied().unwrap_or_else(T::zero)
    }

    /// The 2-norm condition number `s_max / s_min`.
    pub fn cond(&self) -> T {
        if self.s.is_empty() {
            return T::nan();
        }
        self.s[0] / self.s[self.nn.min(self.mm) - 1]
    }

    /// The effective numerical rank: singular values above
    /// `max(m, n) * s_max * eps` count.
    pub fn rank(&self) -> usize {
        let tol = T::of(self.mm.max(self.nn) as f64) * self.norm2() * T::epsilon();
        self.s.iter().filter(|&&x| x > tol).count()
    }

    fn internal_u(&self) -> Matrix2<T> {
        Matrix2::from_vec(self.u.clone(), [self.mm, self.nn]).expect("left factor buffer")
    }

    fn internal_v(&self) -> Matrix2<T> {
        Matrix2::from_vec(self.v.clone(), [self.nn, self.nn]).expect("right factor buffer")
    }
}

/// Run the decomposition on row-major `data` with `mm >= nn`.
/// Returns `(u, v, s)` with `u` of shape `mm x nn` and `v` of `nn x nn`.
#[allow(clippy::too_many_lines)]
fn decompose<T: Real>(mm: usize, nn: usize, mut a: Vec<T>) -> (Vec<T>, Vec<T>, Vec<T>) {
    let (m, n) = (mm, nn);
    let nu = n;
    let mut s = vec![T::zero(); n];
    let mut u = vec![T::zero(); m * nu];
    let mut v = vec![T::zero(); n * n];
    if m == 0 || n == 0 {
        return (u, v, s);
    }
    let mut e = vec![T::zero(); n];
    let mut work = vec![T::zero(); m];

    // Bidiagonalize: diagonal into s, super-diagonal into e.
    let nct = (m - 1).min(n);
    let nrt = n.saturating_sub(2);
    for k in 0..nct.max(nrt) {
        if k < nct {
            s[k] = T::zero();
            for i in k..m {
                s[k] = s[k].hypot(a[i * n + k]);
            }
            if s[k] != T::zero() {
                if a[k * n + k] < T::zero() {
                    s[k] = -s[k];
                }
                for i in k..m {
                    a[i * n + k] /= s[k];
                }
                a[k * n + k] += T::one();
            }
            s[k] = -s[k];
        }
        for j in (k + 1)..n {
            if k < nct && s[k] != T::zero() {
                let mut t = T::zero();
                for i in k..m {
                    t += a[i * n + k] * a[i * n + j];
                }
                t = -t / a[k * n + k];
                for i in k..m {
                    let u_ = t * a[i * n + k];
                    a[i * n + j] += u_;
                }
            }
            e[j] = a[k * n + j];
        }
        if k < nct {
            for i in k..m {
                u[i * nu + k] = a[i * n + k];
            }
        }
        if k < nrt {
            e[k] = T::zero();
            for i in (k + 1)..n {
                e[k] = e[k].hypot(e[i]);
            }
            if e[k] != T::zero() {
                if e[k + 1] < T::zero() {
                    e[k] = -e[k];
                }
                let ek = e[k];
                for i in (k + 1)..n {
                    e[i] /= ek;
                }
                e[k + 1] += T::one();
            }
            e[k] = -e[k];
            if k + 1 < m && e[k] != T::zero() {
                for item in work.iter_mut().take(m).skip(k + 1) {
                    *item = T::zero();
                }
                for j in (k + 1)..n {
                    for i in (k + 1)..m {
                        work[i] += e[j] * a[i * n + j];
                    }
                }
                for j in (k + 1)..n {
                    let t = -e[j] / e[k + 1];
                    for i in (k + 1)..m {
                        let u_ = t * work[i];
                        a[i * n + j] += u_;
                    }
                }
            }
            for i in (k + 1)..n {
                v[i * n + k] = e[i];
            }
        }
    }

    // Final bidiagonal matrix of order p.
    let p = n;
    if nct < n {
        s[nct] = a[nct * n + nct];
    }
    if nrt + 1 < p {
        e[nrt] = a[nrt * n + p - 1];
    }
    e[p - 1] = T::zero();

    // Generate U.
    for j in nct..nu {
        for i in 0..m {
            u[i * nu + j] = T::zero();
        }
        u[j * nu + j] = T::one();
    }
    for k in (0..nct).rev() {
        if s[k] != T::zero() {
            for j in (k + 1)..nu {
                let mut t = T::zero();
                for i in k..m {
                    t += u[i * nu + k] * u[i * nu + j];
                }
                t = -t / u[k * nu + k];
                for i in k..m {
                    let u_ = t * u[i * nu + k];
                    u[i * nu + j] += u_;
                }
            }
            for i in k..m {
                u[i * nu + k] = -u[i * nu + k];
            }
            u[k * nu + k] += T::one();
            for i in 0..k.saturating_sub(1) {
                u[i * nu + k] = T::zero();
            }
        } else {
            for i in 0..m {
                u[i * nu + k] = T::zero();
            }
            u[k * nu + k] = T::one();
        }
    }

    // Generate V.
    for k in (0..n).rev() {
        if k < nrt && e[k] != T::zero() {
            for j in (k + 1)..nu {
                let mut t = T::zero();
                for i in (k + 1)..n {
                    t += v[i * n + k] * v[i * n + j];
                }
                t = -t / v[(k + 1) * n + k];
                for i in (k + 1)..n {
                    let u_ = t * v[i * n + k];
                    v[i * n + j] += u_;
                }
            }
        }
        for i in 0..n {
            v[i * n + k] = T::zero();
        }
        v[k * n + k] = T::one();
    }

    // Iterate the bidiagonal form to diagonal.
    let pp_init = p - 1;
    let mut p = p;
    let eps = T::epsilon();
    let tiny = T::of(2.0).powi(-966);
    while p > 0 {
        // Locate negligible elements; `k` splits the active block.
        let mut k: isize = p as isize - 2;
        while k >= 0 {
            let ku = k as usize;
            if e[ku].abs() <= tiny + eps * (s[ku].abs() + s[ku + 1].abs()) {
                e[ku] = T::zero();
                break;
            }
            k -= 1;
        }

        let kase;
        if k == p as isize - 2 {
            kase = 4;
        } else {
            let mut ks: isize = p as isize - 1;
            while ks > k {
                let ksu = ks as usize;
                let t = if ks != p as isize { e[ksu].abs() } else { T::zero() }
                    + if ks != k + 1 { e[ksu - 1].abs() } else { T::zero() };
                if s[ksu].abs() <= tiny + eps * t {
                    s[ksu] = T::zero();
                    break;
                }
                ks -= 1;
            }
            if ks == k {
                kase = 3;
            } else if ks == p as isize - 1 {
                kase = 1;
            } else {
                kase = 2;
                k = ks;
            }
        }
        let mut k = (k + 1) as usize;

        match kase {
            // Deflate negligible s(p).
            1 => {
                let mut f = e[p - 2];
                e[p - 2] = T::zero();
                for j in (k..=(p - 2)).rev() {
                    let mut t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    if j != k {
                        f = -sn * e[j - 1];
                        e[j - 1] = cs * e[j - 1];
                    }
                    for i in 0..n {
                        t = cs * v[i * n + j] + sn * v[i * n + p - 1];
                        v[i * n + p - 1] = -sn * v[i * n + j] + cs * v[i * n + p - 1];
                        v[i * n + j] = t;
                    }
                }
            }
            // Split at negligible s(k).
            2 => {
                let mut f = e[k - 1];
                e[k - 1] = T::zero();
                for j in k..p {
                    let mut t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    f = -sn * e[j];
                    e[j] = cs * e[j];
                    for i in 0..m {
                        t = cs * u[i * nu + j] + sn * u[i * nu + k - 1];
                        u[i * nu + k - 1] = -sn * u[i * nu + j] + cs * u[i * nu + k - 1];
                        u[i * nu + j] = t;
                    }
                }
            }
            // One QR step.
            3 => {
                let scale = s[p - 1]
                    .abs()
                    .max(s[p - 2].abs())
                    .max(e[p - 2].abs())
                    .max(s[k].abs())
                    .max(e[k].abs());
                let sp = s[p - 1] / scale;
                let spm1 = s[p - 2] / scale;
                let epm1 = e[p - 2] / scale;
                let sk = s[k] / scale;
                let ek = e[k] / scale;
                let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) / T::of(2.0);
                let c = (sp * epm1) * (sp * epm1);
                let mut shift = T::zero();
                if b != T::zero() || c != T::zero() {
                    shift = (b * b + c).sqrt();
                    if b < T::zero() {
                        shift = -shift;
                    }
                    shift = c / (b + shift);
                }
                let mut f = (sk + sp) * (sk - sp) + shift;
                let mut g = sk * ek;

                // Chase the bulge down the bidiagonal.
                for j in k..(p - 1) {
                    let mut t = f.hypot(g);
                    let mut cs = f / t;
                    let mut sn = g / t;
                    if j != k {
                        e[j - 1] = t;
                    }
                    f = cs * s[j] + sn * e[j];
                    e[j] = cs * e[j] - sn * s[j];
                    g = sn * s[j + 1];
                    s[j + 1] = cs * s[j + 1];
                    for i in 0..n {
                        t = cs * v[i * n + j] + sn * v[i * n + j + 1];
                        v[i * n + j + 1] = -sn * v[i * n + j] + cs * v[i * n + j + 1];
                        v[i * n + j] = t;
                    }
                    t = f.hypot(g);
                    cs = f / t;
                    sn = g / t;
                    s[j] = t;
                    f = cs * e[j] + sn * s[j + 1];
                    s[j + 1] = -sn * e[j] + cs * s[j + 1];
                    g = sn * e[j + 1];
                    e[j + 1] = cs * e[j + 1];
                    if j < m - 1 {
                        for i in 0..m {
                            t = cs * u[i * nu + j] + sn * u[i * nu + j + 1];
                            u[i * nu + j + 1] = -sn * u[i * nu + j] + cs * u[i * nu + j + 1];
                            u[i * nu + j] = t;
                        }
                    }
                }
                e[p - 2] = f;
            }
            // Convergence.
            _ => {
                // Make the singular value positive.
                if s[k] <= T::zero() {
                    s[k] = if s[k] < T::zero() { -s[k] } else { T::zero() };
                    for i in 0..=pp_init {
                        v[i * n + k] = -v[i * n + k];
                    }
                }
                // Bubble it into descending order.
                while k < pp_init {
                    if s[k] >= s[k + 1] {
                        break;
                    }
                    s.swap(k, k + 1);
                    if k < n - 1 {
                        for i in 0..n {
                            v.swap(i * n + k, i * n + k + 1);
                        }
                    }
                    if k < m - 1 {
                        for i in 0..m {
                            u.swap(i * nu + k, i * nu + k + 1);
                        }
                    }
                    k += 1;
                }
                p -= 1;
            }
        }
    }

    (u, v, s)
}
