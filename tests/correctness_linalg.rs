//! Decomposition and dispatcher correctness on the properties the crate
//! guarantees: reconstruction within tolerance, flag semantics, and
//! parallel/sequential equivalence.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stridense::{
    blas, Algebra, CholeskyDecomposition, EigenDecomposition, ExecutionContext, Matrix2,
    Property, QrDecomposition,
};

fn random(rows: usize, cols: usize, seed: u64) -> Matrix2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Matrix2::from_fn([rows, cols], |_| rng.gen_range(-1.0..1.0))
}

/// `AᵗA + n·I` is symmetric positive definite for any A.
fn random_spd(n: usize, seed: u64) -> Matrix2<f64> {
    let a = random(n, n, seed);
    let mut ata = Matrix2::<f64>::zeros([n, n]);
    blas::gemm(1.0, &a.t(), &a, 0.0, &mut ata).unwrap();
    for i in 0..n {
        let v = ata.get([i, i]) + n as f64;
        ata.set([i, i], v);
    }
    // Exact symmetry, not just up to rounding.
    for i in 0..n {
        for j in 0..i {
            ata.set([j, i], ata.get([i, j]));
        }
    }
    ata
}

fn mult(a: &Matrix2<f64>, b: &Matrix2<f64>) -> Matrix2<f64> {
    let mut c = Matrix2::<f64>::zeros([a.rows(), b.columns()]);
    blas::gemm(1.0, a, b, 0.0, &mut c).unwrap();
    c
}

#[test]
fn test_cholesky_reconstructs_spd_input() {
    for seed in [1, 2, 3] {
        let a = random_spd(8, seed);
        let ch = CholeskyDecomposition::new(&a).unwrap();
        assert!(ch.is_spd());
        let l = ch.l();
        let llt = mult(&l, &l.t());
        assert!(Property::new(1e-8).equals(&llt, &a));
    }
}

#[test]
fn test_cholesky_concrete_scenario() {
    let a = Matrix2::from_rows([
        [4.0, 12.0, -16.0],
        [12.0, 37.0, -43.0],
        [-16.0, -43.0, 98.0],
    ]);
    let ch = CholeskyDecomposition::new(&a).unwrap();
    assert!(ch.is_spd());
    let l = ch.l();
    let expected = Matrix2::from_rows([[2.0, 0.0, 0.0], [6.0, 1.0, 0.0], [-8.0, 5.0, 3.0]]);
    assert!(Property::default().equals(&l, &expected));
}

#[test]
fn test_qr_reconstructs_and_q_is_orthonormal() {
    let a = random(9, 5, 42);
    let qr = QrDecomposition::new(&a).unwrap();
    assert!(qr.has_full_rank());
    let prop = Property::new(1e-8);
    assert!(prop.equals(&mult(&qr.q(), &qr.r()), &a));
    assert!(prop.is_orthogonal(&qr.q()));
}

#[test]
fn test_qr_identity_scenario() {
    let qr = QrDecomposition::new(&Matrix2::<f64>::identity(2)).unwrap();
    assert!(qr.has_full_rank());
    assert!(Property::default().is_identity(&qr.q()));
    assert!(Property::default().is_identity(&qr.r()));
}

#[test]
fn test_symmetric_eigen_reconstructs() {
    let a = random_spd(7, 9);
    let eig = EigenDecomposition::new(&a).unwrap();
    assert!(eig.is_symmetric());

    // All eigenvalues real.
    let imag = eig.imag_eigenvalues();
    for i in 0..7 {
        assert_relative_eq!(imag.get([i]), 0.0);
    }

    // V·D·Vᵗ = A (V is orthogonal on the symmetric path, so V⁻¹ = Vᵗ).
    let v = eig.v();
    let vdvt = mult(&mult(&v, &eig.d()), &v.t());
    assert!(Property::new(1e-8).equals(&vdvt, &a));
}

#[test]
fn test_general_eigen_satisfies_av_equals_vd() {
    // Nonsymmetric with a complex conjugate pair and a real eigenvalue.
    let a = Matrix2::from_rows([[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 3.0]]);
    let eig = EigenDecomposition::new(&a).unwrap();
    assert!(!eig.is_symmetric());

    let av = mult(&a, &eig.v());
    let vd = mult(&eig.v(), &eig.d());
    assert!(Property::new(1e-8).equals(&av, &vd));

    let eigenvalues = eig.complex_eigenvalues();
    let mut reals: Vec<f64> = eigenvalues.iter().map(|c| c.re).collect();
    reals.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_relative_eq!(reals[2], 3.0, epsilon = 1e-8);
    let max_imag = eigenvalues.iter().map(|c| c.im.abs()).fold(0.0, f64::max);
    assert_relative_eq!(max_imag, 1.0, epsilon = 1e-8);
}

#[test]
fn test_parallel_gemm_equals_sequential() {
    // 96x96x96 is ~1.8M flops: far past the dispatch threshold.
    let a = random(96, 96, 1234);
    let b = random(96, 96, 5678);
    let mut c_par = Matrix2::<f64>::zeros([96, 96]);
    let mut c_seq = Matrix2::<f64>::zeros([96, 96]);

    ExecutionContext::new(8)
        .gemm(1.0, &a, &b, 0.0, &mut c_par)
        .unwrap();
    blas::gemm(1.0, &a, &b, 0.0, &mut c_seq).unwrap();

    // Tasks compute identical partial sums over identical sub-views, so the
    // results agree bit for bit.
    for i in 0..96 {
        for j in 0..96 {
            assert_eq!(c_par.get([i, j]), c_seq.get([i, j]));
        }
    }
}

#[test]
fn test_parallel_gemv_equals_sequential() {
    let a = random(300, 120, 7);
    let x = random(120, 1, 8).column(0).unwrap();
    let mut y_par = stridense::Vector::<f64>::zeros([300]);
    let mut y_seq = stridense::Vector::<f64>::zeros([300]);

    ExecutionContext::new(4)
        .gemv(1.0, &a, &x, 0.0, &mut y_par)
        .unwrap();
    blas::gemv(1.0, &a, &x, 0.0, &mut y_seq).unwrap();

    for i in 0..300 {
        assert_eq!(y_par.get([i]), y_seq.get([i]));
    }
}

#[test]
fn test_algebra_round_trips() {
    let alg = Algebra::default();
    let a = random_spd(6, 21);

    // inverse(A)·A = I
    let inv = alg.inverse(&a).unwrap();
    assert!(Property::new(1e-7).is_identity(&alg.mult(&inv, &a).unwrap()));

    // det(A) equals the product of the eigenvalues for SPD input.
    let eig = EigenDecomposition::new(&a).unwrap();
    let product: f64 = eig.real_eigenvalues().to_vec().iter().product();
    assert_relative_eq!(alg.det(&a).unwrap(), product, max_relative = 1e-8);

    // A^2 equals A·A.
    let squared = alg.pow(&a, 2).unwrap();
    assert!(Property::new(1e-9).equals(&squared, &mult(&a, &a)));

    // Full rank and a sane condition number.
    assert_eq!(alg.rank(&a), 6);
    assert!(alg.cond(&a) >= 1.0);
}

#[test]
fn test_solve_against_known_system() {
    let alg = Algebra::default();
    let a = random_spd(5, 33);
    let x_true = random(5, 2, 44);
    let b = mult(&a, &x_true);
    let x = alg.solve(&a, &b).unwrap();
    assert!(Property::new(1e-7).equals(&x, &x_true));
}
