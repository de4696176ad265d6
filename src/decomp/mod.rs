//! Matrix decompositions.
//!
//! Each decomposition is computed once at construction from a 2D matrix,
//! owns everything it derived, and stays valid if the source mutates
//! afterwards. Numerical degeneracy (a non-positive-definite Cholesky input,
//! a rank-deficient QR) is reported through a flag on the finished
//! decomposition, not an error at construction; only `solve` on a degenerate
//! decomposition errors.

mod cholesky;
mod eigen;
mod lu;
mod qr;
mod svd;

pub use cholesky::CholeskyDecomposition;
pub use eigen::EigenDecomposition;
pub use lu::LuDecomposition;
pub use qr::QrDecomposition;
pub use svd::SvdDecomposition;
