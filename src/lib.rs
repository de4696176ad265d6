//! Dense strided matrices with zero-copy views, matrix decompositions, and a
//! concurrent BLAS-style dispatcher.
//!
//! # Core Types
//!
//! - [`Matrix`] (with the [`Vector`], [`Matrix2`], [`Matrix3`] aliases): a
//!   dense 1-, 2- or 3-dimensional container built on strided addressing.
//!   Every view (transpose, sub-range, stride subsampling, flip, selection)
//!   is itself a `Matrix` over the same shared storage — composition is
//!   cheap and never copies elements.
//! - [`Property`]: the tolerance policy behind equality tests and structural
//!   predicates (symmetric, diagonal, triangular, ...).
//! - Decompositions: [`CholeskyDecomposition`], [`LuDecomposition`],
//!   [`QrDecomposition`], [`EigenDecomposition`], [`SvdDecomposition`] —
//!   computed once at construction, immutable thereafter, independent of the
//!   source matrix.
//! - [`Algebra`]: stateless utilities (determinant, inverse, norms, rank,
//!   condition, matrix power, permutation) composed from the above.
//! - [`blas`]: the sequential reference implementation of the vector/matrix
//!   primitives; [`ExecutionContext`] dispatches `gemm`/`gemv` across a
//!   bounded worker pool when the operation is large enough to pay for it.
//!
//! # Example
//!
//! ```rust
//! use stridense::Matrix2;
//!
//! let a = Matrix2::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
//!
//! // Zero-copy transpose: same storage, swapped addressing.
//! let at = a.t();
//! assert_eq!(at.size(), [3, 2]);
//! assert_eq!(at.get([2, 1]), 6.0);
//! assert!(at.shares_storage(&a));
//!
//! // Sub-range view of the first two columns.
//! let left = a.part([0, 0], [2, 2]).unwrap();
//! assert_eq!(left.get([1, 1]), 5.0);
//! ```
//!
//! # Aliasing
//!
//! Views alias their source: writing through a view is visible through every
//! other view of the same storage. Assignments test for shared storage and
//! defensively copy the right-hand side first, so
//! `a.assign(&a.t())` behaves as if the transpose had been materialized into
//! an independent buffer.

mod algebra;
mod axis;
pub mod blas;
mod buffer;
mod decomp;
mod dispatch;
mod matrix;
mod ops;
mod property;
mod scalar;

pub use algebra::{permute_in_place, Algebra};
pub use decomp::{
    CholeskyDecomposition, EigenDecomposition, LuDecomposition, QrDecomposition,
    SvdDecomposition,
};
pub use dispatch::ExecutionContext;
pub use matrix::{Matrix, Matrix2, Matrix3, Vector};
pub use property::Property;
pub use scalar::{Real, Scalar};

// ============================================================================
// Constants
// ============================================================================

/// Default absolute tolerance for equality tests and structural predicates.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Estimated floating-point operations assigned to one parallel task.
///
/// The dispatcher divides an operation's flop estimate (`2*m*n*p` for `gemm`,
/// `2*m*n` for `gemv`) by this to decide how many tasks to fork; below two
/// tasks it runs the sequential engine directly.
pub const FLOPS_PER_TASK: usize = 30_000;

// ============================================================================
// Error types
// ============================================================================

/// Errors surfaced by matrix construction, views, and operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    /// Operand shapes disagree for a binary or multiply operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Axis index is not valid for the matrix rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// A sub-range view would exceed the axis extent.
    #[error("range {start}..{start}+{len} out of bounds for axis {axis} of size {size}")]
    RangeOutOfBounds {
        axis: usize,
        start: usize,
        len: usize,
        size: usize,
    },

    /// Stride subsampling step must be positive.
    #[error("invalid step {step} for axis {axis}")]
    InvalidStep { axis: usize, step: usize },

    /// A selection index lies outside the axis extent.
    #[error("selection index {index} out of range for axis {axis} of size {size}")]
    InvalidSelection {
        axis: usize,
        index: usize,
        size: usize,
    },

    /// A square matrix was required.
    #[error("non-square matrix: {rows}x{cols}")]
    NonSquare { rows: usize, cols: usize },

    /// QR requires at least as many rows as columns.
    #[error("matrix has fewer rows than columns: {rows}x{cols}")]
    RowsLessThanColumns { rows: usize, cols: usize },

    /// The matrix is singular; the requested solve/inverse is undefined.
    #[error("matrix is singular")]
    Singular,

    /// The decomposition is rank deficient; solve is undefined.
    #[error("matrix is rank deficient")]
    RankDeficient,

    /// The result matrix of a multiply shares storage with an operand.
    #[error("result matrix aliases an operand")]
    AliasedResult,
}

/// Result type for matrix operations.
pub type Result<T> = std::result::Result<T, MatrixError>;
