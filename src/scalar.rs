//! Element-type traits.
//!
//! [`Scalar`] bounds the container layer (storage, views, elementwise
//! operations); [`Real`] bounds the numeric layer (BLAS primitives and
//! decompositions) and is a closed trait over the fixed-width float types.

use num_traits::{Float, NumAssign, One, Zero};
use std::fmt::Debug;

/// Element types storable in a [`crate::Matrix`].
pub trait Scalar:
    Copy + Debug + PartialEq + PartialOrd + Zero + One + NumAssign + Send + Sync + 'static
{
}

impl<T> Scalar for T where
    T: Copy + Debug + PartialEq + PartialOrd + Zero + One + NumAssign + Send + Sync + 'static
{
}

/// Fixed-width floating-point element types.
///
/// Implemented for `f32` and `f64` only. The extra [`Real::of`] constructor
/// converts the `f64` constants appearing in the iterative algorithms
/// (shift heuristics, convergence factors) without an `Option` round-trip.
pub trait Real: Scalar + Float {
    /// Lossy conversion from an `f64` constant.
    fn of(x: f64) -> Self;
}

impl Real for f32 {
    #[inline]
    fn of(x: f64) -> Self {
        x as f32
    }
}

impl Real for f64 {
    #[inline]
    fn of(x: f64) -> Self {
        x
    }
}
