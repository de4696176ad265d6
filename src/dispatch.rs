//! Parallel dispatch for the multiply primitives.
//!
//! [`ExecutionContext`] decides per call whether a `gemm`/`gemv` is worth
//! splitting: the flop estimate (`2*m*n*p`, resp. `2*m*n`) divided by
//! [`crate::FLOPS_PER_TASK`] gives a task count, clamped by the worker
//! budget and by the extent of the split dimension (columns of `B` for
//! `gemm`, rows of `A` for `gemv`). Below two tasks the sequential engine
//! runs directly — fork overhead would dominate.
//!
//! Each task receives disjoint sub-views of the output (and the matching
//! input slices) and runs the sequential primitive on them. Output regions
//! partition the index range exactly once, so tasks never contend; all tasks
//! are joined before returning and the first error, if any, is propagated
//! afterwards.
//!
//! The remaining BLAS primitives are O(n)..O(n^2) with trivial per-cell
//! work; they always run sequentially via [`crate::blas`].
//!
//! Set `STRIDENSE_TRACE=1` to log dispatch decisions to stderr.

use crate::blas;
use crate::matrix::{Matrix2, Vector};
use crate::scalar::Real;
use crate::{MatrixError, Result, FLOPS_PER_TASK};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use smallvec::SmallVec;

#[inline]
fn trace_enabled() -> bool {
    matches!(std::env::var("STRIDENSE_TRACE"), Ok(ref v) if v == "1")
}

/// Execution policy for operations that may parallelize.
///
/// Immutable once constructed; to run under a different worker budget or
/// threshold, build a new context. The [`Default`] instance spans the
/// available parallelism.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionContext {
    workers: usize,
    flops_per_task: usize,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        #[cfg(feature = "parallel")]
        let workers = rayon::current_num_threads();
        #[cfg(not(feature = "parallel"))]
        let workers = 1;
        ExecutionContext {
            workers: workers.max(1),
            flops_per_task: FLOPS_PER_TASK,
        }
    }
}

impl ExecutionContext {
    /// A context forking at most `workers` tasks per operation.
    pub fn new(workers: usize) -> Self {
        ExecutionContext {
            workers: workers.max(1),
            ..Self::default()
        }
    }

    /// A context that never parallelizes.
    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Replace the per-task flop threshold.
    pub fn with_flops_per_task(self, flops_per_task: usize) -> Self {
        ExecutionContext {
            flops_per_task: flops_per_task.max(1),
            ..self
        }
    }

    /// The maximum number of tasks forked per operation.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Matrix-matrix multiply `C = alpha * A * B + beta * C`, split across
    /// column blocks of `B` when large enough.
    pub fn gemm<T: Real>(
        &self,
        alpha: T,
        a: &Matrix2<T>,
        b: &Matrix2<T>,
        beta: T,
        c: &mut Matrix2<T>,
    ) -> Result<()> {
        let (m, n, p) = (a.rows(), a.columns(), b.columns());
        if n != b.rows() {
            return Err(MatrixError::ShapeMismatch(
                a.size().to_vec(),
                b.size().to_vec(),
            ));
        }
        if c.rows() != m || c.columns() != p {
            return Err(MatrixError::ShapeMismatch(c.size().to_vec(), vec![m, p]));
        }
        if c.shares_storage(a) || c.shares_storage(b) {
            return Err(MatrixError::AliasedResult);
        }

        let flops = 2 * m * n * p;
        let tasks = self.task_count(flops, p);
        if trace_enabled() {
            eprintln!("stridense: gemm {m}x{n}x{p} -> {tasks} task(s)");
        }
        if tasks < 2 {
            return blas::gemm(alpha, a, b, beta, c);
        }
        gemm_tasks(alpha, a, b, beta, c, tasks)
    }

    /// Matrix-vector multiply `y = alpha * A * x + beta * y`, split across
    /// row blocks of `A` when large enough.
    pub fn gemv<T: Real>(
        &self,
        alpha: T,
        a: &Matrix2<T>,
        x: &Vector<T>,
        beta: T,
        y: &mut Vector<T>,
    ) -> Result<()> {
        let (m, n) = (a.rows(), a.columns());
        if x.len() != n || y.len() != m {
            return Err(MatrixError::ShapeMismatch(
                a.size().to_vec(),
                vec![x.len(), y.len()],
            ));
        }
        if y.shares_storage(a) || y.shares_storage(x) {
            return Err(MatrixError::AliasedResult);
        }

        let flops = 2 * m * n;
        let tasks = self.task_count(flops, m);
        if trace_enabled() {
            eprintln!("stridense: gemv {m}x{n} -> {tasks} task(s)");
        }
        if tasks < 2 {
            return blas::gemv(alpha, a, x, beta, y);
        }
        gemv_tasks(alpha, a, x, beta, y, tasks)
    }

    /// Task count for an operation of `flops` estimated floating-point
    /// operations whose split dimension has `units` independent units.
    fn task_count(&self, flops: usize, units: usize) -> usize {
        let by_cost = flops / self.flops_per_task;
        by_cost.min(self.workers).min(units)
    }
}

/// Fork one sequential `gemm` per disjoint column block of `B` and `C`.
#[cfg(feature = "parallel")]
fn gemm_tasks<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    b: &Matrix2<T>,
    beta: T,
    c: &mut Matrix2<T>,
    tasks: usize,
) -> Result<()> {
    let (m, n, p) = (a.rows(), a.columns(), b.columns());
    let mut parts: SmallVec<[(Matrix2<T>, Matrix2<T>); 16]> = SmallVec::new();
    for t in 0..tasks {
        let start = t * p / tasks;
        let end = (t + 1) * p / tasks;
        let b_part = b.part([0, start], [n, end - start])?;
        let c_part = c.part([0, start], [m, end - start])?;
        parts.push((b_part, c_part));
    }
    join_all(
        parts
            .into_vec()
            .into_par_iter()
            .map(|(b_part, mut c_part)| blas::gemm(alpha, a, &b_part, beta, &mut c_part)),
    )
}

#[cfg(not(feature = "parallel"))]
fn gemm_tasks<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    b: &Matrix2<T>,
    beta: T,
    c: &mut Matrix2<T>,
    _tasks: usize,
) -> Result<()> {
    blas::gemm(alpha, a, b, beta, c)
}

/// Fork one sequential `gemv` per disjoint row block of `A` and `y`.
#[cfg(feature = "parallel")]
fn gemv_tasks<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    x: &Vector<T>,
    beta: T,
    y: &mut Vector<T>,
    tasks: usize,
) -> Result<()> {
    let (m, n) = (a.rows(), a.columns());
    let mut parts: SmallVec<[(Matrix2<T>, Vector<T>); 16]> = SmallVec::new();
    for t in 0..tasks {
        let start = t * m / tasks;
        let end = (t + 1) * m / tasks;
        let a_part = a.part([start, 0], [end - start, n])?;
        let y_part = y.part([start], [end - start])?;
        parts.push((a_part, y_part));
    }
    join_all(
        parts
            .into_vec()
            .into_par_iter()
            .map(|(a_part, mut y_part)| blas::gemv(alpha, &a_part, x, beta, &mut y_part)),
    )
}

#[cfg(not(feature = "parallel"))]
fn gemv_tasks<T: Real>(
    alpha: T,
    a: &Matrix2<T>,
    x: &Vector<T>,
    beta: T,
    y: &mut Vector<T>,
    _tasks: usize,
) -> Result<()> {
    blas::gemv(alpha, a, x, beta, y)
}

/// Run all tasks to completion, then surface the first error.
#[cfg(feature = "parallel")]
fn join_all(tasks: impl ParallelIterator<Item = Result<()>>) -> Result<()> {
    let results: Vec<Result<()>> = tasks.collect();
    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}
