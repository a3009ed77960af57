//! Planned, parallel tensor transposition.
//!
//! Computes `out = alpha * permute(in) + beta * out` for dense N-dimensional
//! tensors, where output dimension `k` is input dimension `perm[k]`.
//!
//! Work is split into two phases:
//!
//! 1. **Planning**: the [`PlanOptimizer`] merges contiguous dimensions,
//!    deploys tile and line kernels over the index space and ranks
//!    candidate loop orders and thread splits with a cost model, optionally
//!    timing the best candidates.
//! 2. **Execution**: an [`ExecutionGraph`] compiles the chosen
//!    [`Descriptor`] into a tree of loops, parallel regions and kernel calls
//!    that can be run any number of times.
//!
//! # Core Types
//!
//! - [`TensorView`] / [`TensorViewMut`]: non-owning views, optionally of a
//!   padded sub-tensor
//! - [`TransposeParameters`]: validated binding of views, permutation and
//!   coefficients
//! - [`Descriptor`]: loop order, parallel strategy and kernel regions
//! - [`ExecutionGraph`]: the runnable plan
//!
//! # Example
//!
//! ```rust
//! use tenperm::{create_trans_graph, TensorView, TensorViewMut, TransOptions};
//!
//! let input: Vec<f64> = (0..16).map(|i| i as f64).collect();
//! let mut output = vec![0.0; 16];
//!
//! let mut graph = create_trans_graph(
//!     TensorView::new(&input, &[4, 4]).unwrap(),
//!     TensorViewMut::new(&mut output, &[4, 4]).unwrap(),
//!     &[1, 0],
//!     1.0,
//!     0.0,
//!     &TransOptions::default(),
//! )
//! .unwrap();
//! graph.exec();
//!
//! assert_eq!(graph.output()[1], 4.0);
//! assert_eq!(graph.output()[4], 1.0);
//! ```

pub mod config;
pub mod descriptor;
mod fuse;
pub mod graph;
pub mod param;
pub mod plan;

pub use config::{HeuristicConfig, TransOptions};
pub use descriptor::{Descriptor, LoopOrder, LoopParam, ParaStrategy};
pub use graph::ExecutionGraph;
pub use param::{MergedGeometry, TransposeParameters};
pub use plan::tune::calc_throughput;
pub use plan::PlanOptimizer;

pub use tenperm_kernel::{ElementKind, Isa, KernelCaps, KernelType, TransElement};
pub use tenperm_view::{Layout, Result, TensorShape, TensorView, TensorViewMut, TransError};

use graph::threading::WorkerPool;

/// Plan and build an execution graph.
///
/// The planner runs with `options.threads` threads and the tuning budget in
/// `options.tune_budget`; tuning never touches `output`.
pub fn create_trans_graph<'a, T: TransElement>(
    input: TensorView<'a, T>,
    output: TensorViewMut<'a, T>,
    perm: &[usize],
    alpha: T::Real,
    beta: T::Real,
    options: &TransOptions,
) -> Result<ExecutionGraph<'a, T>> {
    let param = TransposeParameters::new(input, output, perm, alpha, beta)?;
    let pool = WorkerPool::new(options.threads)?;

    let descriptor = {
        let optimizer = PlanOptimizer::with_pool(&param, options, pool.clone());
        let best = optimizer.get_optimal().into_iter().next();
        best.unwrap_or_else(|| optimizer.default_descriptor())
    };

    ExecutionGraph::build(param, descriptor, options.caps.kernels::<T>(), pool)
}

/// Build an execution graph from a known descriptor, skipping planning.
///
/// The descriptor must come from parameters with the same merged geometry,
/// for example from [`ExecutionGraph::get_descriptor`] of an earlier graph.
pub fn create_trans_graph_with_descriptor<'a, T: TransElement>(
    input: TensorView<'a, T>,
    output: TensorViewMut<'a, T>,
    perm: &[usize],
    alpha: T::Real,
    beta: T::Real,
    descriptor: Descriptor,
    options: &TransOptions,
) -> Result<ExecutionGraph<'a, T>> {
    let param = TransposeParameters::new(input, output, perm, alpha, beta)?;
    let pool = WorkerPool::new(options.threads)?;
    ExecutionGraph::build(param, descriptor, options.caps.kernels::<T>(), pool)
}

/// One-shot transposition of contiguous column-major buffers.
///
/// `sizes` are the input sizes; the output sizes follow from `perm`.
pub fn transpose<T: TransElement>(
    input: &[T],
    output: &mut [T],
    sizes: &[usize],
    perm: &[usize],
    alpha: T::Real,
    beta: T::Real,
) -> Result<()> {
    param::validate_perm(perm, sizes.len())?;
    let out_sizes: Vec<usize> = perm.iter().map(|&p| sizes[p]).collect();
    let mut graph = create_trans_graph(
        TensorView::new(input, sizes)?,
        TensorViewMut::new(output, &out_sizes)?,
        perm,
        alpha,
        beta,
        &TransOptions::default(),
    )?;
    graph.exec();
    Ok(())
}
