//! Execution graph: a compiled descriptor that can be run repeatedly.

pub(crate) mod op;
pub(crate) mod threading;

use tenperm_kernel::{KernelSet, TransElement};
use tenperm_view::Result;
use tracing::debug;

use crate::descriptor::Descriptor;
use crate::param::TransposeParameters;
use op::{build_region, ExecCtx, OpNode};
use threading::{SendPtr, WorkerPool};

/// A transposition bound to its buffers, strategy and worker pool.
///
/// Built once by [`create_trans_graph`](crate::create_trans_graph) or
/// [`create_trans_graph_with_descriptor`](crate::create_trans_graph_with_descriptor),
/// then executed any number of times. Coefficients can be changed between
/// runs without rebuilding.
pub struct ExecutionGraph<'a, T: TransElement> {
    param: TransposeParameters<'a, T>,
    descriptor: Descriptor,
    kernels: KernelSet<T>,
    pool: WorkerPool,
    operations: Vec<OpNode>,
}

impl<T: TransElement> std::fmt::Debug for ExecutionGraph<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionGraph")
            .field("param", &self.param)
            .field("descriptor", &self.descriptor)
            .field("kernels", &self.kernels)
            .field("threads", &self.pool.threads())
            .finish()
    }
}

impl<'a, T: TransElement> ExecutionGraph<'a, T> {
    pub(crate) fn build(
        param: TransposeParameters<'a, T>,
        descriptor: Descriptor,
        kernels: KernelSet<T>,
        pool: WorkerPool,
    ) -> Result<Self> {
        let merged = param.merged();
        descriptor.validate(merged, &kernels, pool.threads())?;

        let operations = descriptor
            .description
            .iter()
            .map(|region| {
                build_region(
                    region,
                    &descriptor.loop_order,
                    &descriptor.parallel_strategy,
                    merged,
                    &kernels,
                )
            })
            .collect();

        debug!(
            loop_order = ?descriptor.loop_order,
            parallel_strategy = ?descriptor.parallel_strategy,
            regions = descriptor.description.len(),
            threads = pool.threads(),
            "built execution graph"
        );

        Ok(Self {
            param,
            descriptor,
            kernels,
            pool,
            operations,
        })
    }

    /// Run the transposition: `out = alpha * permute(in) + beta * out`.
    ///
    /// With `beta == 0` the destination is only written, never read.
    pub fn exec(&mut self) {
        let ctx = ExecCtx::new(&self.kernels, self.param.alpha(), self.param.beta());
        let src = SendPtr(self.param.src_ptr() as *mut T);
        let dst = SendPtr(self.param.dst_ptr());
        let operations = &self.operations;
        let ctx = &ctx;
        self.pool.install(move || {
            for op in operations {
                // The views were validated against their buffers and the
                // regions cover every element exactly once.
                unsafe { op.run(src.as_const(), dst.as_ptr(), 1, ctx) };
            }
        });
    }

    /// Copy of the strategy this graph runs.
    pub fn get_descriptor(&self) -> Descriptor {
        self.descriptor.clone()
    }

    #[inline]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Worker threads of the graph's pool.
    #[inline]
    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    #[inline]
    pub fn params(&self) -> &TransposeParameters<'a, T> {
        &self.param
    }

    pub fn set_coef(&mut self, alpha: T::Real, beta: T::Real) {
        self.param.set_coef(alpha, beta);
    }

    pub fn set_alpha(&mut self, alpha: T::Real) {
        self.param.set_alpha(alpha);
    }

    pub fn set_beta(&mut self, beta: T::Real) {
        self.param.set_beta(beta);
    }

    /// The whole destination allocation.
    pub fn output(&self) -> &[T] {
        self.param.output().as_slice()
    }
}
