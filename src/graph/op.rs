//! Operation tree: nested loops, parallel splits and kernel leaves.

use tenperm_kernel::{KernelSet, KernelType, LineFn, MacroFn, TransElement};

use super::threading::{for_each_chunk, partition, SendPtr};
use crate::descriptor::LoopParam;
use crate::param::MergedGeometry;

/// Kernel call at the bottom of a loop nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KernelOp {
    /// Macro tile over both leading dimensions.
    Tile {
        kind: KernelType,
        tiles_a: usize,
        tiles_b: usize,
        lda: isize,
        ldb: isize,
    },
    /// Run along one dimension; its length comes from the enclosing loop.
    Line { src_stride: isize, dst_stride: isize },
}

/// One node of the operation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OpNode {
    Loop {
        begin: usize,
        end: usize,
        step: usize,
        in_stride: isize,
        out_stride: isize,
        /// This loop walks the line dimension and fixes the kernel extent.
        sets_extent: bool,
        body: Box<OpNode>,
    },
    Parallel {
        chunks: Vec<(usize, usize)>,
        step: usize,
        in_stride: isize,
        out_stride: isize,
        sets_extent: bool,
        body: Box<OpNode>,
    },
    Kernel(KernelOp),
}

/// Kernels and coefficients of one `exec` call.
pub(crate) struct ExecCtx<T: TransElement> {
    full: Option<MacroFn<T>>,
    half: Option<MacroFn<T>>,
    line: LineFn<T>,
    alpha: T::Real,
    beta: T::Real,
}

impl<T: TransElement> ExecCtx<T> {
    /// Picks the overwrite variants when `beta == 0`, so the destination is
    /// never read.
    pub(crate) fn new(kernels: &KernelSet<T>, alpha: T::Real, beta: T::Real) -> Self {
        let update = beta != <T::Real as num_traits::Zero>::zero();
        Self {
            full: kernels.macro_fn(KernelType::Full, update),
            half: kernels.macro_fn(KernelType::Half, update),
            line: kernels.line_fn(update),
            alpha,
            beta,
        }
    }
}

/// Build the loop nest of one region, outermost loop first.
pub(crate) fn build_region<T: TransElement>(
    region: &LoopParam,
    loop_order: &[usize],
    strategy: &[usize],
    merged: &MergedGeometry,
    kernels: &KernelSet<T>,
) -> OpNode {
    let leaf = match region.kernel {
        KernelType::Line => KernelOp::Line {
            src_stride: merged.in_strides[region.line_dim],
            dst_stride: merged.out_strides[region.line_dim],
        },
        kind => {
            let w = kernels.width(kind);
            KernelOp::Tile {
                kind,
                tiles_a: region.step[merged.in_ld] / w,
                tiles_b: region.step[merged.out_ld] / w,
                lda: merged.in_strides[merged.out_ld],
                ldb: merged.out_strides[merged.in_ld],
            }
        }
    };

    let mut node = OpNode::Kernel(leaf);
    for &d in loop_order.iter().rev() {
        let (begin, end, step) = (region.begin[d], region.end[d], region.step[d]);
        let sets_extent = region.kernel == KernelType::Line && d == region.line_dim;
        let in_stride = merged.in_strides[d];
        let out_stride = merged.out_strides[d];
        let threads = strategy[d].max(1);
        let body = Box::new(node);

        node = if threads > 1 && region.iterations(d) > 1 {
            OpNode::Parallel {
                chunks: partition(begin, end, step, threads),
                step,
                in_stride,
                out_stride,
                sets_extent,
                body,
            }
        } else {
            OpNode::Loop {
                begin,
                end,
                step,
                in_stride,
                out_stride,
                sets_extent,
                body,
            }
        };
    }
    node
}

impl OpNode {
    /// Execute the subtree rooted here.
    ///
    /// # Safety
    /// `src`/`dst` must address the region origin of tensors valid for the
    /// whole merged geometry; parallel chunks write disjoint elements.
    pub(crate) unsafe fn run<T: TransElement>(
        &self,
        src: *const T,
        dst: *mut T,
        extent: usize,
        ctx: &ExecCtx<T>,
    ) {
        match self {
            OpNode::Loop {
                begin,
                end,
                step,
                in_stride,
                out_stride,
                sets_extent,
                body,
            } => {
                let mut i = *begin;
                while i < *end {
                    let ext = if *sets_extent {
                        (*step).min(*end - i)
                    } else {
                        extent
                    };
                    body.run(
                        src.offset(i as isize * in_stride),
                        dst.offset(i as isize * out_stride),
                        ext,
                        ctx,
                    );
                    i += step;
                }
            }
            OpNode::Parallel {
                chunks,
                step,
                in_stride,
                out_stride,
                sets_extent,
                body,
            } => {
                let s = SendPtr(src as *mut T);
                let d = SendPtr(dst);
                let (step, in_stride, out_stride, sets_extent) =
                    (*step, *in_stride, *out_stride, *sets_extent);
                for_each_chunk(chunks, |lo, hi| {
                    let mut i = lo;
                    while i < hi {
                        let ext = if sets_extent { step.min(hi - i) } else { extent };
                        unsafe {
                            body.run(
                                s.as_const().offset(i as isize * in_stride),
                                d.as_ptr().offset(i as isize * out_stride),
                                ext,
                                ctx,
                            );
                        }
                        i += step;
                    }
                });
            }
            OpNode::Kernel(KernelOp::Tile {
                kind,
                tiles_a,
                tiles_b,
                lda,
                ldb,
            }) => {
                let f = match kind {
                    KernelType::Full => ctx.full,
                    KernelType::Half => ctx.half,
                    KernelType::Line => None,
                };
                match f {
                    Some(f) => f(src, *lda, dst, *ldb, *tiles_a, *tiles_b, ctx.alpha, ctx.beta),
                    None => unreachable!("{kind:?} kernel checked at build time"),
                }
            }
            OpNode::Kernel(KernelOp::Line {
                src_stride,
                dst_stride,
            }) => (ctx.line)(
                src,
                *src_stride,
                dst,
                *dst_stride,
                extent,
                ctx.alpha,
                ctx.beta,
            ),
        }
    }

    /// Depth of the nest below and including this node.
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        match self {
            OpNode::Loop { body, .. } | OpNode::Parallel { body, .. } => 1 + body.depth(),
            OpNode::Kernel(_) => 1,
        }
    }
}
