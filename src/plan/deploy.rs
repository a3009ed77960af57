//! Kernel deployment: splitting the index space into kernel regions.
//!
//! In the general case the input-leading dimension `a` and the
//! output-leading dimension `b` are each split into three tiers:
//!
//! ```text
//!   0 ........ F ........ H ........ n
//!   | full tiles | half tiles | remainder |
//! ```
//!
//! `F` is a multiple of the macro step `k*w` (`w` = full tile width,
//! `k <= 4` micro tiles), `H - F` a multiple of the half width. The regions
//! are Full (`a < Fa, b < Fb`), the Half L-shape, a Line along `b` for the
//! `a` remainder and a Line along `a` for the `b` remainder.

use tenperm_kernel::{KernelSet, KernelType, TransElement, MAX_MACRO_TILES};

use crate::descriptor::LoopParam;
use crate::param::MergedGeometry;

/// Elements per line kernel call along a shared leading dimension.
pub(crate) const LINE_BLOCK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tiers {
    full_step: usize,
    full_end: usize,
    half_step: usize,
    half_end: usize,
}

fn tiers(n: usize, full: Option<usize>, half: Option<usize>) -> Tiers {
    let Some(w) = full else {
        return Tiers {
            full_step: 1,
            full_end: 0,
            half_step: 1,
            half_end: 0,
        };
    };
    let full_step = (n / w).clamp(1, MAX_MACRO_TILES) * w;
    let full_end = n / full_step * full_step;
    let (half_step, half_end) = match half {
        Some(h) => (h, full_end + (n - full_end) / h * h),
        None => (1, full_end),
    };
    Tiers {
        full_step,
        full_end,
        half_step,
        half_end,
    }
}

/// Kernel regions covering the merged index space exactly once.
pub(crate) fn deploy_kernels<T: TransElement>(
    merged: &MergedGeometry,
    kernels: &KernelSet<T>,
) -> Vec<LoopParam> {
    let sizes = &merged.sizes;

    if merged.is_common_leading() {
        let ld = merged.in_ld;
        let n = sizes[ld];
        return vec![
            LoopParam::full_range(KernelType::Line, ld, sizes).with_dim(ld, 0, n, n.min(LINE_BLOCK))
        ];
    }

    let (a, b) = (merged.in_ld, merged.out_ld);
    let (na, nb) = (sizes[a], sizes[b]);

    let tiles = merged.has_unit_leading() && kernels.has(KernelType::Full);
    let full = tiles.then(|| kernels.full_width());
    let half = (tiles && kernels.has(KernelType::Half)).then(|| kernels.half_width());
    let ta = tiers(na, full, half);
    let tb = tiers(nb, full, half);

    let mut regions = Vec::with_capacity(5);

    if ta.full_end > 0 && tb.full_end > 0 {
        regions.push(
            LoopParam::full_range(KernelType::Full, a, sizes)
                .with_dim(a, 0, ta.full_end, ta.full_step)
                .with_dim(b, 0, tb.full_end, tb.full_step),
        );
    }
    if half.is_some() {
        regions.push(
            LoopParam::full_range(KernelType::Half, a, sizes)
                .with_dim(a, ta.full_end, ta.half_end, ta.half_step)
                .with_dim(b, 0, tb.half_end, tb.half_step),
        );
        regions.push(
            LoopParam::full_range(KernelType::Half, a, sizes)
                .with_dim(a, 0, ta.full_end, ta.half_step)
                .with_dim(b, tb.full_end, tb.half_end, tb.half_step),
        );
    }
    regions.push(
        LoopParam::full_range(KernelType::Line, b, sizes)
            .with_dim(a, ta.half_end, na, 1)
            .with_dim(b, 0, nb, nb),
    );
    if ta.half_end > 0 {
        regions.push(
            LoopParam::full_range(KernelType::Line, a, sizes)
                .with_dim(a, 0, ta.half_end, ta.half_end)
                .with_dim(b, tb.half_end, nb, 1),
        );
    }

    regions.retain(|r| !r.is_empty());
    regions
}

/// Loop iterations per dimension in the largest region; a dimension is never
/// split into more chunks than this.
pub(crate) fn available_parallelism(description: &[LoopParam], order: usize) -> Vec<usize> {
    match description.iter().max_by_key(|r| r.volume()) {
        Some(main) => (0..order).map(|d| main.iterations(d)).collect(),
        None => vec![1; order],
    }
}
