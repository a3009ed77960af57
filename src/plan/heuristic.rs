//! Heuristic cost model for loop orders and parallel strategies.

use crate::config::HeuristicConfig;
use crate::fuse::stride_ranks;
use crate::param::MergedGeometry;

#[inline]
fn position_penalty(distance: usize, cfg: &HeuristicConfig) -> f64 {
    if distance == 0 {
        0.0
    } else {
        cfg.penalty_begin + cfg.penalty_step * (distance - 1) as f64
    }
}

/// Cost of a loop order (outermost first).
///
/// Every dimension is compared with its natural position on the input and
/// the output side, i.e. its rank by stride, with rank 0 innermost.
pub(crate) fn loop_order_cost(
    loop_order: &[usize],
    merged: &MergedGeometry,
    cfg: &HeuristicConfig,
) -> f64 {
    let in_rank = stride_ranks(&merged.in_strides);
    let out_rank = stride_ranks(&merged.out_strides);
    let n = loop_order.len();

    let mut cost = 0.0;
    for (level, &d) in loop_order.iter().enumerate() {
        let pos = n - 1 - level;
        let importance = cfg.importance_begin * cfg.importance_scale.powi(pos as i32);
        let mut c = importance
            * (position_penalty(in_rank[d].abs_diff(pos), cfg)
                + position_penalty(out_rank[d].abs_diff(pos), cfg));
        if d == merged.in_ld {
            c = c * cfg.input_penalty_factor - cfg.in_ld_award / (1 + pos) as f64;
        }
        if d == merged.out_ld {
            c = c * cfg.output_penalty_factor - cfg.out_ld_award / (1 + pos) as f64;
        }
        cost += c;
    }
    cost
}

/// Cost of a parallel strategy given the loop iterations available per
/// dimension.
pub(crate) fn para_cost(
    strategy: &[usize],
    avail: &[usize],
    merged: &MergedGeometry,
    threads: usize,
    cfg: &HeuristicConfig,
) -> f64 {
    let mut cost = 0.0;
    let mut used = 1usize;
    for (d, &t) in strategy.iter().enumerate() {
        if t <= 1 {
            continue;
        }
        used *= t;
        let factor = if merged.is_common_leading() && d == merged.in_ld {
            cfg.para_common_leading_factor
        } else if d == merged.in_ld {
            cfg.para_in_ld_factor
        } else if d == merged.out_ld {
            cfg.para_out_ld_factor
        } else {
            cfg.para_other_factor
        };
        cost += cfg.para_cost_begin + factor * t.min(cfg.max_penalty_threads) as f64;

        let n = avail[d].max(1);
        let padded = n.div_ceil(t) * t;
        cost += cfg.imbalance_weight * (padded - n) as f64 / n as f64;
    }
    let threads = threads.max(1);
    cost += cfg.idle_penalty * threads.saturating_sub(used) as f64 / threads as f64;
    cost
}

/// Fork-join overhead: a split dimension forks once per iteration of the
/// sequential loops around it.
pub(crate) fn fork_cost(
    loop_order: &[usize],
    strategy: &[usize],
    avail: &[usize],
    cfg: &HeuristicConfig,
) -> f64 {
    let mut outer = 1usize;
    let mut cost = 0.0;
    for &d in loop_order {
        if strategy[d] > 1 {
            cost += cfg.fork_weight * (outer as f64).log2();
        }
        outer = outer.saturating_mul(avail[d].max(1));
    }
    cost
}
