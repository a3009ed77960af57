//! Planner configuration.

use tenperm_kernel::KernelCaps;

/// Cost-model constants of the planner heuristics.
///
/// Lower cost is better. The loop-order terms weight how far a dimension
/// sits from its natural (stride-sorted) position; the parallel terms
/// penalize splitting dimensions that feed the kernels and leaving threads
/// idle.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicConfig {
    /// Penalty for being one position away from the natural position.
    pub penalty_begin: f64,
    /// Extra penalty per additional position.
    pub penalty_step: f64,
    /// Weight of the innermost loop level.
    pub importance_begin: f64,
    /// Per-level decay of the weight towards outer loops.
    pub importance_scale: f64,
    pub input_penalty_factor: f64,
    pub output_penalty_factor: f64,
    /// Award for keeping the input-leading dimension inner.
    pub in_ld_award: f64,
    /// Award for keeping the output-leading dimension inner.
    pub out_ld_award: f64,

    /// Base cost of any split dimension.
    pub para_cost_begin: f64,
    pub para_common_leading_factor: f64,
    pub para_in_ld_factor: f64,
    pub para_out_ld_factor: f64,
    pub para_other_factor: f64,
    /// Thread counts above this are not penalized further.
    pub max_penalty_threads: usize,
    /// Weight of the per-dimension load-imbalance fraction.
    pub imbalance_weight: f64,
    /// Penalty for leaving the whole thread budget idle.
    pub idle_penalty: f64,
    /// Weight of fork-join overhead for parallel regions nested inside
    /// sequential loops.
    pub fork_weight: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            penalty_begin: 1.0,
            penalty_step: 0.5,
            importance_begin: 1.0,
            importance_scale: 0.5,
            input_penalty_factor: 2.0,
            output_penalty_factor: 1.5,
            in_ld_award: 2.0,
            out_ld_award: 1.0,

            para_cost_begin: 0.05,
            para_common_leading_factor: 0.4,
            para_in_ld_factor: 0.2,
            para_out_ld_factor: 0.15,
            para_other_factor: 0.01,
            max_penalty_threads: 8,
            imbalance_weight: 2.0,
            idle_penalty: 4.0,
            fork_weight: 0.05,
        }
    }
}

/// Options for building an execution graph.
///
/// ```
/// use tenperm::TransOptions;
///
/// let opts = TransOptions::default().with_threads(4).with_tune_budget(0);
/// assert_eq!(opts.threads, 4);
/// ```
#[derive(Debug, Clone)]
pub struct TransOptions {
    /// Worker threads; 0 uses rayon's default (`RAYON_NUM_THREADS` or the
    /// number of cores).
    pub threads: usize,
    /// Candidates to benchmark: `< 0` all, `0` none (heuristic only),
    /// `> 0` the top `N` heuristic candidates.
    pub tune_budget: isize,
    /// Timed runs per benchmarked candidate; the best run counts.
    pub tune_repeats: usize,
    pub heuristics: HeuristicConfig,
    pub caps: KernelCaps,
}

impl Default for TransOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            tune_budget: 0,
            tune_repeats: 3,
            heuristics: HeuristicConfig::default(),
            caps: KernelCaps::detect(),
        }
    }
}

impl TransOptions {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_tune_budget(mut self, budget: isize) -> Self {
        self.tune_budget = budget;
        self
    }

    pub fn with_tune_repeats(mut self, repeats: usize) -> Self {
        self.tune_repeats = repeats.max(1);
        self
    }

    pub fn with_heuristics(mut self, heuristics: HeuristicConfig) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn with_caps(mut self, caps: KernelCaps) -> Self {
        self.caps = caps;
        self
    }
}
