//! Plan optimizer: candidate generation, heuristic ranking and tuning.
//!
//! A candidate is a loop order combined with a parallel strategy over the
//! kernel regions produced by [`deploy`]. Candidates are ranked by
//!
//! ```text
//! cost = loop_order_cost + para_cost + fork_cost
//! ```
//!
//! with a stable sort, so the first-generated candidate wins ties. Depending
//! on the tuning budget, the top of that ranking is then re-ranked by
//! measured run time.

pub(crate) mod candidates;
pub(crate) mod deploy;
pub(crate) mod heuristic;
pub(crate) mod tune;

use std::time::Duration;

use tenperm_kernel::{KernelSet, TransElement};
use tenperm_view::Result;
use tracing::{debug, trace, warn};

use crate::config::{HeuristicConfig, TransOptions};
use crate::descriptor::{Descriptor, LoopParam};
use crate::graph::threading::WorkerPool;
use crate::param::TransposeParameters;
use candidates::{
    all_loop_orders, heuristic_loop_orders, para_strategies, rule_loop_order, MAX_PARA_STRATEGIES,
};
use deploy::{available_parallelism, deploy_kernels};
use heuristic::{fork_cost, loop_order_cost, para_cost};

/// Loop orders kept for combination in heuristic mode.
const LOOP_KEEP: usize = 8;
/// Parallel strategies kept for combination in heuristic mode.
const PARA_KEEP: usize = 8;

/// Produces ranked [`Descriptor`]s for one set of parameters.
pub struct PlanOptimizer<'p, 'a, T: TransElement> {
    param: &'p TransposeParameters<'a, T>,
    kernels: KernelSet<T>,
    pool: WorkerPool,
    tune_budget: isize,
    tune_repeats: usize,
    heuristics: HeuristicConfig,
}

impl<'p, 'a, T: TransElement> PlanOptimizer<'p, 'a, T> {
    /// Optimizer planning for `options.threads` threads.
    pub fn new(param: &'p TransposeParameters<'a, T>, options: &TransOptions) -> Result<Self> {
        Ok(Self::with_pool(param, options, WorkerPool::new(options.threads)?))
    }

    pub(crate) fn with_pool(
        param: &'p TransposeParameters<'a, T>,
        options: &TransOptions,
        pool: WorkerPool,
    ) -> Self {
        Self {
            param,
            kernels: options.caps.kernels::<T>(),
            pool,
            tune_budget: options.tune_budget,
            tune_repeats: options.tune_repeats,
            heuristics: options.heuristics.clone(),
        }
    }

    /// Thread budget the candidates are planned for.
    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    /// Kernel regions shared by every candidate.
    pub fn description(&self) -> Vec<LoopParam> {
        deploy_kernels(self.param.merged(), &self.kernels)
    }

    /// Stride-rule loop order without any parallel split.
    pub fn default_descriptor(&self) -> Descriptor {
        let merged = self.param.merged();
        Descriptor::new(
            rule_loop_order(merged),
            vec![1; merged.order()],
            self.description(),
        )
    }

    /// Every candidate considered under the current tuning budget, ranked by
    /// heuristic cost (best first).
    pub fn heuristic_candidates(&self) -> Vec<Descriptor> {
        let merged = self.param.merged();
        let cfg = &self.heuristics;
        let threads = self.threads();
        let description = self.description();
        let avail = available_parallelism(&description, merged.order());
        let exhaustive = self.tune_budget < 0;

        let orders = if exhaustive {
            all_loop_orders(merged)
        } else {
            heuristic_loop_orders(merged)
        };
        let mut loops: Vec<(Vec<usize>, f64)> = orders
            .into_iter()
            .map(|o| {
                let c = loop_order_cost(&o, merged, cfg);
                (o, c)
            })
            .collect();
        loops.sort_by(|x, y| x.1.total_cmp(&y.1));

        let mut paras: Vec<(Vec<usize>, f64)> =
            para_strategies(threads, &avail, MAX_PARA_STRATEGIES)
                .into_iter()
                .map(|p| {
                    let c = para_cost(&p, &avail, merged, threads, cfg);
                    (p, c)
                })
                .collect();
        paras.sort_by(|x, y| x.1.total_cmp(&y.1));

        if !exhaustive {
            loops.truncate(LOOP_KEEP);
            paras.truncate(PARA_KEEP);
        }

        let mut ranked: Vec<(Descriptor, f64)> = Vec::with_capacity(loops.len() * paras.len());
        for (order, lc) in &loops {
            for (strategy, pc) in &paras {
                let cost = lc + pc + fork_cost(order, strategy, &avail, cfg);
                trace!(loop_order = ?order, parallel_strategy = ?strategy, cost, "candidate");
                ranked.push((
                    Descriptor::new(order.clone(), strategy.clone(), description.clone()),
                    cost,
                ));
            }
        }
        ranked.sort_by(|x, y| x.1.total_cmp(&y.1));

        debug!(
            loop_orders = loops.len(),
            parallel_strategies = paras.len(),
            candidates = ranked.len(),
            threads,
            "ranked candidates"
        );
        ranked.into_iter().map(|(d, _)| d).collect()
    }

    /// Ranked descriptors, best first.
    ///
    /// - `tune_budget == 0`: the heuristic best only
    /// - `tune_budget > 0`: the top `N` heuristic candidates, re-ranked by
    ///   measured time
    /// - `tune_budget < 0`: every candidate, ranked by measured time
    ///
    /// If measuring fails, the heuristic ranking is returned.
    pub fn get_optimal(&self) -> Vec<Descriptor> {
        let mut ranked = self.heuristic_candidates();
        if ranked.is_empty() {
            ranked.push(self.default_descriptor());
        }

        let keep = match self.tune_budget {
            0 => 1,
            n if n > 0 => n as usize,
            _ => ranked.len(),
        };
        ranked.truncate(keep);
        if self.tune_budget == 0 || ranked.len() == 1 {
            return ranked;
        }

        let measured = tune::measure(
            self.param,
            &ranked,
            self.kernels,
            &self.pool,
            self.tune_repeats,
        );
        rank_by_time(ranked, measured)
    }
}

/// Re-rank heuristic candidates by measured time, keeping the heuristic
/// ranking when measuring failed.
fn rank_by_time(ranked: Vec<Descriptor>, measured: Result<Vec<Duration>>) -> Vec<Descriptor> {
    match measured {
        Ok(times) => {
            let mut timed: Vec<(Descriptor, Duration)> = ranked.into_iter().zip(times).collect();
            // stable: equal times keep heuristic rank
            timed.sort_by_key(|(_, t)| *t);
            debug!(
                measured = timed.len(),
                best_micros = timed.first().map_or(0.0, |(_, t)| t.as_secs_f64() * 1e6),
                "tuned candidates"
            );
            timed.into_iter().map(|(d, _)| d).collect()
        }
        Err(err) => {
            warn!(%err, "tuning failed, using heuristic ranking");
            ranked
        }
    }
}
