//! Empirical ranking of candidate descriptors.
//!
//! Every candidate is compiled into a throw-away graph over private scratch
//! buffers with the caller's geometry, so tuning never touches the caller's
//! destination.

use std::time::{Duration, Instant};

use tenperm_kernel::{KernelSet, TransElement};
use tenperm_view::{Result, TransError};
use tracing::trace;

use crate::descriptor::Descriptor;
use crate::graph::threading::WorkerPool;
use crate::graph::ExecutionGraph;
use crate::param::TransposeParameters;

/// Throughput in GB/s for `bytes` moved in `elapsed`.
pub fn calc_throughput(bytes: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / secs / 1e9
}

fn scratch<T: TransElement>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| TransError::Allocation(len))?;
    buf.resize(len, T::default());
    Ok(buf)
}

/// Best-of-`repeats` wall time of every candidate, in candidate order.
pub(crate) fn measure<T: TransElement>(
    param: &TransposeParameters<'_, T>,
    candidates: &[Descriptor],
    kernels: KernelSet<T>,
    pool: &WorkerPool,
    repeats: usize,
) -> Result<Vec<Duration>> {
    let src = scratch::<T>(param.input().shape().span())?;
    let mut dst = scratch::<T>(param.output().shape().span())?;
    let bytes = param.bytes_moved();

    let mut times = Vec::with_capacity(candidates.len());
    for (idx, desc) in candidates.iter().enumerate() {
        let local = param.rebind(&src, &mut dst)?;
        let mut graph = ExecutionGraph::build(local, desc.clone(), kernels, pool.clone())?;

        // warm-up
        graph.exec();
        let mut best = Duration::MAX;
        for _ in 0..repeats.max(1) {
            let start = Instant::now();
            graph.exec();
            best = best.min(start.elapsed());
        }

        trace!(
            candidate = idx,
            loop_order = ?desc.loop_order,
            parallel_strategy = ?desc.parallel_strategy,
            micros = best.as_secs_f64() * 1e6,
            gbps = calc_throughput(bytes, best),
            "measured candidate"
        );
        times.push(best);
    }
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::deploy::deploy_kernels;
    use tenperm_kernel::{Isa, KernelCaps};
    use tenperm_view::{TensorView, TensorViewMut};

    #[test]
    fn test_calc_throughput() {
        let gbps = calc_throughput(2_000_000_000, Duration::from_secs(2));
        assert!((gbps - 1.0).abs() < 1e-12);
        assert_eq!(calc_throughput(10, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_scratch_reports_allocation_failure() {
        let len = usize::MAX / 4;
        assert!(matches!(scratch::<f64>(len), Err(TransError::Allocation(n)) if n == len));
        assert_eq!(scratch::<f32>(3).unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_measure_leaves_destination_untouched() {
        let a: Vec<f64> = (0..64).map(|i| i as f64).collect();
        let mut b = vec![-1.0f64; 64];
        let param = TransposeParameters::new(
            TensorView::new(&a, &[8, 8]).unwrap(),
            TensorViewMut::new(&mut b, &[8, 8]).unwrap(),
            &[1, 0],
            1.0,
            0.0,
        )
        .unwrap();
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let description = deploy_kernels(param.merged(), &kernels);
        let candidates = vec![
            Descriptor::new(vec![1, 0], vec![1, 1], description.clone()),
            Descriptor::new(vec![0, 1], vec![1, 1], description),
        ];
        let pool = WorkerPool::new(1).unwrap();
        let times = measure(&param, &candidates, kernels, &pool, 2).unwrap();
        assert_eq!(times.len(), 2);
        assert!(param.output().as_slice().iter().all(|&x| x == -1.0));
    }
}
