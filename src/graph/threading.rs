//! Worker pool and chunking for parallel loop nodes.

#[cfg(feature = "parallel")]
use std::sync::Arc;

use tenperm_view::Result;
#[cfg(feature = "parallel")]
use tenperm_view::TransError;

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to data outlives the parallel
/// region and that different threads write to disjoint elements.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub(crate) fn as_ptr(self) -> *mut T {
        self.0
    }

    pub(crate) fn as_const(self) -> *const T {
        self.0 as *const T
    }
}

/// Thread pool an execution graph runs in.
#[derive(Clone)]
pub(crate) struct WorkerPool {
    threads: usize,
    #[cfg(feature = "parallel")]
    pool: Arc<rayon::ThreadPool>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

impl WorkerPool {
    /// Pool with `requested` threads; 0 picks rayon's default.
    pub(crate) fn new(requested: usize) -> Result<Self> {
        #[cfg(feature = "parallel")]
        {
            let threads = if requested == 0 {
                rayon::current_num_threads()
            } else {
                requested
            };
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("tenperm-{i}"))
                .build()
                .map_err(|e| TransError::ThreadPool(e.to_string()))?;
            Ok(Self {
                threads,
                pool: Arc::new(pool),
            })
        }
        #[cfg(not(feature = "parallel"))]
        {
            let _ = requested;
            Ok(Self { threads: 1 })
        }
    }

    #[inline]
    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` with this pool as the current rayon pool.
    pub(crate) fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        #[cfg(feature = "parallel")]
        {
            self.pool.install(f)
        }
        #[cfg(not(feature = "parallel"))]
        {
            f()
        }
    }
}

/// Split `[begin, end)` walked in steps of `step` into at most `parts`
/// contiguous chunks whose starts are step-aligned.
///
/// Chunk sizes differ by at most one iteration.
pub(crate) fn partition(begin: usize, end: usize, step: usize, parts: usize) -> Vec<(usize, usize)> {
    let iters = (end - begin).div_ceil(step);
    let parts = parts.clamp(1, iters.max(1));
    let base = iters / parts;
    let extra = iters % parts;

    let mut chunks = Vec::with_capacity(parts);
    let mut it = 0;
    for p in 0..parts {
        let count = base + usize::from(p < extra);
        let lo = begin + it * step;
        let hi = (begin + (it + count) * step).min(end);
        chunks.push((lo, hi));
        it += count;
    }
    chunks
}

/// Call `f(lo, hi)` for every chunk, in parallel when the `parallel`
/// feature is enabled.
pub(crate) fn for_each_chunk<F>(chunks: &[(usize, usize)], f: F)
where
    F: Fn(usize, usize) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        chunks.par_iter().for_each(|&(lo, hi)| f(lo, hi));
    }
    #[cfg(not(feature = "parallel"))]
    {
        chunks.iter().for_each(|&(lo, hi)| f(lo, hi));
    }
}
