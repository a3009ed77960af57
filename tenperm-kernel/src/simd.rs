//! Runtime target-feature dispatch for kernel bodies.
//!
//! With the `simd` feature, kernel loops run inside `pulp::Arch::dispatch`
//! so the compiler may vectorize them for the detected CPU. Without it the
//! closures are called directly.

/// Shortest contiguous line that is worth a dispatch.
pub(crate) const DISPATCH_MIN_LEN: usize = 64;

#[inline(always)]
pub(crate) fn vectorized<R>(body: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        pulp::Arch::new().dispatch(body)
    }
    #[cfg(not(feature = "simd"))]
    {
        body()
    }
}

/// Like [`vectorized`], but only for lines of at least [`DISPATCH_MIN_LEN`]
/// elements.
#[inline(always)]
pub(crate) fn vectorized_line<R>(len: usize, body: impl FnOnce() -> R) -> R {
    if len < DISPATCH_MIN_LEN {
        body()
    } else {
        vectorized(body)
    }
}
