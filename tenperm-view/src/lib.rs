//! Non-owning strided tensor views for tenperm.
//!
//! A view describes a (possibly padded) sub-tensor of a dense buffer:
//! per-dimension inner sizes, outer sizes and offsets, from which the strides
//! are derived for either column-major or row-major storage.
//!
//! # Core Types
//!
//! - [`TensorShape`]: validated geometry (sizes, outer sizes, offsets, strides)
//! - [`TensorView`] / [`TensorViewMut`]: read-only / writable views over borrowed data
//! - [`TransError`]: every construction-time failure of the transpose API

pub mod shape;
pub mod view;

pub use shape::{col_major_strides, row_major_strides, Layout, TensorShape};
pub use view::{TensorView, TensorViewMut};

// ============================================================================
// Error types
// ============================================================================

/// Errors reported while building views, parameters, plans or graphs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransError {
    /// Transposition needs at least two dimensions.
    #[error("tensor order must be larger than 1, got {0}")]
    InvalidOrder(usize),

    /// A raw data pointer was null.
    #[error("null data pointer")]
    NullPointer,

    /// The permutation is not a bijection over `[0, order)`.
    #[error("invalid permutation {0:?}")]
    InvalidPermutation(Vec<usize>),

    /// A size, outer size or offset vector has the wrong length.
    #[error("size vector length mismatch: expected {expected}, got {found}")]
    SizeLengthMismatch { expected: usize, found: usize },

    /// A dimension has extent zero.
    #[error("zero size for dim {dim}")]
    ZeroSize { dim: usize },

    /// An outer size is smaller than the inner size.
    #[error("outer size {outer} smaller than size {size} for dim {dim}")]
    OuterSizeTooSmall { dim: usize, size: usize, outer: usize },

    /// Offset plus size runs past the outer size.
    #[error("offset {offset} + size {size} exceeds outer size {outer} for dim {dim}")]
    OffsetOutOfRange {
        dim: usize,
        offset: usize,
        size: usize,
        outer: usize,
    },

    /// The data buffer is shorter than the view's span.
    #[error("buffer too small: view spans {required} elements, buffer has {len}")]
    BufferTooSmall { required: usize, len: usize },

    /// Input and output views use different memory layouts.
    #[error("input and output layouts differ")]
    LayoutMismatch,

    /// Output sizes are not the permuted input sizes.
    #[error("output shape {found:?} does not match permuted input shape {expected:?}")]
    OutputShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A reused descriptor does not fit the merged geometry.
    #[error("descriptor does not match parameters: {0}")]
    DescriptorMismatch(String),

    /// Integer overflow while computing a span or stride.
    #[error("overflow while computing tensor span")]
    Overflow,

    /// A scratch buffer could not be allocated.
    #[error("failed to allocate {0} scratch elements")]
    Allocation(usize),

    /// The worker pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for tenperm operations.
pub type Result<T> = std::result::Result<T, TransError>;
