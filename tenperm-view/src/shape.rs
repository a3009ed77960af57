//! Validated sub-tensor geometry.

use crate::{Result, TransError};

/// Storage order of a dense tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// First index varies fastest.
    #[default]
    ColMajor,
    /// Last index varies fastest.
    RowMajor,
}

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1] as isize;
    }
    strides
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1] as isize;
    }
    strides
}

/// Geometry of a sub-tensor inside a padded dense buffer.
///
/// `sizes[d]` elements are addressed along dimension `d`, starting at
/// `offsets[d]` inside an allocation of extent `outer_sizes[d]`. Strides are
/// derived from the outer sizes and the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
    sizes: Vec<usize>,
    outer_sizes: Vec<usize>,
    offsets: Vec<usize>,
    strides: Vec<isize>,
    layout: Layout,
}

impl TensorShape {
    /// Fully contiguous tensor: outer sizes equal sizes, zero offsets.
    pub fn new(sizes: &[usize], layout: Layout) -> Result<Self> {
        Self::with_outer(sizes, sizes, &vec![0; sizes.len()], layout)
    }

    /// Sub-tensor of a larger allocation.
    ///
    /// An empty `outer_sizes` slice means "same as `sizes`"; an empty
    /// `offsets` slice means all zeros.
    pub fn with_outer(
        sizes: &[usize],
        outer_sizes: &[usize],
        offsets: &[usize],
        layout: Layout,
    ) -> Result<Self> {
        let order = sizes.len();
        let outer_sizes = if outer_sizes.is_empty() {
            sizes
        } else {
            outer_sizes
        };
        let zeros;
        let offsets = if offsets.is_empty() {
            zeros = vec![0usize; order];
            &zeros[..]
        } else {
            offsets
        };
        for found in [outer_sizes.len(), offsets.len()] {
            if found != order {
                return Err(TransError::SizeLengthMismatch {
                    expected: order,
                    found,
                });
            }
        }

        for dim in 0..order {
            let (size, outer, offset) = (sizes[dim], outer_sizes[dim], offsets[dim]);
            if size == 0 || outer == 0 {
                return Err(TransError::ZeroSize { dim });
            }
            if outer < size {
                return Err(TransError::OuterSizeTooSmall { dim, size, outer });
            }
            if offset.checked_add(size).map_or(true, |end| end > outer) {
                return Err(TransError::OffsetOutOfRange {
                    dim,
                    offset,
                    size,
                    outer,
                });
            }
        }

        // Span must fit in isize for pointer arithmetic.
        outer_sizes
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .filter(|&span| span <= isize::MAX as usize)
            .ok_or(TransError::Overflow)?;

        let strides = match layout {
            Layout::ColMajor => col_major_strides(outer_sizes),
            Layout::RowMajor => row_major_strides(outer_sizes),
        };

        Ok(Self {
            sizes: sizes.to_vec(),
            outer_sizes: outer_sizes.to_vec(),
            offsets: offsets.to_vec(),
            strides,
            layout,
        })
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    #[inline]
    pub fn outer_sizes(&self) -> &[usize] {
        &self.outer_sizes
    }

    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Number of addressed elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements in the enclosing allocation.
    #[inline]
    pub fn span(&self) -> usize {
        self.outer_sizes.iter().product()
    }

    /// Element offset of the sub-tensor's first element.
    pub fn base_offset(&self) -> isize {
        self.offsets
            .iter()
            .zip(self.strides.iter())
            .map(|(&o, &s)| o as isize * s)
            .sum()
    }

    /// Element offset of a multi-index relative to the allocation start.
    pub fn offset_of(&self, indices: &[usize]) -> isize {
        assert_eq!(indices.len(), self.order());
        let mut idx = self.base_offset();
        for (d, &i) in indices.iter().enumerate() {
            assert!(i < self.sizes[d]);
            idx += i as isize * self.strides[d];
        }
        idx
    }
}
