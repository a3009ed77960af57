//! Dimension merging for transposition.
//!
//! Works in input-dimension order on `(sizes, in_strides, out_strides)`
//! where `out_strides[d]` is the output stride of the position input
//! dimension `d` lands on.

use smallvec::SmallVec;

type SVec<T> = SmallVec<[T; 8]>;

type Split = (Vec<usize>, Vec<isize>, Vec<isize>);

/// Extent of one dimension with its stride on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Axis {
    size: usize,
    in_stride: isize,
    out_stride: isize,
}

impl Axis {
    /// `next` continues this axis in both tensors, so the two iterate as one.
    fn continued_by(&self, next: &Axis) -> bool {
        let span = self.size as isize;
        next.in_stride == self.in_stride * span && next.out_stride == self.out_stride * span
    }
}

fn axes(sizes: &[usize], in_strides: &[isize], out_strides: &[isize]) -> SVec<Axis> {
    sizes
        .iter()
        .zip(in_strides)
        .zip(out_strides)
        .map(|((&size, &in_stride), &out_stride)| Axis {
            size,
            in_stride,
            out_stride,
        })
        .collect()
}

fn split(axes: &[Axis]) -> Split {
    (
        axes.iter().map(|a| a.size).collect(),
        axes.iter().map(|a| a.in_stride).collect(),
        axes.iter().map(|a| a.out_stride).collect(),
    )
}

/// Remove extent-1 dimensions; they never move the address.
///
/// If every dimension has extent 1 a single dimension is kept so the loop
/// nest still has something to iterate over.
pub(crate) fn drop_unit_dims(sizes: &[usize], in_strides: &[isize], out_strides: &[isize]) -> Split {
    let all = axes(sizes, in_strides, out_strides);
    let kept: SVec<Axis> = all.iter().copied().filter(|a| a.size != 1).collect();
    match (kept.is_empty(), all.first()) {
        (true, Some(first)) => split(&[*first]),
        _ => split(&kept),
    }
}

/// Merge each dimension into its predecessor when it continues it on both
/// the input and the output side: `in_strides[i] == in_prev * size_prev`
/// and `out_strides[i] == out_prev * size_prev`.
pub(crate) fn fuse_dims_bilateral(
    sizes: &[usize],
    in_strides: &[isize],
    out_strides: &[isize],
) -> Split {
    let mut merged: SVec<Axis> = SmallVec::new();
    for axis in axes(sizes, in_strides, out_strides) {
        match merged.last_mut() {
            Some(last) if last.continued_by(&axis) => last.size *= axis.size,
            _ => merged.push(axis),
        }
    }
    split(&merged)
}

/// Rank of every dimension when sorted by ascending stride.
///
/// `rank[d] == 0` for the fastest-varying dimension.
pub(crate) fn stride_ranks(strides: &[isize]) -> Vec<usize> {
    let mut by_stride: SVec<usize> = (0..strides.len()).collect();
    by_stride.sort_by_key(|&d| strides[d].unsigned_abs());
    let mut rank = vec![0; strides.len()];
    for (r, &d) in by_stride.iter().enumerate() {
        rank[d] = r;
    }
    rank
}
