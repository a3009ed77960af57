//! Transpose parameters: validated input/output binding plus merged geometry.
//!
//! Construction normalizes everything to column-major, drops extent-1
//! dimensions, fuses dimensions that are contiguous on both sides and
//! classifies the result as common-leading or general.

use tenperm_kernel::TransElement;
use tenperm_view::{Layout, Result, TensorView, TensorViewMut, TransError};
use tracing::debug;

use crate::fuse::{drop_unit_dims, fuse_dims_bilateral};

/// Geometry after dimension merging, in merged input-dimension order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGeometry {
    /// Extent of every merged dimension.
    pub sizes: Vec<usize>,
    /// Input stride of every merged dimension.
    pub in_strides: Vec<isize>,
    /// Output stride of every merged dimension.
    pub out_strides: Vec<isize>,
    /// `perm[k]` is the merged dimension at merged output position `k`.
    pub perm: Vec<usize>,
    /// Merged dimension with the smallest input stride.
    pub in_ld: usize,
    /// Merged dimension with the smallest output stride.
    pub out_ld: usize,
}

impl MergedGeometry {
    /// Merge `(sizes, in_strides, out_strides)` given in input-dimension
    /// order, where `out_strides[d]` is the output stride of the position
    /// input dimension `d` lands on.
    pub fn new(sizes: &[usize], in_strides: &[isize], out_strides: &[isize]) -> Self {
        let (sizes, in_strides, out_strides) = drop_unit_dims(sizes, in_strides, out_strides);
        let (sizes, in_strides, out_strides) =
            fuse_dims_bilateral(&sizes, &in_strides, &out_strides);

        let mut perm: Vec<usize> = (0..sizes.len()).collect();
        perm.sort_by_key(|&d| out_strides[d].unsigned_abs());

        let in_ld = (0..sizes.len())
            .min_by_key(|&d| in_strides[d].unsigned_abs())
            .unwrap_or(0);
        let out_ld = perm[0];

        Self {
            sizes,
            in_strides,
            out_strides,
            perm,
            in_ld,
            out_ld,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_common_leading(&self) -> bool {
        self.in_ld == self.out_ld
    }

    /// Both leading dimensions have unit stride, so tile kernels apply.
    pub fn has_unit_leading(&self) -> bool {
        self.in_strides[self.in_ld] == 1 && self.out_strides[self.out_ld] == 1
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.sizes.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Input, output, permutation and coefficients of one transposition.
///
/// Computes `out[perm(i)] = alpha * in[i] + beta * out[perm(i)]` where
/// output dimension `k` is input dimension `perm[k]`.
pub struct TransposeParameters<'a, T: TransElement> {
    input: TensorView<'a, T>,
    output: TensorViewMut<'a, T>,
    perm: Vec<usize>,
    alpha: T::Real,
    beta: T::Real,
    merged: MergedGeometry,
}

impl<T: TransElement> std::fmt::Debug for TransposeParameters<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransposeParameters")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("perm", &self.perm)
            .field("alpha", &self.alpha)
            .field("beta", &self.beta)
            .field("merged", &self.merged)
            .finish()
    }
}

/// Check that `perm` is a bijection over `[0, order)`.
pub(crate) fn validate_perm(perm: &[usize], order: usize) -> Result<()> {
    if perm.len() != order {
        return Err(TransError::InvalidPermutation(perm.to_vec()));
    }
    let mut seen = vec![false; order];
    for &p in perm {
        if p >= order || seen[p] {
            return Err(TransError::InvalidPermutation(perm.to_vec()));
        }
        seen[p] = true;
    }
    Ok(())
}

impl<'a, T: TransElement> TransposeParameters<'a, T> {
    /// Bind views, permutation and coefficients.
    pub fn new(
        input: TensorView<'a, T>,
        output: TensorViewMut<'a, T>,
        perm: &[usize],
        alpha: T::Real,
        beta: T::Real,
    ) -> Result<Self> {
        let order = input.order();
        if order <= 1 {
            return Err(TransError::InvalidOrder(order));
        }
        if output.order() != order {
            return Err(TransError::SizeLengthMismatch {
                expected: order,
                found: output.order(),
            });
        }
        if input.shape().layout() != output.shape().layout() {
            return Err(TransError::LayoutMismatch);
        }
        validate_perm(perm, order)?;

        let in_sizes = input.shape().sizes();
        let expected: Vec<usize> = perm.iter().map(|&p| in_sizes[p]).collect();
        if expected != output.shape().sizes() {
            return Err(TransError::OutputShapeMismatch {
                expected,
                found: output.shape().sizes().to_vec(),
            });
        }

        let merged = merge_geometry(&input, &output, perm);
        debug!(
            order,
            merged_order = merged.order(),
            sizes = ?merged.sizes,
            perm = ?merged.perm,
            common_leading = merged.is_common_leading(),
            "merged transpose geometry"
        );

        Ok(Self {
            input,
            output,
            perm: perm.to_vec(),
            alpha,
            beta,
            merged,
        })
    }

    /// Same geometry and coefficients bound to other buffers of equal span.
    ///
    /// The new buffers are addressed with the original outer sizes and
    /// offsets.
    pub(crate) fn rebind<'s>(
        &self,
        input: &'s [T],
        output: &'s mut [T],
    ) -> Result<TransposeParameters<'s, T>> {
        Ok(TransposeParameters {
            input: TensorView::with_shape(input, self.input.shape().clone())?,
            output: TensorViewMut::with_shape(output, self.output.shape().clone())?,
            perm: self.perm.clone(),
            alpha: self.alpha,
            beta: self.beta,
            merged: self.merged.clone(),
        })
    }

    /// Original tensor order.
    #[inline]
    pub fn order(&self) -> usize {
        self.perm.len()
    }

    #[inline]
    pub fn merged_order(&self) -> usize {
        self.merged.order()
    }

    #[inline]
    pub fn merged(&self) -> &MergedGeometry {
        &self.merged
    }

    #[inline]
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    #[inline]
    pub fn is_common_leading(&self) -> bool {
        self.merged.is_common_leading()
    }

    /// Input stride along the output-leading dimension.
    pub fn input_stride(&self) -> isize {
        self.merged.in_strides[self.merged.out_ld]
    }

    /// Output stride along the input-leading dimension.
    pub fn output_stride(&self) -> isize {
        self.merged.out_strides[self.merged.in_ld]
    }

    #[inline]
    pub fn alpha(&self) -> T::Real {
        self.alpha
    }

    #[inline]
    pub fn beta(&self) -> T::Real {
        self.beta
    }

    pub fn set_alpha(&mut self, alpha: T::Real) {
        self.alpha = alpha;
    }

    pub fn set_beta(&mut self, beta: T::Real) {
        self.beta = beta;
    }

    pub fn set_coef(&mut self, alpha: T::Real, beta: T::Real) {
        self.alpha = alpha;
        self.beta = beta;
    }

    #[inline]
    pub fn input(&self) -> &TensorView<'a, T> {
        &self.input
    }

    #[inline]
    pub fn output(&self) -> &TensorViewMut<'a, T> {
        &self.output
    }

    /// Bytes read and written by one transposition.
    pub fn bytes_moved(&self) -> usize {
        let reads = if self.beta == <T::Real as num_traits::Zero>::zero() {
            1
        } else {
            2
        };
        (reads + 1) * self.merged.len() * T::KIND.size()
    }

    pub(crate) fn src_ptr(&self) -> *const T {
        self.input.base_ptr()
    }

    pub(crate) fn dst_ptr(&mut self) -> *mut T {
        self.output.base_ptr()
    }
}

/// Column-major normalization followed by merging.
fn merge_geometry<T>(
    input: &TensorView<'_, T>,
    output: &TensorViewMut<'_, T>,
    perm: &[usize],
) -> MergedGeometry {
    let order = perm.len();
    let in_shape = input.shape();
    let out_shape = output.shape();

    let (sizes, in_strides, out_strides_by_pos, perm): (Vec<usize>, Vec<isize>, Vec<isize>, Vec<usize>) =
        match in_shape.layout() {
            Layout::ColMajor => (
                in_shape.sizes().to_vec(),
                in_shape.strides().to_vec(),
                out_shape.strides().to_vec(),
                perm.to_vec(),
            ),
            // Reversing the dimensions turns row-major into column-major;
            // output position k' = N-1-k holds input dimension N-1-perm[k].
            Layout::RowMajor => (
                in_shape.sizes().iter().rev().copied().collect(),
                in_shape.strides().iter().rev().copied().collect(),
                out_shape.strides().iter().rev().copied().collect(),
                (0..order).map(|k| order - 1 - perm[order - 1 - k]).collect(),
            ),
        };

    let mut out_strides = vec![0isize; order];
    for (k, &d) in perm.iter().enumerate() {
        out_strides[d] = out_strides_by_pos[k];
    }

    MergedGeometry::new(&sizes, &in_strides, &out_strides)
}
