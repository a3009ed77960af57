//! Execution strategy descriptors.

use tenperm_kernel::{KernelSet, KernelType, TransElement};
use tenperm_view::{Result, TransError};

use crate::param::MergedGeometry;

/// Merged dimensions from outermost to innermost loop.
pub type LoopOrder = Vec<usize>;

/// Thread count per merged dimension; 0 and 1 both mean "not split".
pub type ParaStrategy = Vec<usize>;

/// Loop bounds of one kernel region.
///
/// For every merged dimension `d` the region iterates
/// `begin[d], begin[d] + step[d], ..` while `< end[d]`. Tile kernels cover
/// `step[d]` elements along both leading dimensions per call. Line kernels
/// run along `line_dim`, covering `min(step, end - i)` elements per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopParam {
    pub kernel: KernelType,
    pub line_dim: usize,
    pub begin: Vec<usize>,
    pub end: Vec<usize>,
    pub step: Vec<usize>,
}

impl LoopParam {
    /// Region covering `[0, sizes[d])` with unit steps.
    pub fn full_range(kernel: KernelType, line_dim: usize, sizes: &[usize]) -> Self {
        Self {
            kernel,
            line_dim,
            begin: vec![0; sizes.len()],
            end: sizes.to_vec(),
            step: vec![1; sizes.len()],
        }
    }

    /// Set the bounds of one dimension.
    pub fn with_dim(mut self, dim: usize, begin: usize, end: usize, step: usize) -> Self {
        self.begin[dim] = begin;
        self.end[dim] = end;
        self.step[dim] = step;
        self
    }

    /// Loop iterations along `dim`.
    pub fn iterations(&self, dim: usize) -> usize {
        (self.end[dim] - self.begin[dim]).div_ceil(self.step[dim])
    }

    /// Number of elements the region covers.
    pub fn volume(&self) -> usize {
        self.begin
            .iter()
            .zip(self.end.iter())
            .map(|(&b, &e)| e - b)
            .product()
    }

    pub fn is_empty(&self) -> bool {
        self.begin.iter().zip(self.end.iter()).any(|(&b, &e)| e <= b)
    }

    /// Whether the boxes `[begin, end)` of two regions share an element.
    pub fn overlaps(&self, other: &LoopParam) -> bool {
        (0..self.begin.len()).all(|d| {
            self.begin[d].max(other.begin[d]) < self.end[d].min(other.end[d])
        })
    }
}

/// A complete execution strategy: loop order, parallel split and the
/// kernel regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub loop_order: LoopOrder,
    pub parallel_strategy: ParaStrategy,
    pub description: Vec<LoopParam>,
}

impl Descriptor {
    pub fn new(
        loop_order: LoopOrder,
        parallel_strategy: ParaStrategy,
        description: Vec<LoopParam>,
    ) -> Self {
        Self {
            loop_order,
            parallel_strategy,
            description,
        }
    }

    /// Product of all per-dimension thread counts.
    pub fn thread_product(&self) -> usize {
        self.parallel_strategy.iter().map(|&t| t.max(1)).product()
    }

    /// Check that the descriptor can drive a transposition with this
    /// geometry, kernel table and thread budget.
    ///
    /// Regions must be disjoint boxes that together cover the merged index
    /// space, so every output element is written exactly once.
    pub(crate) fn validate<T: TransElement>(
        &self,
        merged: &MergedGeometry,
        kernels: &KernelSet<T>,
        threads: usize,
    ) -> Result<()> {
        let order = merged.order();
        let mismatch = |msg: String| -> Result<()> { Err(TransError::DescriptorMismatch(msg)) };

        if self.loop_order.len() != order {
            return mismatch(format!(
                "loop order has {} entries, merged order is {order}",
                self.loop_order.len()
            ));
        }
        let mut seen = vec![false; order];
        for &d in &self.loop_order {
            if d >= order || seen[d] {
                return mismatch(format!("loop order {:?} is not a permutation", self.loop_order));
            }
            seen[d] = true;
        }
        if self.parallel_strategy.len() != order {
            return mismatch(format!(
                "parallel strategy has {} entries, merged order is {order}",
                self.parallel_strategy.len()
            ));
        }
        if self.thread_product() > threads.max(1) {
            return mismatch(format!(
                "parallel strategy {:?} needs {} threads, budget is {threads}",
                self.parallel_strategy,
                self.thread_product()
            ));
        }
        if self.description.is_empty() {
            return mismatch("no kernel regions".to_string());
        }

        let mut covered = 0usize;
        for (r, region) in self.description.iter().enumerate() {
            if region.begin.len() != order || region.end.len() != order || region.step.len() != order
            {
                return mismatch(format!("region {r} has wrong rank"));
            }
            for d in 0..order {
                if region.step[d] == 0
                    || region.begin[d] > region.end[d]
                    || region.end[d] > merged.sizes[d]
                {
                    return mismatch(format!("region {r} has invalid bounds along dim {d}"));
                }
            }
            let blocked = |d: usize| match region.kernel {
                KernelType::Line => d == region.line_dim,
                _ => d == merged.in_ld || d == merged.out_ld,
            };
            if let Some(d) = (0..order).find(|&d| region.step[d] != 1 && !blocked(d)) {
                return mismatch(format!(
                    "region {r} steps by {} along dim {d}, which no kernel spans",
                    region.step[d]
                ));
            }
            match region.kernel {
                KernelType::Line => {
                    if region.line_dim >= order {
                        return mismatch(format!("region {r} line dim out of range"));
                    }
                }
                kind => {
                    if !kernels.has(kind) || merged.is_common_leading() || !merged.has_unit_leading()
                    {
                        return mismatch(format!("region {r} uses unavailable {kind:?} kernels"));
                    }
                    let w = kernels.width(kind);
                    for d in [merged.in_ld, merged.out_ld] {
                        let tiles = region.step[d] / w;
                        if region.step[d] % w != 0
                            || tiles == 0
                            || tiles > tenperm_kernel::MAX_MACRO_TILES
                            || (region.end[d] - region.begin[d]) % region.step[d] != 0
                        {
                            return mismatch(format!(
                                "region {r} tile step {} along dim {d} does not fit width {w}",
                                region.step[d]
                            ));
                        }
                    }
                }
            }
            if let Some(q) = self.description[..r].iter().position(|prev| region.overlaps(prev)) {
                return mismatch(format!("regions {q} and {r} overlap"));
            }
            covered += region.volume();
        }
        if covered != merged.len() {
            return mismatch(format!(
                "regions cover {covered} elements, tensor has {}",
                merged.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenperm_kernel::{Isa, KernelCaps};

    fn matrix_geometry(m: usize, n: usize) -> MergedGeometry {
        MergedGeometry::new(&[m, n], &[1, m as isize], &[n as isize, 1])
    }

    #[test]
    fn test_loop_param_iterations() {
        let p = LoopParam::full_range(KernelType::Line, 0, &[10, 7]).with_dim(0, 2, 10, 4);
        assert_eq!(p.iterations(0), 2);
        assert_eq!(p.iterations(1), 7);
        assert_eq!(p.volume(), 8 * 7);
        assert!(!p.is_empty());
        assert!(LoopParam::full_range(KernelType::Line, 0, &[3]).with_dim(0, 3, 3, 1).is_empty());
    }

    #[test]
    fn test_validate_accepts_line_cover() {
        let merged = matrix_geometry(5, 3);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let desc = Descriptor::new(
            vec![1, 0],
            vec![1, 1],
            vec![LoopParam::full_range(KernelType::Line, 1, &[5, 3]).with_dim(1, 0, 3, 3)],
        );
        assert!(desc.validate(&merged, &kernels, 1).is_ok());
    }

    #[test]
    fn test_validate_rejects_partial_cover() {
        let merged = matrix_geometry(5, 3);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let desc = Descriptor::new(
            vec![1, 0],
            vec![1, 1],
            vec![LoopParam::full_range(KernelType::Line, 1, &[4, 3]).with_dim(1, 0, 3, 3)],
        );
        assert!(matches!(
            desc.validate(&merged, &kernels, 1),
            Err(TransError::DescriptorMismatch(_))
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_rank() {
        let merged = matrix_geometry(5, 3);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let desc = Descriptor::new(
            vec![0],
            vec![1],
            vec![LoopParam::full_range(KernelType::Line, 0, &[15])],
        );
        assert!(desc.validate(&merged, &kernels, 1).is_err());
    }

    #[test]
    fn test_validate_rejects_misaligned_tiles() {
        let merged = matrix_geometry(8, 8);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let desc = Descriptor::new(
            vec![1, 0],
            vec![1, 1],
            vec![LoopParam::full_range(KernelType::Full, 0, &[8, 8])
                .with_dim(0, 0, 8, 3)
                .with_dim(1, 0, 8, 4)],
        );
        assert!(desc.validate(&merged, &kernels, 1).is_err());
    }

    #[test]
    fn test_validate_rejects_skipping_step() {
        // line along dim 1, but dim 0 only visits every other index
        let merged = matrix_geometry(4, 3);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let desc = Descriptor::new(
            vec![1, 0],
            vec![1, 1],
            vec![LoopParam::full_range(KernelType::Line, 1, &[4, 3])
                .with_dim(0, 0, 4, 2)
                .with_dim(1, 0, 3, 3)],
        );
        assert!(matches!(
            desc.validate(&merged, &kernels, 1),
            Err(TransError::DescriptorMismatch(msg)) if msg.contains("no kernel spans")
        ));
    }

    #[test]
    fn test_validate_rejects_overlapping_regions() {
        // two copies of the same half covers the volume but writes it twice
        let merged = matrix_geometry(4, 3);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let half = LoopParam::full_range(KernelType::Line, 1, &[4, 3])
            .with_dim(0, 0, 2, 1)
            .with_dim(1, 0, 3, 3);
        let desc = Descriptor::new(vec![1, 0], vec![1, 1], vec![half.clone(), half]);
        assert_eq!(desc.description.iter().map(LoopParam::volume).sum::<usize>(), 12);
        assert!(matches!(
            desc.validate(&merged, &kernels, 1),
            Err(TransError::DescriptorMismatch(msg)) if msg.contains("overlap")
        ));
    }

    #[test]
    fn test_validate_accepts_disjoint_split() {
        let merged = matrix_geometry(4, 3);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let top = LoopParam::full_range(KernelType::Line, 1, &[4, 3])
            .with_dim(0, 0, 2, 1)
            .with_dim(1, 0, 3, 3);
        let bottom = top.clone().with_dim(0, 2, 4, 1);
        assert!(!top.overlaps(&bottom));
        let desc = Descriptor::new(vec![1, 0], vec![1, 1], vec![top, bottom]);
        assert!(desc.validate(&merged, &kernels, 1).is_ok());
    }

    #[test]
    fn test_validate_rejects_thread_overcommit() {
        let merged = matrix_geometry(64, 64);
        let kernels = KernelCaps::with_isa(Isa::Avx).kernels::<f64>();
        let region = LoopParam::full_range(KernelType::Line, 1, &[64, 64]).with_dim(1, 0, 64, 64);
        let desc = Descriptor::new(vec![1, 0], vec![8, 1], vec![region]);
        assert!(desc.validate(&merged, &kernels, 8).is_ok());
        assert!(matches!(
            desc.validate(&merged, &kernels, 2),
            Err(TransError::DescriptorMismatch(msg)) if msg.contains("budget is 2")
        ));
    }

    #[test]
    fn test_thread_product() {
        let desc = Descriptor::new(vec![0, 1], vec![0, 4], Vec::new());
        assert_eq!(desc.thread_product(), 4);
    }
}
