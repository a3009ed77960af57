//! Kernel capability table.
//!
//! [`KernelCaps`] is resolved once (normally by [`KernelCaps::detect`]) and
//! passed explicitly into graph construction. For a given element type it
//! produces a [`KernelSet`]: tile widths plus function pointers for every
//! kernel shape in both coefficient modes.

use crate::element::TransElement;
use crate::macro_kernel::{line, macro_tile};

/// Instruction-set class the tile widths are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isa {
    /// 512-bit registers.
    Avx512,
    /// 256-bit registers.
    Avx,
    /// 128-bit registers (SSE2, NEON, AltiVec).
    Vec128,
    /// No vector unit assumed: line kernels only.
    Scalar,
}

impl Isa {
    pub const fn register_bytes(self) -> usize {
        match self {
            Isa::Avx512 => 64,
            Isa::Avx => 32,
            Isa::Vec128 => 16,
            Isa::Scalar => 8,
        }
    }
}

/// Tile shape of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelType {
    /// Full register width tiles.
    Full,
    /// Half register width tiles.
    Half,
    /// Single-element-wide strided runs.
    Line,
}

/// Macro tile: `(src, lda, dst, ldb, tiles_a, tiles_b, alpha, beta)`.
pub type MacroFn<T> = unsafe fn(
    *const T,
    isize,
    *mut T,
    isize,
    usize,
    usize,
    <T as TransElement>::Real,
    <T as TransElement>::Real,
);

/// Line run: `(src, src_stride, dst, dst_stride, len, alpha, beta)`.
pub type LineFn<T> = unsafe fn(
    *const T,
    isize,
    *mut T,
    isize,
    usize,
    <T as TransElement>::Real,
    <T as TransElement>::Real,
);

/// Overwrite (`beta == 0`) and update variants of one kernel.
#[derive(Clone, Copy)]
pub struct CoefPair<F> {
    overwrite: F,
    update: F,
}

impl<F: Copy> CoefPair<F> {
    #[inline]
    pub fn select(&self, update: bool) -> F {
        if update {
            self.update
        } else {
            self.overwrite
        }
    }
}

/// Kernels for one element type, resolved from a [`KernelCaps`].
#[derive(Clone, Copy)]
pub struct KernelSet<T: TransElement> {
    full_width: usize,
    half_width: usize,
    full: Option<CoefPair<MacroFn<T>>>,
    half: Option<CoefPair<MacroFn<T>>>,
    line: CoefPair<LineFn<T>>,
}

impl<T: TransElement> std::fmt::Debug for KernelSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelSet")
            .field("kind", &T::KIND)
            .field("full_width", &self.full_width)
            .field("half_width", &self.half_width)
            .finish()
    }
}

fn macro_pair<T: TransElement>(width: usize) -> Option<CoefPair<MacroFn<T>>> {
    macro_rules! pair {
        ($n:literal) => {
            Some(CoefPair {
                overwrite: macro_tile::<T, $n, false> as MacroFn<T>,
                update: macro_tile::<T, $n, true> as MacroFn<T>,
            })
        };
    }
    match width {
        2 => pair!(2),
        4 => pair!(4),
        8 => pair!(8),
        16 => pair!(16),
        _ => None,
    }
}

impl<T: TransElement> KernelSet<T> {
    fn new(register_bytes: usize) -> Self {
        let per_reg = register_bytes / T::KIND.size();
        let full = macro_pair::<T>(per_reg);
        let full_width = if full.is_some() { per_reg } else { 1 };
        let half = if full.is_some() {
            macro_pair::<T>(per_reg / 2)
        } else {
            None
        };
        let half_width = if half.is_some() { per_reg / 2 } else { 1 };
        Self {
            full_width,
            half_width,
            full,
            half,
            line: CoefPair {
                overwrite: line::<T, false> as LineFn<T>,
                update: line::<T, true> as LineFn<T>,
            },
        }
    }

    /// Tile side of full kernels, 1 when none are available.
    #[inline]
    pub fn full_width(&self) -> usize {
        self.full_width
    }

    /// Tile side of half kernels, 1 when none are available.
    #[inline]
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Tile side used by a kernel type.
    pub fn width(&self, kind: KernelType) -> usize {
        match kind {
            KernelType::Full => self.full_width,
            KernelType::Half => self.half_width,
            KernelType::Line => 1,
        }
    }

    pub fn has(&self, kind: KernelType) -> bool {
        match kind {
            KernelType::Full => self.full.is_some(),
            KernelType::Half => self.half.is_some(),
            KernelType::Line => true,
        }
    }

    /// Macro tile function for a tile kernel type.
    pub fn macro_fn(&self, kind: KernelType, update: bool) -> Option<MacroFn<T>> {
        match kind {
            KernelType::Full => self.full.map(|p| p.select(update)),
            KernelType::Half => self.half.map(|p| p.select(update)),
            KernelType::Line => None,
        }
    }

    #[inline]
    pub fn line_fn(&self, update: bool) -> LineFn<T> {
        self.line.select(update)
    }
}

/// Immutable handle describing the vector capabilities the kernels target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelCaps {
    isa: Isa,
}

impl Default for KernelCaps {
    fn default() -> Self {
        Self::detect()
    }
}

impl KernelCaps {
    /// Detect the vector width of the running CPU.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if std::arch::is_x86_feature_detected!("avx512f") {
                return Self { isa: Isa::Avx512 };
            }
            if std::arch::is_x86_feature_detected!("avx") {
                return Self { isa: Isa::Avx };
            }
            Self { isa: Isa::Vec128 }
        }
        #[cfg(any(target_arch = "aarch64", target_arch = "powerpc64"))]
        {
            Self { isa: Isa::Vec128 }
        }
        #[cfg(not(any(
            target_arch = "x86_64",
            target_arch = "aarch64",
            target_arch = "powerpc64"
        )))]
        {
            Self { isa: Isa::Scalar }
        }
    }

    /// Capabilities for a fixed instruction-set class.
    pub const fn with_isa(isa: Isa) -> Self {
        Self { isa }
    }

    #[inline]
    pub fn isa(&self) -> Isa {
        self.isa
    }

    #[inline]
    pub fn register_bytes(&self) -> usize {
        self.isa.register_bytes()
    }

    /// Kernel table for element type `T`.
    pub fn kernels<T: TransElement>(&self) -> KernelSet<T> {
        match self.isa {
            Isa::Scalar => KernelSet::new(0),
            isa => KernelSet::new(isa.register_bytes()),
        }
    }
}
