//! Transpose-and-scale kernels for tenperm.
//!
//! The kernels are the innermost building blocks of an execution graph:
//!
//! 1. **Micro tile**: an N×N in-register transpose of a tile whose source is
//!    contiguous along one axis and whose destination is contiguous along
//!    the other (`N` = register width / element size, or half of it)
//! 2. **Macro tile**: a small grid (at most 4×4) of micro tiles
//! 3. **Line**: a strided run of arbitrary length, used when both leading
//!    dimensions coincide and for tile remainders
//!
//! Every kernel computes `dst = alpha * src` or, in its update variant,
//! `dst = alpha * src + beta * dst`. Which variants are available, and with
//! which tile widths, is resolved once by [`KernelCaps`] and handed out as a
//! [`KernelSet`] table.

pub mod caps;
pub mod element;
pub mod macro_kernel;
pub mod micro_kernel;
mod simd;

pub use caps::{Isa, KernelCaps, KernelSet, KernelType, LineFn, MacroFn};
pub use element::{ElementKind, TransElement};

/// Largest number of micro tiles along one side of a macro tile.
pub const MAX_MACRO_TILES: usize = 4;
