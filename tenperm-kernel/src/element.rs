//! Element types supported by the kernels.

use num_complex::Complex;
use num_traits::Float;

/// Runtime tag of a [`TransElement`] type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    F32,
    F64,
    C32,
    C64,
}

impl ElementKind {
    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            ElementKind::F32 => 4,
            ElementKind::F64 | ElementKind::C32 => 8,
            ElementKind::C64 => 16,
        }
    }
}

/// An element that can be transposed with a real-valued affine update.
///
/// `alpha` and `beta` are always real (`Self::Real`), also for complex
/// element types.
pub trait TransElement:
    Copy
    + Send
    + Sync
    + Default
    + PartialEq
    + std::fmt::Debug
    + std::ops::Add<Output = Self>
    + 'static
{
    /// Coefficient type.
    type Real: Float + Send + Sync + std::fmt::Debug + 'static;

    const KIND: ElementKind;

    /// `self * coef`
    fn scale(self, coef: Self::Real) -> Self;

    /// `alpha * self + beta * out`
    #[inline(always)]
    fn axpby(self, alpha: Self::Real, out: Self, beta: Self::Real) -> Self {
        self.scale(alpha) + out.scale(beta)
    }
}

macro_rules! impl_real {
    ($t:ty, $kind:expr) => {
        impl TransElement for $t {
            type Real = $t;
            const KIND: ElementKind = $kind;

            #[inline(always)]
            fn scale(self, coef: $t) -> $t {
                self * coef
            }
        }
    };
}

macro_rules! impl_complex {
    ($t:ty, $kind:expr) => {
        impl TransElement for Complex<$t> {
            type Real = $t;
            const KIND: ElementKind = $kind;

            #[inline(always)]
            fn scale(self, coef: $t) -> Complex<$t> {
                Complex::new(self.re * coef, self.im * coef)
            }
        }
    };
}

impl_real!(f32, ElementKind::F32);
impl_real!(f64, ElementKind::F64);
impl_complex!(f32, ElementKind::C32);
impl_complex!(f64, ElementKind::C64);
