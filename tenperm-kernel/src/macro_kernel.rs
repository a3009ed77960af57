//! Macro tiles and line runs.
//!
//! A macro tile is a `tiles_a × tiles_b` grid of N×N micro tiles, where `a`
//! is the source's contiguous axis and `b` the destination's. A line is a
//! one-dimensional strided run used where no tile fits.

use crate::element::TransElement;
use crate::micro_kernel::transpose_micro;
use crate::simd::{vectorized, vectorized_line};

/// Process a grid of `tiles_a × tiles_b` micro tiles of side `N`.
///
/// - `src` points to A[0,0]; A is contiguous along `a`, `lda` steps along `b`.
/// - `dst` points to B[0,0]; B is contiguous along `b`, `ldb` steps along `a`.
///
/// `B[j + i*ldb] = alpha * A[i + j*lda] (+ beta * B[j + i*ldb])`
/// for `i < tiles_a*N`, `j < tiles_b*N`.
///
/// # Safety
/// src/dst must be valid for the whole grid with the given strides.
#[inline]
pub unsafe fn macro_tile<T: TransElement, const N: usize, const UPDATE: bool>(
    src: *const T,
    lda: isize,
    dst: *mut T,
    ldb: isize,
    tiles_a: usize,
    tiles_b: usize,
    alpha: T::Real,
    beta: T::Real,
) {
    vectorized(|| {
        for jb in 0..tiles_b {
            let j = (jb * N) as isize;
            for ia in 0..tiles_a {
                let i = (ia * N) as isize;
                transpose_micro::<T, N, UPDATE>(
                    src.offset(i + j * lda),
                    lda,
                    dst.offset(j + i * ldb),
                    ldb,
                    alpha,
                    beta,
                );
            }
        }
    })
}

/// Strided run: `dst[k*dst_stride] = alpha * src[k*src_stride] (+ beta * dst[..])`
/// for `k < len`.
///
/// # Safety
/// src/dst must be valid for `len` elements at the given strides.
#[inline]
pub unsafe fn line<T: TransElement, const UPDATE: bool>(
    src: *const T,
    src_stride: isize,
    dst: *mut T,
    dst_stride: isize,
    len: usize,
    alpha: T::Real,
    beta: T::Real,
) {
    if src_stride == 1 && dst_stride == 1 {
        vectorized_line(len, || {
            let s = std::slice::from_raw_parts(src, len);
            let d = std::slice::from_raw_parts_mut(dst, len);
            for (o, &v) in d.iter_mut().zip(s.iter()) {
                *o = if UPDATE {
                    v.axpby(alpha, *o, beta)
                } else {
                    v.scale(alpha)
                };
            }
        })
    } else {
        let mut s = src;
        let mut d = dst;
        for _ in 0..len {
            *d = if UPDATE {
                (*s).axpby(alpha, *d, beta)
            } else {
                (*s).scale(alpha)
            };
            s = s.offset(src_stride);
            d = d.offset(dst_stride);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_macro_tile_full_grid() {
        // 16×16 tile, 4×4 grid of 4×4 micro tiles
        let n = 16;
        let src: Vec<f64> = (0..n * n).map(|i| i as f64).collect();
        let mut dst = vec![0.0f64; n * n];

        unsafe {
            macro_tile::<f64, 4, false>(
                src.as_ptr(),
                n as isize,
                dst.as_mut_ptr(),
                n as isize,
                4,
                4,
                1.0,
                0.0,
            );
        }

        for j in 0..n {
            for i in 0..n {
                assert_eq!(dst[j + i * n], src[i + j * n], "mismatch at i={i}, j={j}");
            }
        }
    }

    #[test]
    fn test_macro_tile_rectangular_grid() {
        // 3 tiles along a, 1 along b: 6×2 block inside padded storage
        let lda = 9isize;
        let ldb = 5isize;
        let src: Vec<f32> = (0..2 * 9).map(|i| i as f32).collect();
        let mut dst = vec![-1.0f32; 6 * 5];

        unsafe {
            macro_tile::<f32, 2, false>(src.as_ptr(), lda, dst.as_mut_ptr(), ldb, 3, 1, 2.0, 0.0);
        }

        for j in 0..2 {
            for i in 0..6 {
                let s = src[(i as isize + j as isize * lda) as usize];
                let d = dst[(j as isize + i as isize * ldb) as usize];
                assert_eq!(d, 2.0 * s, "mismatch at i={i}, j={j}");
            }
        }
        // columns 2..5 of every destination row stay untouched
        assert!(dst.chunks(5).all(|row| row[2..].iter().all(|&x| x == -1.0)));
    }

    #[test]
    fn test_line_contiguous_update() {
        let src = vec![1.0f64, 2.0, 3.0, 4.0, 5.0];
        let mut dst = vec![10.0f64; 5];
        unsafe {
            line::<f64, true>(src.as_ptr(), 1, dst.as_mut_ptr(), 1, 5, 2.0, 0.5);
        }
        for (k, &d) in dst.iter().enumerate() {
            assert_relative_eq!(d, 2.0 * src[k] + 5.0);
        }
    }

    #[test]
    fn test_line_strided() {
        let src = vec![1.0f64, 0.0, 2.0, 0.0, 3.0];
        let mut dst = vec![0.0f64; 7];
        unsafe {
            line::<f64, false>(src.as_ptr(), 2, dst.as_mut_ptr(), 3, 3, 1.0, 0.0);
        }
        assert_eq!(dst, vec![1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_line_overwrite_ignores_nan_destination() {
        let src = vec![1.0f32; 4];
        let mut dst = vec![f32::NAN; 4];
        unsafe {
            line::<f32, false>(src.as_ptr(), 1, dst.as_mut_ptr(), 1, 4, 3.0, 0.0);
        }
        assert_eq!(dst, vec![3.0; 4]);
    }
}
