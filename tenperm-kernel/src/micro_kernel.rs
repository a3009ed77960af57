//! N×N micro tile transpose.
//!
//! Plain bounded loops over a compile-time `N`; LLVM unrolls and vectorizes
//! them into register shuffles for the widths the capability table hands out
//! (2, 4, 8, 16).

use crate::element::TransElement;

/// Transpose one N×N tile:
/// `dst[j + i*ldb] = alpha * src[i + j*lda] (+ beta * dst[j + i*ldb])`
/// for `i, j` in `0..N`.
///
/// `i` runs along the source's contiguous axis and `j` along the
/// destination's contiguous axis. The tile is first loaded into a local
/// `N×N` block, then stored transposed.
///
/// # Safety
/// - `src` must be readable at `i + j*lda` for all `i, j < N`
/// - `dst` must be writable (and readable when `UPDATE`) at `j + i*ldb`
/// - the two regions must not overlap
#[inline(always)]
pub unsafe fn transpose_micro<T: TransElement, const N: usize, const UPDATE: bool>(
    src: *const T,
    lda: isize,
    dst: *mut T,
    ldb: isize,
    alpha: T::Real,
    beta: T::Real,
) {
    let mut reg = [[T::default(); N]; N];
    for (j, row) in reg.iter_mut().enumerate() {
        let s = src.offset(j as isize * lda);
        for (i, r) in row.iter_mut().enumerate() {
            *r = *s.add(i);
        }
    }
    for i in 0..N {
        let d = dst.offset(i as isize * ldb);
        for (j, row) in reg.iter().enumerate() {
            let v = row[i];
            let out = d.add(j);
            *out = if UPDATE {
                v.axpby(alpha, *out, beta)
            } else {
                v.scale(alpha)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;

    #[test]
    fn test_micro_f64_4x4() {
        let src: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let mut dst = vec![0.0f64; 16];

        unsafe {
            transpose_micro::<f64, 4, false>(src.as_ptr(), 4, dst.as_mut_ptr(), 4, 1.0, 0.0);
        }

        for j in 0..4 {
            for i in 0..4 {
                assert_eq!(dst[j + i * 4], src[i + j * 4], "mismatch at i={i}, j={j}");
            }
        }
    }

    #[test]
    fn test_micro_non_square_strides() {
        // src rows of 5, dst rows of 6
        let mut src = vec![0.0f64; 20];
        for j in 0..4 {
            for i in 0..4 {
                src[i + j * 5] = (i * 10 + j) as f64;
            }
        }
        let mut dst = vec![0.0f64; 24];

        unsafe {
            transpose_micro::<f64, 4, false>(src.as_ptr(), 5, dst.as_mut_ptr(), 6, 2.0, 0.0);
        }

        for j in 0..4 {
            for i in 0..4 {
                assert_eq!(dst[j + i * 6], 2.0 * src[i + j * 5], "mismatch at i={i}, j={j}");
            }
        }
        // padding columns untouched
        assert_eq!(dst[4], 0.0);
        assert_eq!(dst[5], 0.0);
    }

    #[test]
    fn test_micro_f32_8x8_update() {
        let src: Vec<f32> = (0..64).map(|i| i as f32).collect();
        let mut dst = vec![1.0f32; 64];

        unsafe {
            transpose_micro::<f32, 8, true>(src.as_ptr(), 8, dst.as_mut_ptr(), 8, 1.0, 3.0);
        }

        for j in 0..8 {
            for i in 0..8 {
                assert_eq!(dst[j + i * 8], src[i + j * 8] + 3.0);
            }
        }
    }

    #[test]
    fn test_micro_complex_2x2() {
        let src: Vec<Complex32> = (0..4).map(|i| Complex32::new(i as f32, -(i as f32))).collect();
        let mut dst = vec![Complex32::default(); 4];

        unsafe {
            transpose_micro::<Complex32, 2, false>(src.as_ptr(), 2, dst.as_mut_ptr(), 2, 0.5, 0.0);
        }

        assert_eq!(dst[1], Complex32::new(1.0, -1.0));
        assert_eq!(dst[2], Complex32::new(0.5, -0.5));
        assert_eq!(dst[3], Complex32::new(1.5, -1.5));
    }
}
