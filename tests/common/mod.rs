#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use tenperm::{TensorShape, TransElement};

/// Call `f` for every multi-index of `sizes`, first index fastest.
pub fn for_each_index(sizes: &[usize], mut f: impl FnMut(&[usize])) {
    let mut idx = vec![0usize; sizes.len()];
    loop {
        f(&idx);
        let mut d = 0;
        loop {
            if d == sizes.len() {
                return;
            }
            idx[d] += 1;
            if idx[d] < sizes[d] {
                break;
            }
            idx[d] = 0;
            d += 1;
        }
    }
}

/// Element-by-element reference: `out[perm(i)] = alpha * in[i] + beta * out[perm(i)]`.
pub fn naive_transpose<T: TransElement>(
    input: &[T],
    in_shape: &TensorShape,
    output: &mut [T],
    out_shape: &TensorShape,
    perm: &[usize],
    alpha: T::Real,
    beta: T::Real,
) {
    let zero = <T::Real as num_traits::Zero>::zero();
    let mut out_idx = vec![0usize; perm.len()];
    for_each_index(in_shape.sizes(), |i| {
        for (k, &p) in perm.iter().enumerate() {
            out_idx[k] = i[p];
        }
        let src = input[in_shape.offset_of(i) as usize];
        let o = out_shape.offset_of(&out_idx) as usize;
        output[o] = if beta == zero {
            src.scale(alpha)
        } else {
            src.axpby(alpha, output[o], beta)
        };
    });
}

pub fn random_f64(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub fn random_f32(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

pub fn inverse(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (k, &p) in perm.iter().enumerate() {
        inv[p] = k;
    }
    inv
}

pub fn permuted(sizes: &[usize], perm: &[usize]) -> Vec<usize> {
    perm.iter().map(|&p| sizes[p]).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
