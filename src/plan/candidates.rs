//! Candidate generation: loop orders and thread factorings.

use smallvec::SmallVec;

use crate::param::MergedGeometry;

/// Upper bound on thread factorings enumerated per budget.
pub(crate) const MAX_PARA_STRATEGIES: usize = 256;

/// Upper bound on loop orders enumerated for exhaustive tuning.
pub(crate) const MAX_EXHAUSTIVE_ORDERS: usize = 720;

/// Dimensions kept innermost by heuristic orders, outermost first.
fn pinned(merged: &MergedGeometry) -> SmallVec<[usize; 2]> {
    if merged.is_common_leading() {
        SmallVec::from_slice(&[merged.in_ld])
    } else {
        SmallVec::from_slice(&[merged.out_ld, merged.in_ld])
    }
}

/// Free dimensions sorted by descending key, then the pinned ones.
fn order_by_key(merged: &MergedGeometry, key: impl Fn(usize) -> usize) -> Vec<usize> {
    let pin = pinned(merged);
    let mut order: Vec<usize> = (0..merged.order()).filter(|d| !pin.contains(d)).collect();
    order.sort_by(|&a, &b| key(b).cmp(&key(a)));
    order.extend_from_slice(&pin);
    order
}

/// Free dimensions by combined stride, largest outermost.
pub(crate) fn rule_loop_order(merged: &MergedGeometry) -> Vec<usize> {
    order_by_key(merged, |d| {
        merged.in_strides[d].unsigned_abs() + merged.out_strides[d].unsigned_abs()
    })
}

/// Bounded heuristic set: stride-rule, input-stride and output-stride
/// orders plus every legal adjacent swap of each. Duplicates are removed,
/// keeping the first occurrence.
pub(crate) fn heuristic_loop_orders(merged: &MergedGeometry) -> Vec<Vec<usize>> {
    let n = merged.order();
    let bases = [
        rule_loop_order(merged),
        order_by_key(merged, |d| merged.in_strides[d].unsigned_abs()),
        order_by_key(merged, |d| merged.out_strides[d].unsigned_abs()),
    ];

    // Swapping positions i and i+1 must not move a pinned dim out of the
    // innermost block; swapping the two pinned dims of the general case
    // keeps both inner.
    let free = n - pinned(merged).len();
    let mut swaps: Vec<usize> = (0..free.saturating_sub(1)).collect();
    if !merged.is_common_leading() && n >= 2 {
        swaps.push(n - 2);
    }

    let mut out: Vec<Vec<usize>> = Vec::new();
    let mut push = |o: Vec<usize>| {
        if !out.contains(&o) {
            out.push(o);
        }
    };
    for base in &bases {
        push(base.clone());
    }
    for base in &bases {
        for &i in &swaps {
            let mut o = base.clone();
            o.swap(i, i + 1);
            push(o);
        }
    }
    out
}

/// Lexicographic successor; false once `v` is the last permutation.
fn next_permutation(v: &mut [usize]) -> bool {
    if v.len() < 2 {
        return false;
    }
    let mut i = v.len() - 1;
    while i > 0 && v[i - 1] >= v[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = v.len() - 1;
    while v[j] <= v[i - 1] {
        j -= 1;
    }
    v.swap(i - 1, j);
    v[i..].reverse();
    true
}

/// Every legal loop order, capped at [`MAX_EXHAUSTIVE_ORDERS`].
///
/// In the common-leading case the shared leading dimension stays innermost.
pub(crate) fn all_loop_orders(merged: &MergedGeometry) -> Vec<Vec<usize>> {
    let n = merged.order();
    let ld = merged.in_ld;
    let common = merged.is_common_leading();
    let mut free: Vec<usize> = (0..n).filter(|&d| !common || d != ld).collect();

    let mut out = Vec::new();
    loop {
        let mut o = free.clone();
        if common {
            o.push(ld);
        }
        out.push(o);
        if out.len() >= MAX_EXHAUSTIVE_ORDERS || !next_permutation(&mut free) {
            break;
        }
    }
    out
}

/// Per-dimension thread factorings of the largest feasible budget.
///
/// Starting from `threads`, the budget is lowered one by one until it can
/// be written as a product of per-dimension factors with
/// `factor[d] <= avail[d]`. Budget 1 always succeeds.
pub(crate) fn para_strategies(threads: usize, avail: &[usize], limit: usize) -> Vec<Vec<usize>> {
    let n = avail.len();
    // suffix[d] = product of avail[d..]
    let mut suffix = vec![1usize; n + 1];
    for d in (0..n).rev() {
        suffix[d] = suffix[d + 1].saturating_mul(avail[d].max(1));
    }

    for budget in (1..=threads.max(1)).rev() {
        if budget > suffix[0] {
            continue;
        }
        let mut out = Vec::new();
        let mut cur = vec![1usize; n];
        factor(0, budget, avail, &suffix, &mut cur, &mut out, limit);
        if !out.is_empty() {
            return out;
        }
    }
    vec![vec![1; n]]
}

fn factor(
    d: usize,
    remaining: usize,
    avail: &[usize],
    suffix: &[usize],
    cur: &mut [usize],
    out: &mut Vec<Vec<usize>>,
    limit: usize,
) {
    if out.len() >= limit {
        return;
    }
    if d == avail.len() {
        if remaining == 1 {
            out.push(cur.to_vec());
        }
        return;
    }
    if remaining > suffix[d] {
        return;
    }
    for f in (1..=remaining.min(avail[d].max(1))).rev() {
        if remaining % f == 0 {
            cur[d] = f;
            factor(d + 1, remaining / f, avail, suffix, cur, out, limit);
        }
    }
    cur[d] = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general_3d() -> MergedGeometry {
        // in_ld 0, out_ld 1
        MergedGeometry::new(&[8, 8, 8], &[1, 8, 64], &[8, 1, 64])
    }

    fn common_3d() -> MergedGeometry {
        MergedGeometry::new(&[5, 2, 3], &[1, 5, 10], &[1, 15, 5])
    }

    #[test]
    fn test_rule_order_pins_leading() {
        assert_eq!(rule_loop_order(&general_3d()), vec![2, 1, 0]);
        assert_eq!(rule_loop_order(&common_3d()), vec![1, 2, 0]);
    }

    #[test]
    fn test_heuristic_orders_keep_pins() {
        let m = general_3d();
        let orders = heuristic_loop_orders(&m);
        assert_eq!(orders[0], rule_loop_order(&m));
        for o in &orders {
            let inner: Vec<usize> = o[1..].to_vec();
            assert!(inner.contains(&0) && inner.contains(&1), "{o:?}");
        }
        assert!(orders.contains(&vec![2, 0, 1]));

        let c = common_3d();
        for o in heuristic_loop_orders(&c) {
            assert_eq!(*o.last().unwrap(), 0);
        }
    }

    #[test]
    fn test_heuristic_orders_unique() {
        let orders = heuristic_loop_orders(&general_3d());
        for (i, a) in orders.iter().enumerate() {
            assert!(!orders[i + 1..].contains(a));
        }
    }

    #[test]
    fn test_all_orders() {
        assert_eq!(all_loop_orders(&general_3d()).len(), 6);
        let c = all_loop_orders(&common_3d());
        assert_eq!(c.len(), 2);
        assert!(c.iter().all(|o| o[2] == 0));
    }

    #[test]
    fn test_next_permutation() {
        let mut v = vec![0, 1, 2];
        let mut count = 1;
        while next_permutation(&mut v) {
            count += 1;
        }
        assert_eq!(count, 6);
        assert_eq!(v, vec![2, 1, 0]);
    }

    #[test]
    fn test_para_exact_factoring() {
        let s = para_strategies(4, &[64, 64], MAX_PARA_STRATEGIES);
        assert_eq!(s, vec![vec![4, 1], vec![2, 2], vec![1, 4]]);
    }

    #[test]
    fn test_para_lowers_budget() {
        // 7 is prime and no dim has 7 iterations; 6 = 2*3 does not fit either
        let s = para_strategies(7, &[2, 2], MAX_PARA_STRATEGIES);
        assert_eq!(s, vec![vec![2, 2]]);
    }

    #[test]
    fn test_para_respects_avail() {
        for s in para_strategies(12, &[3, 1, 4], MAX_PARA_STRATEGIES) {
            assert!(s[0] <= 3 && s[1] == 1 && s[2] <= 4);
            assert_eq!(s.iter().product::<usize>(), 12);
        }
    }

    #[test]
    fn test_para_single_thread() {
        assert_eq!(para_strategies(1, &[5, 5], 8), vec![vec![1, 1]]);
        assert_eq!(para_strategies(0, &[5, 5], 8), vec![vec![1, 1]]);
    }

    #[test]
    fn test_para_limit() {
        assert_eq!(para_strategies(64, &[64, 64, 64], 5).len(), 5);
    }
}
