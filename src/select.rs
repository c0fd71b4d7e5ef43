//! Rank-based selection used by every "best N of M, weighted" formula.

/// The `rank`-th largest value (1-based).
///
/// Returns `0.0` when `rank` is zero or past the end of `values`: a weight
/// with no candidate left to pair with contributes nothing. Ties keep input
/// order (stable sort).
pub fn rank_select(values: &[f64], rank: usize) -> f64 {
    if rank == 0 || rank > values.len() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sort_descending(&mut sorted);
    sorted[rank - 1]
}

/// `Σ weights[i] * rank_select(values, i + 1)`.
///
/// Sorts once instead of once per rank; the result is the same sum.
pub fn weighted_select(values: &[f64], weights: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sort_descending(&mut sorted);
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| w * sorted.get(i).copied().unwrap_or(0.0))
        .sum()
}

/// Sum of the `n` largest values.
pub fn top_n_sum(values: &[f64], n: usize) -> f64 {
    let mut sorted = values.to_vec();
    sort_descending(&mut sorted);
    sorted.iter().take(n).sum()
}

/// Total order, so a stray NaN sorts above every number instead of
/// scrambling the sort.
fn sort_descending(values: &mut [f64]) {
    values.sort_by(|a, b| b.total_cmp(a));
}
