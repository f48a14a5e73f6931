//! Percentile reduction over sorted samples.

/// Linear-interpolation quantile of `sorted` (ascending), rounded up.
///
/// The position `(n - 1) * q` is interpolated between its two neighbouring
/// values and the result is ceiled, so forecasts never understate the time
/// needed. When the position lands on the last element that element is
/// returned. `q` is clamped to `[0, 1]`.
///
/// # Panics
///
/// Panics if `sorted` is empty. Callers always reduce at least one value.
pub fn quantile(sorted: &[u32], q: f64) -> u32 {
    assert!(!sorted.is_empty(), "quantile of an empty sample");

    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;

    let lower = f64::from(sorted[base]);
    match sorted.get(base + 1) {
        Some(&upper) => (lower + rest * (f64::from(upper) - lower)).ceil() as u32,
        None => lower.ceil() as u32,
    }
}
