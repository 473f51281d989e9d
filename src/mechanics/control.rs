/// Control mechanics: proportional updates.

/// Proportional approach: x' = clamp(x + k * (target - x)).
#[inline]
pub fn approach(x: f64, target: f64, k: f64, lo: f64, hi: f64) -> f64 {
    (x + k * (target - x)).clamp(lo, hi)
}

/// Proportional approach in log space, for strictly positive scale factors.
/// Moves `x` toward `x * ratio` by gain `k`, clamped to [lo, hi].
#[inline]
pub fn approach_ratio(x: f64, ratio: f64, k: f64, lo: f64, hi: f64) -> f64 {
    let ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    let lx = x.max(f64::MIN_POSITIVE).ln();
    approach(lx, lx + ratio.ln(), k, lo.ln(), hi.ln()).exp()
}
