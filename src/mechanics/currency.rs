/// Currency mechanics: saturating, never-negative balance arithmetic.

/// Add a non-negative amount; saturates at `f64::MAX` instead of reaching infinity.
/// Negative or NaN amounts credit nothing.
#[inline]
pub fn credit(balance: f64, amount: f64) -> f64 {
    let next = balance + amount.max(0.0);
    if next.is_finite() { next } else { f64::MAX }
}

/// `cost <= balance` for a finite cost.
#[inline]
pub fn affordable(balance: f64, cost: f64) -> bool {
    cost.is_finite() && cost <= balance
}

/// Deduct `cost` if affordable; the result is clamped at zero.
#[inline]
pub fn debit(balance: f64, cost: f64) -> Option<f64> {
    if affordable(balance, cost) {
        Some((balance - cost).max(0.0))
    } else {
        None
    }
}
