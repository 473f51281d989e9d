/// Cost-curve mechanics: closed-form geometric pricing.

/// Price of the next unit after `owned` units: base · growth^owned.
/// O(1) in `owned`; never accumulated from purchase history.
#[inline]
pub fn unit_cost(base: f64, growth: f64, owned: u64) -> f64 {
    base * growth.powf(owned as f64)
}

/// Price of `n` consecutive units starting after `owned`:
/// base · growth^owned · (growth^n − 1) / (growth − 1).
#[inline]
pub fn bulk_cost(base: f64, growth: f64, owned: u64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    unit_cost(base, growth, owned) * (growth.powf(n as f64) - 1.0) / (growth - 1.0)
}

/// Largest `n` with `bulk_cost(n) <= budget` (inverse of the geometric sum).
#[inline]
pub fn max_affordable(base: f64, growth: f64, owned: u64, budget: f64) -> u64 {
    let first = unit_cost(base, growth, owned);
    if !(first > 0.0) || budget < first {
        return 0;
    }
    let n = ((budget * (growth - 1.0) / first) + 1.0).log(growth).floor();
    let mut n = if n.is_finite() { n.max(0.0) as u64 } else { 0 };
    // Rounding at the boundary can land one off either way.
    while n > 0 && bulk_cost(base, growth, owned, n) > budget {
        n -= 1;
    }
    while bulk_cost(base, growth, owned, n + 1) <= budget {
        n += 1;
    }
    n
}

/// Ticks of saving needed before `cost` is affordable (None with no income).
#[inline]
pub fn ticks_to_afford(cost: f64, balance: f64, income_per_tick: f64) -> Option<f64> {
    if cost <= balance {
        return Some(0.0);
    }
    if income_per_tick > 0.0 {
        Some((cost - balance) / income_per_tick)
    } else {
        None
    }
}

/// Payback period: ticks until an income gain repays its cost.
#[inline]
pub fn payback(cost: f64, gain_per_tick: f64) -> f64 {
    if gain_per_tick > 0.0 { cost / gain_per_tick } else { f64::INFINITY }
}
