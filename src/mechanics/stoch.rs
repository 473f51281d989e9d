/// Stochastic mechanics: deterministic draws from `bevy_prng::WyRand`.
/// Every helper consumes the generator in a fixed order, so a seed fully
/// determines the output on every host.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// Generator for a 64-bit seed.
#[inline]
pub fn seeded(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Uniform in [0, 1) with 53 bits of precision.
#[inline]
pub fn unit(rng: &mut WyRand) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform integer in [0, n). Returns 0 when `n == 0`.
#[inline]
pub fn below(rng: &mut WyRand, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    ((rng.next_u64() as u128 * n as u128) >> 64) as usize
}

/// Uniform integer in [lo, hi] (bounds may arrive swapped).
#[inline]
pub fn between(rng: &mut WyRand, lo: usize, hi: usize) -> usize {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    lo + below(rng, hi - lo + 1)
}

/// Bernoulli(p).
#[inline]
pub fn bernoulli(rng: &mut WyRand, p: f64) -> bool {
    unit(rng) < p.clamp(0.0, 1.0)
}

/// Uniform element of a slice.
#[inline]
pub fn pick<'a, T>(rng: &mut WyRand, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(below(rng, items.len()))
    }
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T>(rng: &mut WyRand, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = below(rng, i + 1);
        items.swap(i, j);
    }
}
