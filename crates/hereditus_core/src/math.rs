//! Rounding helpers for gene values and derived combat stats.
//!
//! Alleles and stats are plain `f64`. Determinism comes from the seeded RNG
//! and the fixed iteration order, and every stored value is rounded to a
//! configured number of decimal places so snapshots compare exactly.
//!
//! Rounding is half-to-even throughout, so `8.5` food rounds to `8` and
//! `9.5` rounds to `10`.

use std::hash::Hasher;

/// Round to the nearest integer, ties to even.
#[must_use]
pub fn round_half_even(value: f64) -> f64 {
    let rounded = value.round();
    if (value - value.trunc()).abs() == 0.5 {
        // Exactly halfway: `round` went away from zero, pull back if odd.
        if rounded % 2.0 != 0.0 {
            return rounded - value.signum();
        }
    }
    rounded
}

/// Round to `places` decimal places, ties to even.
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    round_half_even(value * scale) / scale
}

/// Round to an integer, ties to even.
#[must_use]
pub fn round_to_int(value: f64) -> i64 {
    round_half_even(value) as i64
}

/// Geometric mean of two non-negative stats, `sqrt(a * b)`.
#[must_use]
pub fn geometric_mean(a: f64, b: f64) -> f64 {
    (a * b).max(0.0).sqrt()
}

/// Feed an `f64` into a hasher by its bit pattern.
pub fn hash_f64<H: Hasher>(value: f64, hasher: &mut H) {
    hasher.write_u64(value.to_bits());
}
