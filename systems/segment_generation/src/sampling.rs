//! Range sampling that tolerates inverted, degenerate, and non-finite bounds.

use lava_runner_core::clamp_unit;
use rand::Rng;

/// Uniform draw in `[a, b]` with the bounds reordered when inverted.
pub(crate) fn uniform<R>(rng: &mut R, a: f32, b: f32) -> f32
where
    R: Rng + ?Sized,
{
    let (lo, hi) = match (a.is_finite(), b.is_finite()) {
        (true, true) => (a.min(b), a.max(b)),
        (true, false) => return a,
        (false, true) => return b,
        (false, false) => return 0.0,
    };
    if lo == hi {
        lo
    } else if (hi - lo).is_finite() {
        rng.gen_range(lo..=hi)
    } else {
        // Width overflows f32; interpolate between the bounds instead.
        let t: f32 = rng.gen();
        lo * (1.0 - t) + hi * t
    }
}

/// Uniform draw in `[0, upper)`; zero when the range is empty.
pub(crate) fn uniform_below<R>(rng: &mut R, upper: f32) -> f32
where
    R: Rng + ?Sized,
{
    if upper.is_finite() && upper > 0.0 {
        rng.gen_range(0.0..upper)
    } else {
        0.0
    }
}

/// Uniform integer in `[a, b]` with the bounds reordered when inverted.
pub(crate) fn uniform_count<R>(rng: &mut R, a: u32, b: u32) -> u32
where
    R: Rng + ?Sized,
{
    rng.gen_range(a.min(b)..=a.max(b))
}

/// Bernoulli trial with the probability clamped to `[0, 1]`.
pub(crate) fn chance<R>(rng: &mut R, probability: f32) -> bool
where
    R: Rng + ?Sized,
{
    rng.gen::<f32>() < clamp_unit(probability)
}

/// Orders a closed interval, substituting zero for non-finite bounds.
pub(crate) fn ordered(a: f32, b: f32) -> (f32, f32) {
    let a = finite_or_zero(a);
    let b = finite_or_zero(b);
    (a.min(b), a.max(b))
}

pub(crate) fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
