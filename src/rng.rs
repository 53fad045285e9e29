//! Inter-arrival distributions for sample and burst scheduling.
//!
//! The core does not implement a PRNG itself; it consumes a `u32 -> u32`
//! function handle (period in, delta out) so callers can inject determinism
//! in tests. The two policies below are the ones the original sampler
//! shipped: a period held constant, and an exponential draw that turns a
//! fixed period into a Poisson arrival process.

use rand::Rng;

/// Returns `period` unchanged. Useful for deterministic tests and for
/// disabling jitter entirely.
pub fn sample_rnd_const(period: u32) -> u32 {
    period
}

/// Draws `floor(period * -ln(1 - U))` for `U` uniform on `[0, 1)`, using the
/// thread-local RNG. The result is Poisson-distributed arrivals with mean
/// `period`.
pub fn sample_rnd_exp(period: u32) -> u32 {
    exp_with_rng(period, &mut ::rand::thread_rng())
}

/// Same distribution as [`sample_rnd_exp`], but drawing from a caller-owned
/// RNG so tests can seed it for reproducibility.
pub fn exp_with_rng<R: Rng + ?Sized>(period: u32, rng: &mut R) -> u32 {
    // `gen::<f64>()` is uniform on [0, 1); 1.0 - u is therefore in (0, 1].
    let u: f64 = rng.gen();
    (f64::from(period) * -(1.0 - u).ln()).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn constant_passes_through() {
        assert_eq!(sample_rnd_const(0), 0);
        assert_eq!(sample_rnd_const(42), 42);
    }

    #[test]
    fn exponential_is_deterministic_for_a_fixed_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            assert_eq!(exp_with_rng(100, &mut a), exp_with_rng(100, &mut b));
        }
    }

    #[test]
    fn exponential_mean_is_in_the_right_ballpark() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let sum: u64 = (0..n).map(|_| u64::from(exp_with_rng(200, &mut rng))).sum();
        let mean = sum as f64 / f64::from(n);
        assert!(mean > 150.0 && mean < 250.0, "mean was {}", mean);
    }
}
