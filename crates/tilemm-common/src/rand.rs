pub use rand::{Rng, SeedableRng, rngs::StdRng};

/// Seed used by the benchmark when none is configured.
pub const DEFAULT_SEED: u64 = 314159;

/// Returns a random number generator seeded with the given value.
///
/// The same seed always produces the same operands, which keeps benchmark runs comparable.
#[inline(always)]
pub fn get_seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Fills a new vector with `num_elements` samples of the standard normal distribution.
///
/// Uses the Box-Muller transform on pairs of uniform samples.
pub fn randn<R: Rng>(rng: &mut R, num_elements: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(num_elements);

    while values.len() < num_elements {
        // Shift into (0, 1] so the logarithm stays finite.
        let u1 = 1.0 - rng.random::<f64>();
        let u2 = rng.random::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * core::f64::consts::PI * u2;

        values.push((radius * theta.cos()) as f32);
        if values.len() < num_elements {
            values.push((radius * theta.sin()) as f32);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn randn_is_reproducible_with_the_same_seed() {
        let first = randn(&mut get_seeded_rng(DEFAULT_SEED), 33);
        let second = randn(&mut get_seeded_rng(DEFAULT_SEED), 33);

        assert_eq!(first.len(), 33);
        assert_eq!(first, second);
    }

    #[test_log::test]
    fn randn_is_roughly_standard() {
        let values = randn(&mut get_seeded_rng(7), 20_000);
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64;
        let var = values
            .iter()
            .map(|v| (*v as f64 - mean).powi(2))
            .sum::<f64>()
            / values.len() as f64;

        assert!(mean.abs() < 0.05, "mean={mean}");
        assert!((var - 1.0).abs() < 0.05, "var={var}");
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
