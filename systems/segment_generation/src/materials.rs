//! Hazard run placement inside a segment's core tiles.

use std::time::Duration;

use lava_runner_core::{clamp_unit, scaled_probability, HazardTuning, TileMaterial};
use rand::Rng;

/// Shortest hazard run the generator will ever place.
pub const MIN_HAZARD_RUN: usize = 2;

/// Probability that a random segment receives a hazard run.
#[must_use]
pub fn hazard_chance(hazard: &HazardTuning, difficulty_scaling: bool, elapsed: Duration) -> f32 {
    if difficulty_scaling {
        scaled_probability(hazard.base_chance, hazard.growth_per_second, elapsed)
    } else {
        clamp_unit(hazard.base_chance)
    }
}

/// Materials of `count` core tiles: all grass, or grass with one contiguous hazard run.
///
/// A run is only placed when at least one grass tile remains beside it. Its
/// length lies in `[max(min_run, 2), max_run]`, with `max_run` clamped into
/// `[min_run, count - 1]`.
pub fn core_materials<R>(
    count: usize,
    hazard: &HazardTuning,
    chance: f32,
    rng: &mut R,
) -> Vec<TileMaterial>
where
    R: Rng + ?Sized,
{
    let mut materials = vec![TileMaterial::Grass; count];

    let min_run = usize::try_from(hazard.min_run)
        .unwrap_or(usize::MAX)
        .max(MIN_HAZARD_RUN);
    if count < min_run.saturating_add(1) || rng.gen::<f32>() >= clamp_unit(chance) {
        return materials;
    }

    let max_run = usize::try_from(hazard.max_run)
        .unwrap_or(usize::MAX)
        .clamp(min_run, count - 1);
    let run = rng.gen_range(min_run..=max_run);
    let start = rng.gen_range(0..=count - run);
    materials[start..start + run].fill(TileMaterial::Hazard);
    materials
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tuning(min_run: u32, max_run: u32) -> HazardTuning {
        HazardTuning {
            min_run,
            max_run,
            ..HazardTuning::default()
        }
    }

    fn hazard_runs(materials: &[TileMaterial]) -> Vec<usize> {
        let mut runs = Vec::new();
        let mut current = 0;
        for material in materials {
            if *material == TileMaterial::Hazard {
                current += 1;
            } else if current > 0 {
                runs.push(current);
                current = 0;
            }
        }
        if current > 0 {
            runs.push(current);
        }
        runs
    }

    #[test]
    fn too_short_segments_stay_grass() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for count in 0..=2 {
            let materials = core_materials(count, &tuning(1, 3), 1.0, &mut rng);
            assert!(materials.iter().all(|m| *m == TileMaterial::Grass));
            assert_eq!(materials.len(), count);
        }
    }

    #[test]
    fn runs_respect_bounds_and_leave_grass() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for count in 3..=12 {
            for _ in 0..40 {
                let materials = core_materials(count, &tuning(1, 5), 1.0, &mut rng);
                let runs = hazard_runs(&materials);
                assert_eq!(runs.len(), 1);
                let expected_max = 5.min(count - 1);
                assert!((2..=expected_max).contains(&runs[0]), "run {runs:?} in {count}");
                assert!(materials.contains(&TileMaterial::Grass));
            }
        }
    }

    #[test]
    fn inverted_run_bounds_clamp_to_minimum() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let materials = core_materials(6, &tuning(3, 1), 1.0, &mut rng);
        assert_eq!(hazard_runs(&materials), vec![3]);
    }

    #[test]
    fn zero_chance_never_places_hazard() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            let materials = core_materials(8, &tuning(2, 3), 0.0, &mut rng);
            assert!(hazard_runs(&materials).is_empty());
        }
    }

    #[test]
    fn chance_scales_only_when_enabled() {
        let hazard = HazardTuning {
            base_chance: 0.4,
            growth_per_second: 0.05,
            ..HazardTuning::default()
        };
        let elapsed = Duration::from_secs(4);
        assert!((hazard_chance(&hazard, true, elapsed) - 0.6).abs() < 1e-6);
        assert!((hazard_chance(&hazard, false, elapsed) - 0.4).abs() < 1e-6);
        assert_eq!(hazard_chance(&hazard, true, Duration::from_secs(60)), 1.0);
    }
}
