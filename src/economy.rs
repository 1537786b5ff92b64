//! Economy formulas: pure functions, no state.

use crate::state::{Generator, GeneratorId};

/// Cost of the next unit: `floor(base_cost * cost_multiplier^count)`.
pub fn generator_cost(base_cost: f64, count: u32, cost_multiplier: f64) -> f64 {
    (base_cost * cost_multiplier.powf(count as f64)).floor()
}

/// Income per second of all owned generators.
///
/// `per_generator_multiplier` supplies the upgrade multiplier for each id.
/// Generators with a zero count are skipped entirely.
pub fn total_income<F>(
    generators: &[Generator],
    per_generator_multiplier: F,
    prestige_multiplier: f64,
) -> f64
where
    F: Fn(GeneratorId) -> f64,
{
    generators
        .iter()
        .filter(|g| g.count > 0)
        .map(|g| {
            g.count as f64
                * g.spec.base_income
                * per_generator_multiplier(g.id())
                * prestige_multiplier
        })
        .sum()
}

/// Points awarded for a prestige at `total_earned`: `floor(sqrt(total_earned / requirement))`,
/// or 0 below the requirement.
pub fn prestige_points_earned(total_earned: f64, requirement: f64) -> u64 {
    if total_earned.is_nan() || total_earned < requirement || requirement <= 0.0 {
        return 0;
    }
    (total_earned / requirement).sqrt().floor() as u64
}

/// Linear, uncapped prestige bonus: `1 + points * base_multiplier`.
pub fn prestige_multiplier_from_points(points: u64, base_multiplier: f64) -> f64 {
    1.0 + points as f64 * base_multiplier
}

/// Time credited for an offline period, or `None` if the period is too short.
///
/// Periods at or below `min_ms` earn nothing; longer ones are capped at `max_ms`.
pub fn offline_window_ms(elapsed_ms: u64, min_ms: u64, max_ms: u64) -> Option<u64> {
    if elapsed_ms <= min_ms {
        return None;
    }
    Some(elapsed_ms.min(max_ms))
}
