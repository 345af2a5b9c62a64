//! Weighted choice among a node's remaining candidates.

use rand::Rng;

/// Picks a position in `weights` with probability proportional to its weight.
///
/// Scans the cumulative sum against a uniform draw in `0..total`. When every
/// weight is zero each position counts as weight 1 instead.
///
/// # Panics
///
/// Panics if `weights` is empty.
pub fn select_candidate<R: Rng + ?Sized>(weights: &[u64], rng: &mut R) -> usize {
    assert!(!weights.is_empty(), "cannot select from an empty domain");
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return rng.gen_range(0..weights.len());
    }
    let mut draw = rng.gen_range(0..total);
    for (position, &weight) in weights.iter().enumerate() {
        if draw < weight {
            return position;
        }
        draw -= weight;
    }
    // Unreachable: draw < total.
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_weights_never_selected() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let choice = select_candidate(&[0, 3, 0, 1], &mut rng);
            assert!(choice == 1 || choice == 3);
        }
    }

    #[test]
    fn test_all_zero_falls_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [0usize; 3];
        for _ in 0..3000 {
            seen[select_candidate(&[0, 0, 0], &mut rng)] += 1;
        }
        assert!(seen.iter().all(|&count| count > 800), "{seen:?}");
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let weights = [1u64, 2, 5];
        let mut seen = [0usize; 3];
        let draws = 20_000;
        for _ in 0..draws {
            seen[select_candidate(&weights, &mut rng)] += 1;
        }
        for (count, weight) in seen.iter().zip(weights) {
            let observed = *count as f64 / draws as f64;
            let expected = weight as f64 / 8.0;
            assert!((observed - expected).abs() < 0.02, "{observed} vs {expected}");
        }
    }

    #[test]
    #[should_panic(expected = "empty domain")]
    fn test_empty_panics() {
        let mut rng = StdRng::seed_from_u64(0);
        select_candidate(&[], &mut rng);
    }
}
