//! Scoring primitives shared by both model families
//!
//! The linkage model is scored in bits (entropy plus table cost); decision
//! tree leaves are scored with the natural-log Bayesian marginal likelihood
//! of a Bernoulli variable under a uniform Beta(1, 1) prior.

use std::collections::BTreeMap;

use statrs::function::gamma::ln_gamma;

/// Precomputed `ln Γ(k)` for integer `k`
///
/// Only counts are ever looked up, so the table depends on nothing but the
/// population size and can live for the whole run.
#[derive(Clone, Debug)]
pub struct LogGammaTable {
    values: Vec<f64>,
}

impl LogGammaTable {
    /// Table covering every count a leaf over `max_count` samples can produce
    pub fn new(max_count: usize) -> Self {
        // leaf_score reaches up to ln Γ(max_count + 2)
        let values = (0..=max_count + 2)
            .map(|k| if k == 0 { f64::INFINITY } else { ln_gamma(k as f64) })
            .collect();
        Self { values }
    }

    /// Largest count that is served from the table
    pub fn capacity(&self) -> usize {
        self.values.len().saturating_sub(3)
    }

    /// `ln Γ(k)`; counts beyond the table are computed directly
    pub fn ln_gamma(&self, k: usize) -> f64 {
        match self.values.get(k) {
            Some(&v) => v,
            None => ln_gamma(k as f64),
        }
    }

    /// Bayesian marginal log-likelihood of `n1` ones among `n` samples
    ///
    /// `ln Γ(1 + n1) + ln Γ(1 + n - n1) - ln Γ(2 + n)`. Defined for the
    /// degenerate cases `n1 == 0` and `n1 == n` as well; an empty leaf
    /// scores exactly 0.
    pub fn leaf_score(&self, n: usize, n1: usize) -> f64 {
        debug_assert!(n1 <= n, "more ones ({n1}) than samples ({n})");
        self.ln_gamma(1 + n1) + self.ln_gamma(1 + n - n1) - self.ln_gamma(2 + n)
    }
}

/// Coding length of a partition's observed patterns, in bits
///
/// Shannon entropy of the empirical joint distribution multiplied by the
/// number of samples. A partition whose patterns are all identical costs
/// exactly 0.
pub fn entropy(counts: &BTreeMap<Vec<bool>, usize>, samples: usize) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    let n = samples as f64;
    let per_sample = counts.values().fold(0.0, |acc, &c| {
        if c == 0 || c == samples {
            acc
        } else {
            let p = c as f64 / n;
            acc - p * p.log2()
        }
    });
    per_sample * n
}

/// Cost of storing a full joint table over `size` binary variables
///
/// `(2^size - 1) * log2(N + 1)` for `N` samples.
pub fn complexity(size: usize, samples: usize) -> f64 {
    (2f64.powi(size as i32) - 1.0) * ((samples + 1) as f64).log2()
}

/// Minimum description length of a partition: entropy plus complexity
pub fn description_length(counts: &BTreeMap<Vec<bool>, usize>, size: usize, samples: usize) -> f64 {
    entropy(counts, samples) + complexity(size, samples)
}

/// Structural cost charged for every decision-tree split
///
/// `log2(N)` for a parent set of `N` genomes.
pub fn default_split_penalty(samples: usize) -> f64 {
    if samples < 2 {
        return 0.0;
    }
    (samples as f64).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(entries: &[(&[bool], usize)]) -> BTreeMap<Vec<bool>, usize> {
        entries.iter().map(|(k, v)| (k.to_vec(), *v)).collect()
    }

    #[test]
    fn test_log_gamma_table_matches_factorials() {
        let table = LogGammaTable::new(10);
        assert_eq!(table.capacity(), 10);
        assert_eq!(table.ln_gamma(1), 0.0);
        assert_relative_eq!(table.ln_gamma(5), 24f64.ln(), epsilon = 1e-12);
        // Served past the end of the table
        assert_relative_eq!(table.ln_gamma(40), ln_gamma(40.0), epsilon = 1e-9);
    }

    #[test]
    fn test_leaf_score_all_zero_leaf() {
        let table = LogGammaTable::new(2);
        let expected = ln_gamma(1.0) + ln_gamma(3.0) - ln_gamma(4.0);
        assert_eq!(table.leaf_score(2, 0), expected);
        assert_relative_eq!(table.leaf_score(2, 0), -(3f64.ln()), epsilon = 1e-12);
    }

    #[test]
    fn test_leaf_score_symmetry_and_empty_leaf() {
        let table = LogGammaTable::new(20);
        assert_eq!(table.leaf_score(20, 0), table.leaf_score(20, 20));
        assert_relative_eq!(table.leaf_score(20, 7), table.leaf_score(20, 13), epsilon = 1e-12);
        assert_eq!(table.leaf_score(0, 0), 0.0);
        // A pure leaf is more likely than a mixed one
        assert!(table.leaf_score(20, 0) > table.leaf_score(20, 10));
    }

    #[test]
    fn test_entropy_deterministic_partition_is_zero() {
        let c = counts(&[(&[true, false], 8)]);
        assert_eq!(entropy(&c, 8), 0.0);
        assert!(entropy(&c, 8).is_sign_positive());
    }

    #[test]
    fn test_entropy_scales_with_samples() {
        let c = counts(&[(&[false], 2), (&[true], 2)]);
        assert_relative_eq!(entropy(&c, 4), 4.0, epsilon = 1e-12);

        let c = counts(&[(&[false, false], 1), (&[false, true], 1), (&[true, false], 1), (&[true, true], 1)]);
        assert_relative_eq!(entropy(&c, 4), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_complexity() {
        assert_relative_eq!(complexity(1, 3), 2.0, epsilon = 1e-12);
        assert_relative_eq!(complexity(2, 3), 6.0, epsilon = 1e-12);
        assert_relative_eq!(complexity(3, 7), 21.0, epsilon = 1e-12);
    }

    #[test]
    fn test_description_length_sums_terms() {
        let c = counts(&[(&[false], 2), (&[true], 2)]);
        assert_relative_eq!(
            description_length(&c, 1, 4),
            4.0 + 5f64.log2(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_default_split_penalty() {
        assert_relative_eq!(default_split_penalty(1024), 10.0, epsilon = 1e-12);
        assert_relative_eq!(default_split_penalty(8), 3.0, epsilon = 1e-12);
        assert_eq!(default_split_penalty(1), 0.0);
    }
}
