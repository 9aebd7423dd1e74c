//! Weighted score aggregation
//!
//! Category weights are relative. Each raw score is first normalised to
//! 0..100 by its assessment's maximum, then averaged by weight.

/// Running Σ(n·w) and Σ(w)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedScore {
    weighted_sum: f64,
    total_weight: f64,
}

impl WeightedScore {
    /// Add one normalised score with its category weight
    pub fn add(&mut self, normalized: f64, weight: f64) {
        if weight > 0.0 {
            self.weighted_sum += normalized * weight;
            self.total_weight += weight;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_weight <= 0.0
    }

    /// Σ(n·w)/Σ(w), or 0 with nothing accumulated
    pub fn value(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.weighted_sum / self.total_weight
        }
    }
}

/// Weighted average of `(normalised score, weight)` pairs
pub fn weighted_score<I>(entries: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut acc = WeightedScore::default();
    for (normalized, weight) in entries {
        acc.add(normalized, weight);
    }
    acc.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_categories() {
        // 80/100 at weight 1, 40/50 (= 80) at weight 3
        let score = weighted_score([(80.0, 1.0), (80.0, 3.0)]);
        assert!((score - 80.0).abs() < 1e-9);

        let score = weighted_score([(90.0, 1.0), (70.0, 3.0)]);
        assert!((score - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_scale_is_irrelevant() {
        let a = weighted_score([(60.0, 1.0), (100.0, 2.0)]);
        let b = weighted_score([(60.0, 10.0), (100.0, 20.0)]);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(weighted_score(Vec::<(f64, f64)>::new()), 0.0);
        assert_eq!(weighted_score([(90.0, 0.0)]), 0.0);
    }
}
