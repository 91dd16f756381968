use crate::{
    config::ScoringConfig,
    pipeline::types::{Condition, ConditionScores, FeatureSet},
};

/// Maps image statistics to per-condition scores. Each score is a capped
/// monotonic transform of a single feature.
pub struct ConditionScorer {
    config: ScoringConfig,
}

impl ConditionScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, features: &FeatureSet) -> ConditionScores {
        let cavity = (features.contour_count / self.config.contour_divisor).min(1.0);
        let gum_inflammation = (features.edge_density * self.config.edge_gain).min(1.0);
        let plaque = (features.high_frequency_residual * self.config.residual_gain).min(1.0);
        let erosion = (features.local_variance_magnitude * self.config.variance_gain).min(1.0);
        let sensitivity = (cavity + erosion) / 2.0;

        // The aggregate deliberately takes the unscaled edge ratio, not the gum score.
        let aggregate = [
            cavity,
            features.edge_density,
            plaque,
            erosion,
            sensitivity,
        ];
        let overall_health = 1.0 - aggregate.iter().sum::<f64>() / aggregate.len() as f64;

        let mut scores = ConditionScores::zeroed();
        scores.set(Condition::Cavity, cavity);
        scores.set(Condition::GumInflammation, gum_inflammation);
        scores.set(Condition::Plaque, plaque);
        scores.set(Condition::Erosion, erosion);
        scores.set(Condition::Sensitivity, sensitivity);
        scores.set(Condition::OverallHealth, overall_health);
        scores
    }
}

impl Default for ConditionScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn features(contours: f64, edges: f64, residual: f64, variance: f64) -> FeatureSet {
        FeatureSet::new(contours, edges, residual, variance).unwrap()
    }

    #[test]
    fn reference_feature_set_scores() {
        let scores = ConditionScorer::default().score(&features(80.0, 0.05, 0.3, 0.4));

        assert!((scores[Condition::Cavity] - 0.8).abs() < EPSILON);
        assert!((scores[Condition::GumInflammation] - 0.1).abs() < EPSILON);
        assert!((scores[Condition::Plaque] - 0.6).abs() < EPSILON);
        assert!((scores[Condition::Erosion] - 0.8).abs() < EPSILON);
        assert!((scores[Condition::Sensitivity] - 0.8).abs() < EPSILON);

        let expected = 1.0 - (0.8 + 0.05 + 0.6 + 0.8 + 0.8) / 5.0;
        assert!((scores[Condition::OverallHealth] - expected).abs() < EPSILON);
        assert!((scores[Condition::OverallHealth] - 0.39).abs() < 1e-9);
    }

    #[test]
    fn scores_saturate_at_one() {
        let scores = ConditionScorer::default().score(&features(500.0, 0.9, 3.0, 7.5));

        assert_eq!(scores[Condition::Cavity], 1.0);
        assert_eq!(scores[Condition::GumInflammation], 1.0);
        assert_eq!(scores[Condition::Plaque], 1.0);
        assert_eq!(scores[Condition::Erosion], 1.0);
        assert_eq!(scores[Condition::Sensitivity], 1.0);
        assert!(scores.is_within_unit_range());
    }

    #[test]
    fn sensitivity_is_exact_mean_of_cavity_and_erosion() {
        let scorer = ConditionScorer::default();
        for (c, v) in [(0.0, 0.0), (13.0, 0.07), (99.0, 0.49), (250.0, 0.123)] {
            let scores = scorer.score(&features(c, 0.2, 0.1, v));
            assert_eq!(
                scores[Condition::Sensitivity],
                (scores[Condition::Cavity] + scores[Condition::Erosion]) / 2.0
            );
        }
    }

    #[test]
    fn all_zero_features_mean_full_health() {
        let scores = ConditionScorer::default().score(&features(0.0, 0.0, 0.0, 0.0));
        assert_eq!(scores[Condition::OverallHealth], 1.0);
    }
}
