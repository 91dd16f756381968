use crate::{
    config::{AgeBands, RecommendationConfig},
    pipeline::types::{Advisory, Condition, ConditionScores, PatientContext},
};

/// Condition checks in the order their advisories are emitted.
const CONDITION_ADVISORIES: [(Condition, Advisory); 6] = [
    (Condition::Cavity, Advisory::CavityCheck),
    (Condition::GumInflammation, Advisory::GumCare),
    (Condition::Plaque, Advisory::PlaqueHygiene),
    (Condition::Erosion, Advisory::ErosionDiet),
    (Condition::Sensitivity, Advisory::SensitiveToothpaste),
    (Condition::OverallHealth, Advisory::ComprehensiveExam),
];

pub struct RecommendationSynthesizer {
    config: RecommendationConfig,
    age_bands: AgeBands,
}

impl RecommendationSynthesizer {
    pub fn new(config: RecommendationConfig, age_bands: AgeBands) -> Self {
        Self { config, age_bands }
    }

    /// Ordered advisories for the given scores. Never empty; duplicates are kept.
    pub fn recommend(
        &self,
        scores: &ConditionScores,
        patient: Option<&PatientContext>,
    ) -> Vec<Advisory> {
        let mut advisories: Vec<Advisory> = CONDITION_ADVISORIES
            .iter()
            .filter(|(condition, _)| scores[*condition] < self.config.thresholds.get(*condition))
            .map(|(_, advisory)| *advisory)
            .collect();

        if let Some(patient) = patient {
            if patient.age > self.age_bands.senior_above {
                advisories.push(Advisory::SeniorCheckups);
            } else if patient.age < self.age_bands.minor_below {
                advisories.push(Advisory::YouthDietHygiene);
            }

            for symptom in &patient.symptoms {
                let lowered = symptom.to_lowercase();
                if contains_any(&lowered, &self.config.pain_keywords) {
                    advisories.push(Advisory::PainTemperature);
                }
                if contains_any(&lowered, &self.config.bleeding_keywords) {
                    advisories.push(Advisory::BleedingSoftBrush);
                }
            }
        }

        if advisories.is_empty() {
            advisories.push(Advisory::GoodHealth);
        }
        advisories
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| text.contains(k.to_lowercase().as_str()))
}

impl Default for RecommendationSynthesizer {
    fn default() -> Self {
        Self::new(RecommendationConfig::default(), AgeBands::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: f64) -> ConditionScores {
        let mut scores = ConditionScores::zeroed();
        for condition in Condition::ALL {
            scores.set(condition, value);
        }
        scores
    }

    #[test]
    fn high_scores_without_context_yield_single_fallback() {
        let advisories = RecommendationSynthesizer::default().recommend(&uniform(0.9), None);
        assert_eq!(advisories, vec![Advisory::GoodHealth]);
    }

    #[test]
    fn low_scores_follow_fixed_condition_order() {
        let advisories = RecommendationSynthesizer::default().recommend(&uniform(0.1), None);
        assert_eq!(
            advisories,
            vec![
                Advisory::CavityCheck,
                Advisory::GumCare,
                Advisory::PlaqueHygiene,
                Advisory::ErosionDiet,
                Advisory::SensitiveToothpaste,
                Advisory::ComprehensiveExam,
            ]
        );
    }

    #[test]
    fn thresholds_are_strict() {
        let mut scores = uniform(0.9);
        scores.set(Condition::Plaque, 0.6);
        scores.set(Condition::Cavity, 0.7);
        let advisories = RecommendationSynthesizer::default().recommend(&scores, None);
        assert_eq!(advisories, vec![Advisory::GoodHealth]);

        scores.set(Condition::Plaque, 0.59);
        let advisories = RecommendationSynthesizer::default().recommend(&scores, None);
        assert_eq!(advisories, vec![Advisory::PlaqueHygiene]);
    }

    #[test]
    fn age_advisories_follow_condition_advisories() {
        let synthesizer = RecommendationSynthesizer::default();
        let mut scores = uniform(0.9);
        scores.set(Condition::Erosion, 0.2);

        let senior = synthesizer.recommend(&scores, Some(&PatientContext::new(65)));
        assert_eq!(senior, vec![Advisory::ErosionDiet, Advisory::SeniorCheckups]);

        let minor = synthesizer.recommend(&uniform(0.9), Some(&PatientContext::new(10)));
        assert_eq!(minor, vec![Advisory::YouthDietHygiene]);

        let adult = synthesizer.recommend(&uniform(0.9), Some(&PatientContext::new(30)));
        assert_eq!(adult, vec![Advisory::GoodHealth]);
    }

    #[test]
    fn symptom_advisories_are_additive_and_not_deduplicated() {
        let patient = PatientContext::new(30)
            .with_symptom("Pain when biting")
            .with_symptom("pain and bleeding gums")
            .with_symptom("ألم");
        let advisories = RecommendationSynthesizer::default().recommend(&uniform(0.9), Some(&patient));

        assert_eq!(
            advisories,
            vec![
                Advisory::PainTemperature,
                Advisory::PainTemperature,
                Advisory::BleedingSoftBrush,
                Advisory::PainTemperature,
            ]
        );
    }
}
