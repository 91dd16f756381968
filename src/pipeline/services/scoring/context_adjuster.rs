use crate::{
    config::{AdjustmentConfig, AgeBands},
    pipeline::types::{Condition, ConditionScores, PatientContext},
};
use tracing::debug;

/// Re-weights image-derived scores using what the patient reported.
///
/// Unknown symptoms and reasons are ignored; adjustment never fails.
pub struct ContextAdjuster {
    config: AdjustmentConfig,
    age_bands: AgeBands,
}

impl ContextAdjuster {
    pub fn new(config: AdjustmentConfig, age_bands: AgeBands) -> Self {
        Self { config, age_bands }
    }

    pub fn adjust(&self, scores: &ConditionScores, patient: &PatientContext) -> ConditionScores {
        let mut adjusted = *scores;

        self.apply_symptoms(&mut adjusted, patient);
        self.apply_age(&mut adjusted, patient.age);
        self.apply_visit_reasons(&mut adjusted, patient);

        // Full recomputation over the adjusted scores, not the scorer's aggregate.
        adjusted.set(Condition::OverallHealth, adjusted.measured_mean());
        adjusted
    }

    fn apply_symptoms(&self, scores: &mut ConditionScores, patient: &PatientContext) {
        for symptom in &patient.symptoms {
            let Some(conditions) = self.config.symptom_conditions.get(symptom) else {
                continue;
            };
            debug!("Symptom '{}' dampens {:?}", symptom, conditions);
            for &condition in conditions {
                let current = scores[condition];
                scores[condition] = (current * self.config.symptom_factor).min(current);
            }
        }
    }

    fn apply_age(&self, scores: &mut ConditionScores, age: u32) {
        let factor = self.config.age_factor;
        if age > self.age_bands.senior_above {
            scores.scale(Condition::GumInflammation, factor);
            scores.scale(Condition::Erosion, factor);
        } else if age < self.age_bands.minor_below {
            scores.scale(Condition::Cavity, factor);
        }
    }

    fn apply_visit_reasons(&self, scores: &mut ConditionScores, patient: &PatientContext) {
        for reason in &patient.visit_reasons {
            let lowered = reason.to_lowercase();
            if let Some(rule) = self.config.reason_rules.iter().find(|r| r.matches(&lowered)) {
                for factor in &rule.factors {
                    scores.scale(factor.condition, factor.factor);
                }
            }
        }
    }
}

impl Default for ContextAdjuster {
    fn default() -> Self {
        Self::new(AdjustmentConfig::default(), AgeBands::default())
    }
}
