use super::condition::Condition;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ops::{Index, IndexMut};

/// Per-condition scores for one scan. Every condition is always present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConditionScores {
    values: [f64; 6],
}

impl ConditionScores {
    pub fn zeroed() -> Self {
        Self::default()
    }

    fn slot(condition: Condition) -> usize {
        match condition {
            Condition::Cavity => 0,
            Condition::GumInflammation => 1,
            Condition::Plaque => 2,
            Condition::Erosion => 3,
            Condition::Sensitivity => 4,
            Condition::OverallHealth => 5,
        }
    }

    pub fn get(&self, condition: Condition) -> f64 {
        self.values[Self::slot(condition)]
    }

    pub fn set(&mut self, condition: Condition, value: f64) {
        self.values[Self::slot(condition)] = value;
    }

    /// Multiply one score in place.
    pub fn scale(&mut self, condition: Condition, factor: f64) {
        self[condition] *= factor;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Condition, f64)> + '_ {
        Condition::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Mean of the five measured scores, ignoring the aggregate.
    pub fn measured_mean(&self) -> f64 {
        let sum: f64 = Condition::MEASURED.iter().map(|c| self.get(*c)).sum();
        sum / Condition::MEASURED.len() as f64
    }

    /// Copy with every score clamped to [0, 1]. Applied before a result leaves the pipeline.
    pub fn clamped(&self) -> Self {
        let mut values = self.values;
        for value in values.iter_mut() {
            *value = value.clamp(0.0, 1.0);
        }
        Self { values }
    }

    pub fn is_within_unit_range(&self) -> bool {
        self.values.iter().all(|v| (0.0..=1.0).contains(v))
    }
}

impl Index<Condition> for ConditionScores {
    type Output = f64;

    fn index(&self, condition: Condition) -> &f64 {
        &self.values[Self::slot(condition)]
    }
}

impl IndexMut<Condition> for ConditionScores {
    fn index_mut(&mut self, condition: Condition) -> &mut f64 {
        &mut self.values[Self::slot(condition)]
    }
}

impl Serialize for ConditionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Condition::ALL.len()))?;
        for (condition, value) in self.iter() {
            map.serialize_entry(condition.key(), &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_all_six_keys_in_report_order() {
        let mut scores = ConditionScores::zeroed();
        scores[Condition::Cavity] = 0.5;
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(
            json,
            r#"{"cavity":0.5,"gum_inflammation":0.0,"plaque":0.0,"erosion":0.0,"sensitivity":0.0,"overall_health":0.0}"#
        );
    }

    #[test]
    fn clamped_pulls_aggregate_back_into_range() {
        let mut scores = ConditionScores::zeroed();
        scores.set(Condition::OverallHealth, 1.2);
        scores.set(Condition::Plaque, -0.1);
        assert!(!scores.is_within_unit_range());

        let clamped = scores.clamped();
        assert_eq!(clamped.get(Condition::OverallHealth), 1.0);
        assert_eq!(clamped.get(Condition::Plaque), 0.0);
        assert!(clamped.is_within_unit_range());
    }

    #[test]
    fn measured_mean_ignores_overall_health() {
        let mut scores = ConditionScores::zeroed();
        for condition in Condition::MEASURED {
            scores.set(condition, 0.5);
        }
        scores.set(Condition::OverallHealth, 0.0);
        assert_eq!(scores.measured_mean(), 0.5);
    }
}
