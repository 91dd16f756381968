use super::{
    advisory::Advisory,
    condition::{Condition, ScoreBand},
    condition_scores::ConditionScores,
};
use crate::{common::Locale, error::AnalysisError};
use serde::Serialize;

/// Why an analysis fell back to the all-zero result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    InvalidImage(String),
    FeatureComputation(String),
    Internal(String),
}

impl From<&AnalysisError> for FailureReason {
    fn from(error: &AnalysisError) -> Self {
        match error {
            AnalysisError::FeatureComputation(detail) => {
                FailureReason::FeatureComputation(detail.clone())
            }
            e if e.is_image_error() => FailureReason::InvalidImage(e.to_string()),
            e => FailureReason::Internal(e.to_string()),
        }
    }
}

/// Result handed to the presentation layer: scores plus ordered recommendations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub scores: ConditionScores,
    pub recommendations: Vec<String>,
    #[serde(skip)]
    pub advisories: Vec<Advisory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

/// One presentation row per condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionSummary {
    pub condition: Condition,
    pub name: &'static str,
    pub percent: u32,
    pub band: ScoreBand,
    pub band_label: &'static str,
}

impl AnalysisReport {
    pub fn completed(scores: ConditionScores, advisories: Vec<Advisory>, locale: Locale) -> Self {
        Self {
            scores: scores.clamped(),
            recommendations: advisories.iter().map(|a| a.render(locale)).collect(),
            advisories,
            failure: None,
        }
    }

    /// The all-or-nothing fallback: zero scores and a single retake message.
    pub fn failed(reason: FailureReason, locale: Locale) -> Self {
        let advisories = vec![Advisory::AnalysisFailed];
        Self {
            scores: ConditionScores::zeroed(),
            recommendations: advisories.iter().map(|a| a.render(locale)).collect(),
            advisories,
            failure: Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn condition_summaries(&self, locale: Locale) -> Vec<ConditionSummary> {
        self.scores
            .iter()
            .map(|(condition, score)| {
                let band = ScoreBand::from_score(score);
                ConditionSummary {
                    condition,
                    name: condition.display_name(locale),
                    percent: ScoreBand::percent(score),
                    band,
                    band_label: band.label(locale),
                }
            })
            .collect()
    }
}
