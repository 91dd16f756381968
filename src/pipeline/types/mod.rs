pub mod advisory;
pub mod condition;
pub mod condition_scores;
pub mod feature_set;
pub mod patient;
pub mod report;

pub use advisory::Advisory;
pub use condition::{Condition, ScoreBand};
pub use condition_scores::ConditionScores;
pub use feature_set::FeatureSet;
pub use patient::PatientContext;
pub use report::{AnalysisReport, ConditionSummary, FailureReason};
