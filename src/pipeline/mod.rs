pub mod context;
pub mod orchestration;
pub mod services;
pub mod types;

pub use orchestration::{AnalysisRequest, AnalyzerServiceBuilder, BatchAnalyzer, BatchEntry, DentalAnalyzer};
pub use types::{AnalysisReport, Condition, ConditionScores, FeatureSet, PatientContext};
