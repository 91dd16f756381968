pub mod common;
pub mod config;
pub mod error;
pub mod intake;
pub mod pipeline;

pub use common::Locale;
pub use config::Settings;
pub use error::AnalysisError;
pub use intake::{ImageKind, ImageLoader};
pub use pipeline::{
    AnalysisReport, AnalysisRequest, AnalyzerServiceBuilder, BatchAnalyzer, BatchEntry, Condition,
    ConditionScores, DentalAnalyzer, FeatureSet, PatientContext,
};
