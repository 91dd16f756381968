pub mod pipeline_orchestrator;
pub mod service;

pub use pipeline_orchestrator::DentalAnalyzer;
pub use service::{AnalysisRequest, AnalyzerServiceBuilder, BatchAnalyzer, BatchEntry};
