pub mod analyzer_service;

pub use analyzer_service::{
    AnalysisRequest, AnalyzerService, AnalyzerServiceBuilder, BatchAnalyzer, BatchEntry,
};
