use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Feature computation failed: {0}")]
    FeatureComputation(String),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Malformed DICOM: {0}")]
    Dicom(String),
    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Analysis timed out")]
    Timeout,
    #[error("Analyzer service error: {0}")]
    Service(String),
}

impl AnalysisError {
    /// True for errors that describe the image itself rather than the environment.
    pub fn is_image_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidImage(_)
                | AnalysisError::Decode(_)
                | AnalysisError::UnsupportedFormat(_)
                | AnalysisError::Dicom(_)
                | AnalysisError::PayloadTooLarge { .. }
        )
    }
}
