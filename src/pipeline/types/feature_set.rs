use crate::error::AnalysisError;
use serde::Serialize;

/// Scalar statistics extracted from one grayscale scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSet {
    /// Outer contours of the Otsu-binarized image.
    pub contour_count: f64,
    /// Fraction of pixels flagged as edges, in [0, 1].
    pub edge_density: f64,
    /// Std-dev of the image minus its heavy blur, normalized by 128.
    pub high_frequency_residual: f64,
    /// Std-dev of the Laplacian response, normalized by 128.
    pub local_variance_magnitude: f64,
}

impl FeatureSet {
    pub fn new(
        contour_count: f64,
        edge_density: f64,
        high_frequency_residual: f64,
        local_variance_magnitude: f64,
    ) -> Result<Self, AnalysisError> {
        let features = Self {
            contour_count,
            edge_density,
            high_frequency_residual,
            local_variance_magnitude,
        };
        features.validate()?;
        Ok(features)
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let named = [
            ("contour_count", self.contour_count),
            ("edge_density", self.edge_density),
            ("high_frequency_residual", self.high_frequency_residual),
            ("local_variance_magnitude", self.local_variance_magnitude),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::FeatureComputation(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }
        if self.edge_density > 1.0 {
            return Err(AnalysisError::FeatureComputation(format!(
                "edge_density is a ratio, got {}",
                self.edge_density
            )));
        }
        Ok(())
    }
}
