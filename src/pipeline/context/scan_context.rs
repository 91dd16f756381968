use crate::pipeline::context::metrics::ScanMetrics;
use crate::pipeline::context::state::{ExtractedState, IngestedState, ProcessingState, ScoredState};
use crate::pipeline::types::{ConditionScores, FeatureSet};
use image::DynamicImage;
use std::time::{Duration, Instant};

// ScanContext with compile-time stage tracking via the state parameter
pub struct ScanContext<'a, S> {
    image: &'a DynamicImage,
    metrics: ScanMetrics,
    stage_start: Instant,
    state: S,
}

impl<'a, S: ProcessingState> ScanContext<'a, S> {
    pub fn image(&self) -> &'a DynamicImage {
        self.image
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    fn stage_elapsed(&self) -> Duration {
        self.stage_start.elapsed()
    }

    pub fn stage_name(&self) -> &'static str {
        S::state_name()
    }
}

impl<'a> ScanContext<'a, IngestedState> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self {
            image,
            metrics: ScanMetrics::new(),
            stage_start: Instant::now(),
            state: IngestedState,
        }
    }

    pub fn into_extracted(mut self, features: FeatureSet) -> ScanContext<'a, ExtractedState> {
        self.metrics.record_extraction_duration(self.stage_elapsed());
        ScanContext {
            image: self.image,
            metrics: self.metrics,
            stage_start: Instant::now(),
            state: ExtractedState { features },
        }
    }
}

impl<'a> ScanContext<'a, ExtractedState> {
    pub fn features(&self) -> &FeatureSet {
        &self.state.features
    }

    pub fn into_scored(mut self, scores: ConditionScores) -> ScanContext<'a, ScoredState> {
        self.metrics.record_scoring_duration(self.stage_elapsed());
        ScanContext {
            image: self.image,
            metrics: self.metrics,
            stage_start: Instant::now(),
            state: ScoredState {
                features: self.state.features,
                scores,
            },
        }
    }
}

impl<'a> ScanContext<'a, ScoredState> {
    pub fn features(&self) -> &FeatureSet {
        &self.state.features
    }

    pub fn scores(&self) -> &ConditionScores {
        &self.state.scores
    }
}
