use crate::pipeline::types::{ConditionScores, FeatureSet};

// Markers to track how far a scan has progressed through the pipeline
pub struct IngestedState;
pub struct ExtractedState {
    pub(super) features: FeatureSet,
}
pub struct ScoredState {
    pub(super) features: FeatureSet,
    pub(super) scores: ConditionScores,
}

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for IngestedState {
    fn state_name() -> &'static str {
        "Ingested"
    }
}

impl ProcessingState for ExtractedState {
    fn state_name() -> &'static str {
        "Extracted"
    }
}

impl ProcessingState for ScoredState {
    fn state_name() -> &'static str {
        "Scored"
    }
}
