pub mod image;
pub mod recommendation;
pub mod scoring;

pub use self::image::FeatureExtractor;
pub use recommendation::RecommendationSynthesizer;
pub use scoring::{ConditionScorer, ContextAdjuster};
