pub mod edges;
pub mod feature_extractor;
pub mod filters;

pub use feature_extractor::{FeatureExtractor, ImageStatistic, PreparedImage};
