pub mod synthesizer;

pub use synthesizer::RecommendationSynthesizer;
