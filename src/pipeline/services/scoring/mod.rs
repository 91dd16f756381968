pub mod condition_scorer;
pub mod context_adjuster;

pub use condition_scorer::ConditionScorer;
pub use context_adjuster::ContextAdjuster;
