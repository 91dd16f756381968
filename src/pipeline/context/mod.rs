pub mod metrics;
pub mod scan_context;
pub mod state;

pub use metrics::ScanMetrics;
pub use scan_context::ScanContext;
pub use state::{ExtractedState, IngestedState, ProcessingState, ScoredState};
