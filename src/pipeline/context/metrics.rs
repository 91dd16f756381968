use std::time::Duration;

/// Stage timings collected while a scan moves through the pipeline
#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    extraction_duration: Option<Duration>,
    scoring_duration: Option<Duration>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_extraction_duration(&mut self, duration: Duration) {
        self.extraction_duration = Some(duration);
    }

    pub fn record_scoring_duration(&mut self, duration: Duration) {
        self.scoring_duration = Some(duration);
    }

    pub fn extraction_duration(&self) -> Option<Duration> {
        self.extraction_duration
    }

    pub fn scoring_duration(&self) -> Option<Duration> {
        self.scoring_duration
    }
}
