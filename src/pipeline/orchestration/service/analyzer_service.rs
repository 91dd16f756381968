use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::common::Locale;
use crate::config::Settings;
use crate::error::AnalysisError;
use crate::intake::{ImageKind, LoadedImage};
use crate::pipeline::orchestration::pipeline_orchestrator::DentalAnalyzer;
use crate::pipeline::types::{AnalysisReport, FailureReason, PatientContext};
use chrono::{DateTime, Utc};
use futures::Future;
use futures::future::join_all;
use futures::task::Context;
use futures::task::Poll;
use serde::Serialize;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::warn;
use uuid::Uuid;

/// One image to analyze, with optional patient context.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub request_id: Uuid,
    pub source: String,
    pub kind: ImageKind,
    pub image: Arc<image::DynamicImage>,
    pub patient: Option<PatientContext>,
}

impl AnalysisRequest {
    pub fn new(loaded: LoadedImage) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            source: loaded.source,
            kind: loaded.kind,
            image: Arc::new(loaded.image),
            patient: None,
        }
    }

    pub fn with_patient(mut self, patient: PatientContext) -> Self {
        self.patient = Some(patient);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub request_id: Uuid,
    pub source: String,
    pub kind: ImageKind,
    pub analyzed_at: DateTime<Utc>,
    pub report: AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AnalyzerService {
    inner: Arc<DentalAnalyzer>,
}

impl AnalyzerService {
    pub fn new(inner: DentalAnalyzer) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl Service<AnalysisRequest> for AnalyzerService {
    type Response = BatchEntry;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AnalysisRequest) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let AnalysisRequest {
                request_id,
                source,
                kind,
                image,
                patient,
            } = req;

            // The pipeline is CPU-bound and synchronous.
            let report = tokio::task::spawn_blocking(move || match patient {
                Some(patient) => inner.analyze_with_context(&image, &patient),
                None => inner.analyze(&image),
            })
            .await
            .map_err(|e| AnalysisError::Service(e.to_string()))?;

            Ok::<_, BoxError>(BatchEntry {
                request_id,
                source,
                kind,
                analyzed_at: Utc::now(),
                report,
                error: None,
            })
        })
    }
}

pub type BoxedAnalyzer = BoxCloneService<AnalysisRequest, BatchEntry, BoxError>;

pub struct AnalyzerServiceBuilder {
    analyzer: DentalAnalyzer,
    timeout: Option<Duration>,
    concurrency_limit: Option<usize>,
}

impl AnalyzerServiceBuilder {
    pub fn new(analyzer: DentalAnalyzer) -> Self {
        Self {
            analyzer,
            timeout: None,
            concurrency_limit: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AnalysisError> {
        let mut builder = Self::new(DentalAnalyzer::new(settings)?);
        builder.timeout = settings.service.timeout_ms.map(Duration::from_millis);
        builder.concurrency_limit = settings.service.concurrency_limit;
        Ok(builder)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    pub fn build(self) -> BatchAnalyzer {
        let locale = self.analyzer.locale();
        let service = ServiceBuilder::new()
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .option_layer(self.concurrency_limit.map(ConcurrencyLimitLayer::new))
            .service(AnalyzerService::new(self.analyzer));

        BatchAnalyzer {
            service: BoxCloneService::new(service),
            locale,
        }
    }
}

/// Fans a batch of requests out over the layered analyzer service.
#[derive(Clone)]
pub struct BatchAnalyzer {
    service: BoxedAnalyzer,
    locale: Locale,
}

impl BatchAnalyzer {
    pub async fn analyze(&self, request: AnalysisRequest) -> BatchEntry {
        let mut service = self.service.clone();
        let request_id = request.request_id;
        let source = request.source.clone();
        let kind = request.kind;

        let outcome = match service.ready().await {
            Ok(ready) => ready.call(request).await,
            Err(e) => Err(e),
        };

        outcome.unwrap_or_else(|e| {
            let error = service_error(e);
            warn!("Request {} for {} failed: {}", request_id, source, error);
            BatchEntry {
                request_id,
                source,
                kind,
                analyzed_at: Utc::now(),
                report: AnalysisReport::failed(FailureReason::from(&error), self.locale),
                error: Some(error.to_string()),
            }
        })
    }

    /// Entries come back in request order regardless of completion order.
    pub async fn analyze_batch(&self, requests: Vec<AnalysisRequest>) -> Vec<BatchEntry> {
        join_all(requests.into_iter().map(|request| self.analyze(request))).await
    }
}

fn service_error(error: BoxError) -> AnalysisError {
    if error.is::<Elapsed>() {
        return AnalysisError::Timeout;
    }
    match error.downcast::<AnalysisError>() {
        Ok(analysis_error) => *analysis_error,
        Err(other) => AnalysisError::Service(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Luma};

    use super::*;

    fn request(size: u32) -> AnalysisRequest {
        let image = DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |x, y| {
            Luma([((x * 5 + y * 11) % 256) as u8])
        }));
        AnalysisRequest::new(LoadedImage {
            image,
            kind: ImageKind::Photograph,
            source: format!("scan-{size}.png"),
        })
    }

    #[tokio::test]
    async fn test_analyzer_service() {
        let mut service = AnalyzerService::new(DentalAnalyzer::default());
        let req = request(48);
        let request_id = req.request_id;

        let entry = service.call(req).await.unwrap();
        assert_eq!(entry.request_id, request_id);
        assert!(!entry.report.is_failure());
        assert!(entry.error.is_none());
    }

    #[tokio::test]
    async fn service_applies_patient_context() {
        let mut service = AnalyzerService::new(DentalAnalyzer::default());
        let patient = PatientContext::new(70).with_symptom("pain");

        let plain = service.call(request(48)).await.unwrap();
        let adjusted = service.call(request(48).with_patient(patient)).await.unwrap();

        assert!(adjusted.report.scores.measured_mean() <= plain.report.scores.measured_mean());
    }

    #[tokio::test]
    async fn batch_preserves_request_order() {
        let batch = AnalyzerServiceBuilder::new(DentalAnalyzer::default())
            .timeout(Duration::from_secs(30))
            .concurrency_limit(2)
            .build();

        let requests = vec![request(40), request(0), request(56), request(24)];
        let ids: Vec<Uuid> = requests.iter().map(|r| r.request_id).collect();
        let entries = batch.analyze_batch(requests).await;

        assert_eq!(
            entries.iter().map(|e| e.request_id).collect::<Vec<_>>(),
            ids
        );
        assert!(entries[1].report.is_failure());
        assert!(!entries[0].report.is_failure());
        assert!(!entries[2].report.is_failure());
    }

    #[tokio::test]
    async fn elapsed_request_becomes_timeout_fallback() {
        let batch = AnalyzerServiceBuilder::new(DentalAnalyzer::default())
            .timeout(Duration::ZERO)
            .build();

        let entry = batch.analyze(request(512)).await;
        assert!(entry.report.is_failure());
        assert_eq!(entry.error.as_deref(), Some("Analysis timed out"));
        assert!(matches!(
            entry.report.failure,
            Some(FailureReason::Internal(_))
        ));
    }

    #[test]
    fn service_errors_unwrap_to_analysis_errors() {
        let error = service_error(Box::new(AnalysisError::Service("joined".into())));
        assert!(matches!(error, AnalysisError::Service(_)));

        let error = service_error("boom".into());
        assert!(matches!(error, AnalysisError::Service(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn builder_reads_service_settings() {
        let batch = AnalyzerServiceBuilder::from_settings(&Settings::default())
            .unwrap()
            .build();
        let entry = batch.analyze(request(32)).await;
        assert!(entry.error.is_none());
    }
}
