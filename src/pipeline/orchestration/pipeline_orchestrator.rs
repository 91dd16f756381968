/// Dental scan orchestrator: extraction, scoring, optional context adjustment, recommendations
use crate::{
    common::Locale,
    config::Settings,
    error::AnalysisError,
    pipeline::{
        context::{ScanContext, ScoredState},
        services::{ConditionScorer, ContextAdjuster, FeatureExtractor, RecommendationSynthesizer},
        types::{Advisory, AnalysisReport, ConditionScores, FailureReason, PatientContext},
    },
};
use image::DynamicImage;
use tracing::{debug, error, info};

/// Runs the scoring pipeline for one image at a time.
///
/// Holds only immutable configuration, so a single instance can be shared
/// across threads and called concurrently.
pub struct DentalAnalyzer {
    extractor: FeatureExtractor,
    scorer: ConditionScorer,
    adjuster: ContextAdjuster,
    synthesizer: RecommendationSynthesizer,
    locale: Locale,
}

impl DentalAnalyzer {
    pub fn new(settings: &Settings) -> Result<Self, AnalysisError> {
        settings.validate()?;

        Ok(Self {
            extractor: FeatureExtractor::new(&settings.extraction)?,
            scorer: ConditionScorer::new(settings.scoring.clone()),
            adjuster: ContextAdjuster::new(settings.adjustment.clone(), settings.age_bands),
            synthesizer: RecommendationSynthesizer::new(
                settings.recommendation.clone(),
                settings.age_bands,
            ),
            locale: settings.locale,
        })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Score an image on its own. Failures yield the fallback report.
    pub fn analyze(&self, image: &DynamicImage) -> AnalysisReport {
        match self.score_image(image) {
            Ok(scored) => {
                let advisories = self.synthesizer.recommend(scored.scores(), None);
                self.complete(&scored, *scored.scores(), advisories)
            }
            Err(e) => self.fallback(&e),
        }
    }

    /// Score an image, then re-weight the scores with the patient's context.
    pub fn analyze_with_context(
        &self,
        image: &DynamicImage,
        patient: &PatientContext,
    ) -> AnalysisReport {
        match self.score_image(image) {
            Ok(scored) => {
                let adjusted = self.adjuster.adjust(scored.scores(), patient);
                debug!("Context-adjusted scores: {:?}", adjusted);
                let advisories = self.synthesizer.recommend(&adjusted, Some(patient));
                self.complete(&scored, adjusted, advisories)
            }
            Err(e) => self.fallback(&e),
        }
    }

    fn score_image<'a>(
        &self,
        image: &'a DynamicImage,
    ) -> Result<ScanContext<'a, ScoredState>, AnalysisError> {
        let context = ScanContext::new(image);
        let features = self.extractor.extract(context.image())?;
        let context = context.into_extracted(features);

        let scores = self.scorer.score(context.features());
        Ok(context.into_scored(scores))
    }

    fn complete(
        &self,
        scored: &ScanContext<'_, ScoredState>,
        scores: ConditionScores,
        advisories: Vec<Advisory>,
    ) -> AnalysisReport {
        let report = AnalysisReport::completed(scores, advisories, self.locale);
        debug!("Scan context reached stage {}", scored.stage_name());
        info!(
            "Analysis completed for {}x{} image (extract {:?}, score {:?}): {} recommendation(s)",
            scored.image().width(),
            scored.image().height(),
            scored.metrics().extraction_duration().unwrap_or_default(),
            scored.metrics().scoring_duration().unwrap_or_default(),
            report.recommendations.len()
        );
        report
    }

    fn fallback(&self, error: &AnalysisError) -> AnalysisReport {
        error!("Image analysis failed: {}", error);
        AnalysisReport::failed(FailureReason::from(error), self.locale)
    }
}

impl Default for DentalAnalyzer {
    fn default() -> Self {
        Self {
            extractor: FeatureExtractor::default(),
            scorer: ConditionScorer::default(),
            adjuster: ContextAdjuster::default(),
            synthesizer: RecommendationSynthesizer::default(),
            locale: Locale::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Condition;
    use image::{ImageBuffer, Luma};

    fn gradient(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |x, y| {
            Luma([((x * 7 + y * 3) % 256) as u8])
        }))
    }

    #[test]
    fn zero_area_image_falls_back() {
        let report = DentalAnalyzer::default().analyze(&DynamicImage::new_rgb8(0, 0));

        assert!(matches!(report.failure, Some(FailureReason::InvalidImage(_))));
        assert!(report.scores.iter().all(|(_, v)| v == 0.0));
        assert_eq!(report.advisories, vec![Advisory::AnalysisFailed]);
    }

    #[test]
    fn context_entry_point_also_falls_back() {
        let patient = PatientContext::new(70).with_symptom("pain");
        let report =
            DentalAnalyzer::default().analyze_with_context(&DynamicImage::new_luma8(0, 5), &patient);

        assert!(report.is_failure());
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn analyze_is_idempotent() {
        let analyzer = DentalAnalyzer::default();
        let image = gradient(64);
        assert_eq!(analyzer.analyze(&image), analyzer.analyze(&image));
    }

    #[test]
    fn unadjusted_report_is_in_range_with_exact_sensitivity() {
        let report = DentalAnalyzer::default().analyze(&gradient(80));

        assert!(!report.is_failure());
        assert!(report.scores.is_within_unit_range());
        assert_eq!(
            report.scores[Condition::Sensitivity],
            (report.scores[Condition::Cavity] + report.scores[Condition::Erosion]) / 2.0
        );
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn adjusted_aggregate_is_mean_of_measured_scores() {
        let patient = PatientContext::new(45).with_visit_reason("bleeding gums");
        let report = DentalAnalyzer::default().analyze_with_context(&gradient(64), &patient);

        assert_eq!(
            report.scores[Condition::OverallHealth],
            report.scores.measured_mean()
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.extraction.background_kernel = 0;
        assert!(DentalAnalyzer::new(&settings).is_err());
    }
}
