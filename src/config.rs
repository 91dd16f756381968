use crate::common::Locale;
use crate::error::AnalysisError;
use crate::pipeline::types::Condition;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::Level;

const ENV_PREFIX: &str = "DENTASCAN";

/// Top-level settings. Every field defaults to the calibrated constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extraction: ExtractionConfig,
    pub scoring: ScoringConfig,
    pub age_bands: AgeBands,
    pub adjustment: AdjustmentConfig,
    pub recommendation: RecommendationConfig,
    pub loader: LoaderConfig,
    pub service: ServiceConfig,
    pub locale: Locale,
    pub log_level: String,
}

/// Image statistic parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub smoothing_kernel: u32,
    pub background_kernel: u32,
    pub edge_low_threshold: f32,
    pub edge_high_threshold: f32,
    pub statistic_normalizer: f64,
}

/// Calibration constants mapping features to condition scores.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub contour_divisor: f64,
    pub edge_gain: f64,
    pub residual_gain: f64,
    pub variance_gain: f64,
}

/// Strict bounds: a patient is a senior above `senior_above` and a minor below `minor_below`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AgeBands {
    pub senior_above: u32,
    pub minor_below: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionFactor {
    pub condition: Condition,
    pub factor: f64,
}

/// A visit-reason rule: fires when the lowercased reason contains any keyword.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub factors: Vec<ConditionFactor>,
}

impl KeywordRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| lowered.contains(k.to_lowercase().as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    pub symptom_factor: f64,
    pub age_factor: f64,
    /// Exact symptom token to the conditions it implicates.
    pub symptom_conditions: IndexMap<String, Vec<Condition>>,
    /// Checked in order; the first matching rule wins for each reason.
    pub reason_rules: Vec<KeywordRule>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ConditionThresholds {
    pub cavity: f64,
    pub gum_inflammation: f64,
    pub plaque: f64,
    pub erosion: f64,
    pub sensitivity: f64,
    pub overall_health: f64,
}

impl ConditionThresholds {
    pub fn get(&self, condition: Condition) -> f64 {
        match condition {
            Condition::Cavity => self.cavity,
            Condition::GumInflammation => self.gum_inflammation,
            Condition::Plaque => self.plaque,
            Condition::Erosion => self.erosion,
            Condition::Sensitivity => self.sensitivity,
            Condition::OverallHealth => self.overall_health,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub thresholds: ConditionThresholds,
    pub pain_keywords: Vec<String>,
    pub bleeding_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub timeout_ms: Option<u64>,
    pub concurrency_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            scoring: ScoringConfig::default(),
            age_bands: AgeBands::default(),
            adjustment: AdjustmentConfig::default(),
            recommendation: RecommendationConfig::default(),
            loader: LoaderConfig::default(),
            service: ServiceConfig::default(),
            locale: Locale::English,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            smoothing_kernel: 5,
            background_kernel: 15,
            edge_low_threshold: 100.0,
            edge_high_threshold: 200.0,
            statistic_normalizer: 128.0,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            contour_divisor: 100.0,
            edge_gain: 2.0,
            residual_gain: 2.0,
            variance_gain: 2.0,
        }
    }
}

impl Default for AgeBands {
    fn default() -> Self {
        Self {
            senior_above: 60,
            minor_below: 18,
        }
    }
}

fn factors(pairs: &[(Condition, f64)]) -> Vec<ConditionFactor> {
    pairs
        .iter()
        .map(|&(condition, factor)| ConditionFactor { condition, factor })
        .collect()
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        use Condition::*;

        // English tokens first, then the Arabic intake-form tokens.
        let table: [(&str, Vec<Condition>); 12] = [
            ("pain", vec![Cavity, Sensitivity]),
            ("bleeding", vec![GumInflammation]),
            ("sensitivity", vec![Sensitivity, Erosion]),
            ("swelling", vec![GumInflammation]),
            ("odor", vec![Plaque, GumInflammation]),
            ("discoloration", vec![Cavity, Erosion]),
            ("ألم", vec![Cavity, Sensitivity]),
            ("نزيف", vec![GumInflammation]),
            ("حساسية", vec![Sensitivity, Erosion]),
            ("تورم", vec![GumInflammation]),
            ("رائحة", vec![Plaque, GumInflammation]),
            ("تغير لون", vec![Cavity, Erosion]),
        ];

        Self {
            symptom_factor: 0.8,
            age_factor: 0.9,
            symptom_conditions: table
                .into_iter()
                .map(|(token, conditions)| (token.to_string(), conditions))
                .collect(),
            reason_rules: vec![
                KeywordRule {
                    keywords: words(&["pain", "ألم"]),
                    factors: factors(&[(Cavity, 0.8), (Sensitivity, 0.8)]),
                },
                KeywordRule {
                    keywords: words(&["bleeding", "نزيف"]),
                    factors: factors(&[(GumInflammation, 0.7)]),
                },
                KeywordRule {
                    keywords: words(&["odor", "رائحة"]),
                    factors: factors(&[(Plaque, 0.8), (GumInflammation, 0.8)]),
                },
            ],
        }
    }
}

impl Default for ConditionThresholds {
    fn default() -> Self {
        Self {
            cavity: 0.7,
            gum_inflammation: 0.7,
            plaque: 0.6,
            erosion: 0.7,
            sensitivity: 0.7,
            overall_health: 0.6,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            thresholds: ConditionThresholds::default(),
            pain_keywords: words(&["pain", "ألم"]),
            bleeding_keywords: words(&["bleeding", "نزيف"]),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: words(&[
                "png", "jpg", "jpeg", "gif", "bmp", "dcm", "tif", "tiff",
            ]),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(30_000),
            concurrency_limit: Some(4),
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        for (name, kernel) in [
            ("smoothing_kernel", self.smoothing_kernel),
            ("background_kernel", self.background_kernel),
        ] {
            if kernel == 0 || kernel % 2 == 0 {
                return invalid(format!("{name} must be a positive odd size, got {kernel}"));
            }
        }

        if self.edge_low_threshold > self.edge_high_threshold {
            return invalid("edge_low_threshold must not exceed edge_high_threshold".to_string());
        }

        if self.statistic_normalizer <= 0.0 {
            return invalid("statistic_normalizer must be positive".to_string());
        }

        Ok(())
    }
}

impl Settings {
    /// Load settings from an optional file plus `DENTASCAN__*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, AnalysisError> {
        let mut builder = config::Config::builder();
        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("dentascan").required(false)),
        };
        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        self.extraction.validate()?;

        if self.scoring.contour_divisor <= 0.0 {
            return invalid("contour_divisor must be positive".to_string());
        }

        let mut factors = vec![
            ("symptom_factor", self.adjustment.symptom_factor),
            ("age_factor", self.adjustment.age_factor),
        ];
        for rule in &self.adjustment.reason_rules {
            factors.extend(rule.factors.iter().map(|f| ("reason factor", f.factor)));
        }
        if let Some((name, value)) = factors.iter().find(|(_, f)| !(*f > 0.0 && *f <= 1.0)) {
            return invalid(format!("{name} must be in (0, 1], got {value}"));
        }

        if self.service.concurrency_limit == Some(0) {
            return invalid("concurrency_limit must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.adjustment.symptom_conditions.len(), 12);
        assert_eq!(settings.recommendation.thresholds.get(Condition::Plaque), 0.6);
        assert_eq!(settings.log_level(), Level::INFO);
    }

    #[test]
    fn rejects_even_kernel() {
        let mut settings = Settings::default();
        settings.extraction.smoothing_kernel = 4;
        assert!(matches!(
            settings.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_amplifying_factor() {
        let mut settings = Settings::default();
        settings.adjustment.symptom_factor = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn keyword_rule_matches_substring() {
        let rules = AdjustmentConfig::default().reason_rules;
        assert!(rules[0].matches("tooth pain at night"));
        assert!(!rules[0].matches("routine checkup"));
    }

    #[test]
    fn deserializes_partial_overrides() {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(
                "locale = \"ar\"\n[scoring]\ncontour_divisor = 50.0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.locale, Locale::Arabic);
        assert_eq!(settings.scoring.contour_divisor, 50.0);
        assert_eq!(settings.scoring.edge_gain, 2.0);
        assert_eq!(settings.extraction.background_kernel, 15);
    }
}
