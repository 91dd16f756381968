use crate::common::{Locale, LocalizedText};
use serde::{Deserialize, Serialize};

/// The fixed set of diagnostic categories a scan is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Cavity,
    GumInflammation,
    Plaque,
    Erosion,
    Sensitivity,
    OverallHealth,
}

impl Condition {
    /// All conditions in report order.
    pub const ALL: [Condition; 6] = [
        Condition::Cavity,
        Condition::GumInflammation,
        Condition::Plaque,
        Condition::Erosion,
        Condition::Sensitivity,
        Condition::OverallHealth,
    ];

    /// The five directly scored conditions, excluding the aggregate.
    pub const MEASURED: [Condition; 5] = [
        Condition::Cavity,
        Condition::GumInflammation,
        Condition::Plaque,
        Condition::Erosion,
        Condition::Sensitivity,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Condition::Cavity => "cavity",
            Condition::GumInflammation => "gum_inflammation",
            Condition::Plaque => "plaque",
            Condition::Erosion => "erosion",
            Condition::Sensitivity => "sensitivity",
            Condition::OverallHealth => "overall_health",
        }
    }

    pub fn display_name(&self, locale: Locale) -> &'static str {
        let text = match self {
            Condition::Cavity => LocalizedText::new("Cavity", "تسوس"),
            Condition::GumInflammation => LocalizedText::new("Gum inflammation", "التهاب لثة"),
            Condition::Plaque => LocalizedText::new("Plaque buildup", "تراكم البلاك"),
            Condition::Erosion => LocalizedText::new("Enamel erosion", "تآكل المينا"),
            Condition::Sensitivity => LocalizedText::new("Tooth sensitivity", "حساسية الأسنان"),
            Condition::OverallHealth => LocalizedText::new("Overall health", "الصحة العامة"),
        };
        text.get(locale)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Qualitative grading of a score for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Acceptable,
    Moderate,
    Severe,
}

impl ScoreBand {
    pub fn percent(score: f64) -> u32 {
        (score.clamp(0.0, 1.0) * 100.0).floor() as u32
    }

    pub fn from_score(score: f64) -> Self {
        match Self::percent(score) {
            80.. => ScoreBand::Severe,
            60..=79 => ScoreBand::Moderate,
            40..=59 => ScoreBand::Acceptable,
            _ => ScoreBand::Good,
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        let text = match self {
            ScoreBand::Good => LocalizedText::new("Good", "جيد"),
            ScoreBand::Acceptable => LocalizedText::new("Acceptable", "مقبول"),
            ScoreBand::Moderate => LocalizedText::new("Moderate", "متوسط"),
            ScoreBand::Severe => LocalizedText::new("Severe", "خطير"),
        };
        text.get(locale)
    }
}
