use crate::common::{Locale, LocalizedText};
use serde::{Deserialize, Serialize};

/// Fixed advisory messages the recommendation step can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    CavityCheck,
    GumCare,
    PlaqueHygiene,
    ErosionDiet,
    SensitiveToothpaste,
    ComprehensiveExam,
    SeniorCheckups,
    YouthDietHygiene,
    PainTemperature,
    BleedingSoftBrush,
    GoodHealth,
    AnalysisFailed,
}

impl Advisory {
    fn text(&self) -> LocalizedText {
        match self {
            Advisory::CavityCheck => LocalizedText::new(
                "A dental visit is recommended to check for possible cavities.",
                "ينصح بزيارة طبيب الأسنان للكشف عن التسوس المحتمل",
            ),
            Advisory::GumCare => LocalizedText::new(
                "Use an antibacterial mouthwash and improve oral hygiene.",
                "يُنصح باستخدام غسول الفم المضاد للبكتيريا وتحسين نظافة الفم",
            ),
            Advisory::PlaqueHygiene => LocalizedText::new(
                "Brush and floss regularly to reduce plaque buildup.",
                "يجب تحسين تنظيف الأسنان باستخدام الفرشاة والخيط السني بانتظام",
            ),
            Advisory::ErosionDiet => LocalizedText::new(
                "Avoid acidic drinks and very hard foods.",
                "تجنب المشروبات الحمضية وتناول الأطعمة القاسية",
            ),
            Advisory::SensitiveToothpaste => LocalizedText::new(
                "Use a toothpaste made for sensitive teeth.",
                "استخدم معجون أسنان مخصص للأسنان الحساسة",
            ),
            Advisory::ComprehensiveExam => LocalizedText::new(
                "Schedule a comprehensive dental exam and professional cleaning.",
                "يُنصح بزيارة طبيب الأسنان لفحص شامل وتنظيف احترافي",
            ),
            Advisory::SeniorCheckups => LocalizedText::new(
                "Given your age, a dental checkup every 4-6 months is recommended.",
                "نظراً لعمرك، يُنصح بزيارة طبيب الأسنان كل 4-6 أشهر للفحص الدوري",
            ),
            Advisory::YouthDietHygiene => LocalizedText::new(
                "Avoid sweets and soft drinks, and brush after every meal.",
                "يُنصح بتجنب الحلويات والمشروبات الغازية وتنظيف الأسنان بعد كل وجبة",
            ),
            Advisory::PainTemperature => LocalizedText::new(
                "Avoid very cold or very hot food and drinks.",
                "يُنصح بتجنب الأطعمة والمشروبات شديدة البرودة أو السخونة",
            ),
            Advisory::BleedingSoftBrush => LocalizedText::new(
                "Use a soft toothbrush and avoid pressing hard while brushing.",
                "استخدم فرشاة أسنان ناعمة وتجنب الضغط الشديد أثناء التنظيف",
            ),
            Advisory::GoodHealth => LocalizedText::new(
                "Your teeth look healthy! Keep up your daily care routine.",
                "صحة أسنانك جيدة! حافظ على روتين العناية اليومي",
            ),
            Advisory::AnalysisFailed => LocalizedText::new(
                "Sorry, the image could not be analyzed. Please check the photo quality and try again.",
                "عذراً، حدث خطأ أثناء تحليل الصورة. يرجى التأكد من جودة الصورة وإعادة المحاولة.",
            ),
        }
    }

    pub fn render(&self, locale: Locale) -> String {
        self.text().get(locale).to_string()
    }
}
