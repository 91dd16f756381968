use serde::{Deserialize, Serialize};

/// Patient-reported context for one visit. Scoring only reads age, symptoms and visit reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContext {
    pub age: u32,
    pub gender: String,
    pub symptoms: Vec<String>,
    pub visit_reasons: Vec<String>,
    pub medical_history: Vec<String>,
}

impl PatientContext {
    pub fn new(age: u32) -> Self {
        Self {
            age,
            ..Default::default()
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = gender.into();
        self
    }

    pub fn with_symptom(mut self, symptom: impl Into<String>) -> Self {
        push_unique(&mut self.symptoms, symptom.into());
        self
    }

    pub fn with_visit_reason(mut self, reason: impl Into<String>) -> Self {
        push_unique(&mut self.visit_reasons, reason.into());
        self
    }

    pub fn with_medical_history(mut self, item: impl Into<String>) -> Self {
        push_unique(&mut self.medical_history, item.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !item.is_empty() && !items.contains(&item) {
        items.push(item);
    }
}
