use serde::{Deserialize, Serialize};

/// Language used for condition names, score bands and advisories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "ar", alias = "arabic")]
    Arabic,
}

/// A fixed piece of text with one rendering per supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizedText {
    pub en: &'static str,
    pub ar: &'static str,
}

impl LocalizedText {
    pub const fn new(en: &'static str, ar: &'static str) -> Self {
        Self { en, ar }
    }

    pub fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => self.en,
            Locale::Arabic => self.ar,
        }
    }
}
