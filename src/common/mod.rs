pub mod locale;

pub use locale::{Locale, LocalizedText};
