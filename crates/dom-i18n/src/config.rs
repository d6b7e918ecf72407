use dom_i18n_core::DEFAULT_MARKER;
use serde::{Deserialize, Serialize};

/// Page-side settings for an [`I18n`](crate::I18n) instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Attribute whose value is the translation key, e.g. `<h1 data-i18n="title">`.
    pub marker_attribute: String,
    /// Locale used for lookups before the first successful `load`.
    pub initial_locale: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            marker_attribute: DEFAULT_MARKER.to_string(),
            initial_locale: "en".to_string(),
        }
    }
}

impl BinderConfig {
    pub fn with_marker(mut self, marker_attribute: impl Into<String>) -> Self {
        self.marker_attribute = marker_attribute.into();
        self
    }

    pub fn with_initial_locale(mut self, locale: impl Into<String>) -> Self {
        self.initial_locale = locale.into();
        self
    }
}
