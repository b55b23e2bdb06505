//! Attribution configuration
//!
//! The footer text, name and logo the live page must carry.

use serde::{Deserialize, Serialize};

/// Expected attribution values, fetched once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionConfig {
    /// Text the footer must contain (e.g. "Dezvoltat de")
    pub required_text: String,
    /// Developer name the footer must contain
    pub required_name: String,
    /// Fragment the logo image source must contain
    pub logo_url_fragment: String,
}

impl AttributionConfig {
    /// Create a new attribution config
    pub fn new(
        required_text: impl Into<String>,
        required_name: impl Into<String>,
        logo_url_fragment: impl Into<String>,
    ) -> Self {
        Self {
            required_text: required_text.into(),
            required_name: required_name.into(),
            logo_url_fragment: logo_url_fragment.into(),
        }
    }

    /// Whether rendered footer text carries both the text and the name
    #[must_use]
    pub fn text_matches(&self, footer_text: &str) -> bool {
        footer_text.contains(&self.required_text) && footer_text.contains(&self.required_name)
    }

    /// Whether an image source is the expected logo
    #[must_use]
    pub fn logo_matches(&self, src: &str) -> bool {
        src.contains(&self.logo_url_fragment)
    }
}
