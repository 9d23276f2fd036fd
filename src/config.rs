//! Scanner configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```
//! use css_scan::ScanConfig;
//!
//! let config = ScanConfig::from_json(r#"{ "debounce_ms": 150 }"#).unwrap();
//! assert_eq!(config.debounce_ms, 150);
//! assert_eq!(config.max_classes, 3);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How long a feedback status string stays visible, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackDurations {
    pub apply_ms: u64,
    pub apply_error_ms: u64,
    pub copy_ms: u64,
    pub copy_error_ms: u64,
    pub export_ms: u64,
    pub export_error_ms: u64,
    pub live_editing_ms: u64,
}

impl Default for FeedbackDurations {
    fn default() -> Self {
        Self {
            apply_ms: 1500,
            apply_error_ms: 2500,
            copy_ms: 1500,
            copy_error_ms: 2500,
            export_ms: 2000,
            export_error_ms: 2500,
            live_editing_ms: 3000,
        }
    }
}

/// Tunables for selector synthesis, extraction, editing and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Class/id prefix owned by the scanner; such tokens never appear in
    /// synthesized selectors or mockups.
    pub reserved_prefix: String,
    /// Maximum class tokens in a synthesized selector.
    pub max_classes: usize,
    /// Quiescence window for live-preview edits.
    pub debounce_ms: u64,
    pub feedback: FeedbackDurations,
    /// Text longer than this is truncated in markup mockups.
    pub mockup_text_limit: usize,
    /// Maximum length of the selector part of an export file name.
    pub file_stem_limit: usize,
    /// Selector returned for nodes that are not elements.
    pub fallback_selector: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: "css-scan".to_string(),
            max_classes: 3,
            debounce_ms: 300,
            feedback: FeedbackDurations::default(),
            mockup_text_limit: 100,
            file_stem_limit: 30,
            fallback_selector: ".unknown-element".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.reserved_prefix, "css-scan");
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.feedback.apply_ms, 1500);
        assert_eq!(config.feedback.export_ms, 2000);
        assert_eq!(config.feedback.live_editing_ms, 3000);
        assert_eq!(config.fallback_selector, ".unknown-element");
    }

    #[test]
    fn test_partial_json() {
        let config =
            ScanConfig::from_json(r#"{ "max_classes": 2, "feedback": { "copy_ms": 10 } }"#)
                .unwrap();
        assert_eq!(config.max_classes, 2);
        assert_eq!(config.feedback.copy_ms, 10);
        assert_eq!(config.feedback.copy_error_ms, 2500);
        assert_eq!(config.file_stem_limit, 30);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            ScanConfig::from_json("{ nope"),
            Err(crate::Error::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ScanConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(ScanConfig::from_json(&json).unwrap(), config);
    }
}
