//! Perception input contract.
//!
//! Detections and OCR results are produced by an external process and handed
//! over as a JSON snapshot. This module only defines the data shapes and a
//! loader; it never looks at pixels.

mod snapshot;

pub use snapshot::SnapshotSource;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A detected container or interactive element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionItem {
    /// `[x1, y1, x2, y2]`. Kept as a list so malformed input reaches validation.
    #[serde(rename = "box")]
    pub bbox: Vec<f64>,
    pub confidence: f64,
    #[serde(rename = "class")]
    pub class_name: String,
    /// Assigned externally for icons and low-confidence detections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_tag: Option<String>,
}

impl DetectionItem {
    pub fn new(bbox: Vec<f64>, confidence: f64, class_name: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            class_name: class_name.into(),
            semantic_tag: None,
        }
    }

    pub fn with_semantic_tag(mut self, tag: impl Into<String>) -> Self {
        self.semantic_tag = Some(tag.into());
        self
    }
}

/// A recognized text fragment with its 4-point polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    #[serde(rename = "box")]
    pub polygon: Vec<Vec<f64>>,
    pub text: String,
    pub confidence: f64,
}

impl TextItem {
    pub fn new(polygon: Vec<Vec<f64>>, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }
}

/// One perception cycle worth of detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionData {
    #[serde(default)]
    pub layouts: Vec<DetectionItem>,
    #[serde(default)]
    pub elements: Vec<DetectionItem>,
    #[serde(default)]
    pub text: Vec<TextItem>,
}

impl PerceptionData {
    /// Total number of items across the three lists
    pub fn len(&self) -> usize {
        self.layouts.len() + self.elements.len() + self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anything that can hand over one frame of perception output.
pub trait PerceptionSource {
    fn perceive(&self) -> Result<PerceptionData>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_contract() {
        let json = r#"{
            "layouts": [{"box": [0, 0, 1000, 1000], "confidence": 0.9, "class": "form"}],
            "elements": [{"box": [10, 10, 40, 40], "confidence": 0.4, "class": "icon", "semantic_tag": "settings gear"}],
            "text": [{"box": [[110, 110], [190, 110], [190, 140], [110, 140]], "text": "Submit", "confidence": 0.95}]
        }"#;

        let data: PerceptionData = serde_json::from_str(json).unwrap();
        assert_eq!(data.layouts[0].class_name, "form");
        assert_eq!(data.elements[0].semantic_tag.as_deref(), Some("settings gear"));
        assert_eq!(data.text[0].polygon.len(), 4);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let data: PerceptionData = serde_json::from_str(r#"{"elements": []}"#).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_serialize_uses_contract_names() {
        let item = DetectionItem::new(vec![1.0, 2.0, 3.0, 4.0], 0.5, "button");
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("box").is_some());
        assert_eq!(value["class"], "button");
        assert!(value.get("semantic_tag").is_none());
    }
}
