//! Evidence documents - the unit of grounding

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Citation used when a tool produced a document without a `source`
pub const UNKNOWN_SOURCE: &str = "unknown";

/// A retrieved text passage plus the metadata needed to cite it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDocument {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    /// Distance to the query, when the document came from semantic lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl EvidenceDocument {
    /// Create a document citing `source`
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), source.into());
        Self {
            text: text.into(),
            metadata,
            distance: None,
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// The citation for this document
    pub fn source(&self) -> &str {
        self.metadata.get("source").map(String::as_str).unwrap_or(UNKNOWN_SOURCE)
    }
}

impl From<docstore::ScoredDocument> for EvidenceDocument {
    fn from(hit: docstore::ScoredDocument) -> Self {
        Self {
            text: hit.text,
            metadata: hit.metadata,
            distance: Some(hit.distance),
        }
    }
}
