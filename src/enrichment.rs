// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Website enrichment: suggestion types and the analysis service seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

/// A proposed value for one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Field name as reported by the service (e.g. `company_name`, `address`)
    pub field: String,
    /// Text for scalar fields, object for structured ones
    pub value: serde_json::Value,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
}

impl Suggestion {
    pub fn new(field: impl Into<String>, value: serde_json::Value, confidence: f64) -> Self {
        Self {
            field: field.into(),
            value,
            confidence,
        }
    }
}

/// Context sent alongside the website being analyzed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisContext {
    pub client_name: String,
    pub market_sector: String,
}

/// Wire shape: `{ "suggestions": { "<field>": { "value": ..., "confidence": ... } } }`
#[derive(Debug, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub suggestions: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    value: serde_json::Value,
    #[serde(default)]
    confidence: f64,
}

impl AnalysisResponse {
    /// Flatten into suggestions, skipping malformed entries
    pub fn into_suggestions(self) -> Vec<Suggestion> {
        let mut out = Vec::with_capacity(self.suggestions.len());
        for (field, raw) in self.suggestions {
            match serde_json::from_value::<RawSuggestion>(raw) {
                Ok(raw) => {
                    let confidence = if raw.confidence.is_finite() {
                        raw.confidence.clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    out.push(Suggestion::new(field, raw.value, confidence));
                }
                Err(e) => warn!("Ignoring malformed suggestion for '{}': {}", field, e),
            }
        }
        out
    }
}

/// Service that analyzes a website and proposes organization details
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn analyze(&self, website: &str, context: &AnalysisContext) -> Result<Vec<Suggestion>>;
}
