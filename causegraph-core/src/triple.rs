// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Causal Triple Input Records
//!
//! `RawTriple` is the untrusted shape handed over by relation extraction.
//! Every field is optional here; [`crate::ingest::RelationIngestor`] is the
//! only place that decides whether a record is usable.

use serde::{Deserialize, Serialize};

/// A (subject, object, confidence, provenance) record as produced upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTriple {
    /// Cause concept
    #[serde(default, alias = "head")]
    pub subject: Option<String>,
    /// Effect concept
    #[serde(default, alias = "tail")]
    pub object: Option<String>,
    /// Causality confidence, expected in (0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Article / document the triple was extracted from
    #[serde(default)]
    pub source_id: Option<String>,
    /// Relation label from the extraction model (e.g. "has effect")
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl RawTriple {
    /// Create a triple with a confidence score
    pub fn new(subject: impl Into<String>, object: impl Into<String>, confidence: f64) -> Self {
        Self {
            subject: Some(subject.into()),
            object: Some(object.into()),
            confidence: Some(confidence),
            source_id: None,
            relation: None,
        }
    }

    /// Set the provenance id
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Set the relation label
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }
}

/// Normalize a concept name into its registry key.
///
/// Trims, lowercases and collapses whitespace runs, so
/// `"  Interest   Rates "` and `"interest rates"` name the same concept.
pub fn normalize_concept(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Display form of a concept name: whitespace collapsed, case kept
pub fn display_label(name: &str) -> String {
    collapse_whitespace(name)
}

fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
