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

//! Relation Ingestion
//!
//! Validates raw causal triples and folds repeated observations of the same
//! concept pair into one canonical edge.
//!
//! ## Merging
//!
//! Pairs are unordered: `(A, B)` and `(B, A)` land on the same edge. The edge
//! keeps the orientation it was first seen in, and counts how many
//! observations ran `source → target` (`forward`) versus the reverse
//! (`backward`). Weight is the sum of confidences, provenance the union of
//! source ids.
//!
//! ## Batches
//!
//! Independent batches (e.g. one per article) are validated by separate
//! workers. Each worker returns its checked triples; one thread then folds
//! them into edges in batch order, so weights are summed in exactly the order
//! a single concatenated batch would produce.

use crate::config::IngestConfig;
use crate::triple::{display_label, normalize_concept, RawTriple};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

/// Why a single triple was skipped
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("missing subject concept")]
    MissingSubject,

    #[error("missing object concept")]
    MissingObject,

    #[error("missing confidence score")]
    MissingConfidence,

    #[error("confidence must be in (0, 1], got {0}")]
    InvalidConfidence(f64),

    #[error("subject and object are the same concept: {0}")]
    SelfLoop(String),

    #[error("relation is not causal: {0}")]
    NonCausalRelation(String),

    #[error("missing source id")]
    MissingSource,
}

/// Diagnostic for a skipped triple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Batch the triple came from (0 for single-batch ingestion)
    pub batch: usize,
    /// Position of the triple inside its batch
    pub index: usize,
    pub source_id: Option<String>,
    pub reason: ValidationError,
}

/// Deduplicated causal relationship between two concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEdge {
    /// Normalized key of the first-seen cause
    pub source: String,
    /// Normalized key of the first-seen effect
    pub target: String,
    pub source_label: String,
    pub target_label: String,
    /// Sum of observation confidences
    pub weight: f64,
    /// Number of accepted observations
    pub observations: u32,
    /// Observations asserting `source → target`
    pub forward: u32,
    /// Observations asserting `target → source`
    pub backward: u32,
    /// Source ids, sorted
    pub provenance: BTreeSet<String>,
}

/// Result of ingesting one or more batches
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestOutcome {
    /// Canonical edges in first-seen order
    pub edges: Vec<CanonicalEdge>,
    pub rejected: Vec<Rejection>,
    /// Number of triples that passed validation
    pub accepted: usize,
}

/// A triple that passed validation
struct Observation {
    source: String,
    target: String,
    source_label: String,
    target_label: String,
    confidence: f64,
    source_id: Option<String>,
}

/// Outcome of validating one triple
type Checked = Result<Observation, Rejection>;

/// Sequential merge state
#[derive(Default)]
struct EdgeAccumulator {
    edges: Vec<CanonicalEdge>,
    index: HashMap<(String, String), usize>,
    rejected: Vec<Rejection>,
    accepted: usize,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl EdgeAccumulator {
    fn observe(&mut self, obs: Observation) {
        self.accepted += 1;
        let key = pair_key(&obs.source, &obs.target);

        if let Some(idx) = self.index.get(&key).copied() {
            let edge = &mut self.edges[idx];
            edge.weight += obs.confidence;
            edge.observations += 1;
            if edge.source == obs.source {
                edge.forward += 1;
            } else {
                edge.backward += 1;
            }
            edge.provenance.extend(obs.source_id);
            return;
        }

        self.index.insert(key, self.edges.len());
        self.edges.push(CanonicalEdge {
            source: obs.source,
            target: obs.target,
            source_label: obs.source_label,
            target_label: obs.target_label,
            weight: obs.confidence,
            observations: 1,
            forward: 1,
            backward: 0,
            provenance: obs.source_id.into_iter().collect(),
        });
    }

    fn record(&mut self, checked: Checked) {
        match checked {
            Ok(obs) => self.observe(obs),
            Err(rejection) => self.rejected.push(rejection),
        }
    }

    fn finish(self) -> IngestOutcome {
        IngestOutcome {
            edges: self.edges,
            rejected: self.rejected,
            accepted: self.accepted,
        }
    }
}

/// Validation boundary between relation extraction and graph construction
#[derive(Debug, Clone)]
pub struct RelationIngestor {
    config: IngestConfig,
    /// Lowercased, non-empty keywords
    keywords: Vec<String>,
}

impl RelationIngestor {
    /// Create an ingestor with the default causal keyword filter
    pub fn new() -> Self {
        Self::with_config(IngestConfig::default())
    }

    pub fn with_config(config: IngestConfig) -> Self {
        let keywords = config
            .causal_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { config, keywords }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Check a single triple without ingesting it
    pub fn validate(&self, triple: &RawTriple) -> Result<(), ValidationError> {
        self.check(triple).map(|_| ())
    }

    fn check(&self, triple: &RawTriple) -> Result<Observation, ValidationError> {
        let subject = non_blank(triple.subject.as_deref()).ok_or(ValidationError::MissingSubject)?;
        let object = non_blank(triple.object.as_deref()).ok_or(ValidationError::MissingObject)?;

        let confidence = triple.confidence.ok_or(ValidationError::MissingConfidence)?;
        // NaN fails both comparisons
        if !(confidence > 0.0 && confidence <= 1.0) {
            return Err(ValidationError::InvalidConfidence(confidence));
        }

        let source = normalize_concept(subject);
        let target = normalize_concept(object);
        if source == target {
            return Err(ValidationError::SelfLoop(source));
        }

        if let Some(relation) = non_blank(triple.relation.as_deref()) {
            if self.config.filter_relations && !self.is_causal(relation) {
                return Err(ValidationError::NonCausalRelation(relation.to_string()));
            }
        }

        let source_id = non_blank(triple.source_id.as_deref()).map(str::to_string);
        if self.config.require_source && source_id.is_none() {
            return Err(ValidationError::MissingSource);
        }

        Ok(Observation {
            source,
            target,
            source_label: display_label(subject),
            target_label: display_label(object),
            confidence,
            source_id,
        })
    }

    fn is_causal(&self, relation: &str) -> bool {
        let relation = relation.to_lowercase();
        self.keywords.iter().any(|k| relation.contains(k.as_str()))
    }

    fn check_batch(&self, batch: usize, triples: &[RawTriple]) -> Vec<Checked> {
        triples
            .iter()
            .enumerate()
            .map(|(index, triple)| {
                self.check(triple).map_err(|reason| Rejection {
                    batch,
                    index,
                    source_id: triple.source_id.clone(),
                    reason,
                })
            })
            .collect()
    }

    /// Ingest a single ordered batch of triples
    pub fn ingest(&self, triples: &[RawTriple]) -> IngestOutcome {
        let mut acc = EdgeAccumulator::default();
        for checked in self.check_batch(0, triples) {
            acc.record(checked);
        }
        let outcome = acc.finish();
        debug!(
            accepted = outcome.accepted,
            rejected = outcome.rejected.len(),
            edges = outcome.edges.len(),
            "Ingested triple batch"
        );
        outcome
    }

    /// Ingest independent batches, validating one batch per worker when the
    /// `parallel` feature is enabled.
    ///
    /// Identical to ingesting the concatenated batches, except that
    /// rejections carry their batch number.
    pub fn ingest_batches(&self, batches: &[Vec<RawTriple>]) -> IngestOutcome {
        #[cfg(feature = "parallel")]
        let checked: Vec<Vec<Checked>> = batches
            .par_iter()
            .enumerate()
            .map(|(batch, triples)| self.check_batch(batch, triples))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let checked: Vec<Vec<Checked>> = batches
            .iter()
            .enumerate()
            .map(|(batch, triples)| self.check_batch(batch, triples))
            .collect();

        let mut merged = EdgeAccumulator::default();
        for checked in checked.into_iter().flatten() {
            merged.record(checked);
        }

        let outcome = merged.finish();
        debug!(
            batches = batches.len(),
            accepted = outcome.accepted,
            rejected = outcome.rejected.len(),
            edges = outcome.edges.len(),
            "Ingested triple batches"
        );
        outcome
    }
}

impl Default for RelationIngestor {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
