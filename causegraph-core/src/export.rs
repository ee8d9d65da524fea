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

//! Graph Database Export Loader
//!
//! Reads the JSON export of a property-graph database so previously stored
//! relationships can be re-clustered:
//!
//! ```json
//! {
//!   "nodes": [{"id": "1", "labels": ["Entity"], "properties": {"name": "Inflation"}}],
//!   "relationships": [{"start": "1", "end": "2", "type": "RELATION",
//!                      "properties": {"type": "has effect"}}]
//! }
//! ```
//!
//! Relationships pointing at undeclared nodes are skipped. Declared nodes
//! are kept as concepts even when no relationship touches them.

use crate::error::{CauseGraphError, Result};
use crate::triple::RawTriple;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphExport {
    #[serde(default)]
    pub nodes: Vec<ExportNode>,
    #[serde(default)]
    pub relationships: Vec<ExportRelationship>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportNode {
    pub id: Value,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRelationship {
    pub start: Value,
    pub end: Value,
    #[serde(default, rename = "type")]
    pub rel_type: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Triples recovered from an export
#[derive(Debug, Clone, Default)]
pub struct ExportTriples {
    pub triples: Vec<RawTriple>,
    /// Relationships whose endpoints are not declared nodes
    pub skipped: usize,
}

impl FromStr for GraphExport {
    type Err = CauseGraphError;

    fn from_str(json: &str) -> Result<Self> {
        let export: GraphExport = serde_json::from_str(json)?;
        for node in &export.nodes {
            if id_key(&node.id).is_none() {
                return Err(CauseGraphError::Export(format!(
                    "node id must be a string or number, got {}",
                    node.id
                )));
            }
        }
        Ok(export)
    }
}

impl GraphExport {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Concept names of all declared nodes, in export order
    pub fn concepts(&self) -> Vec<String> {
        self.nodes.iter().filter_map(node_name).collect()
    }

    /// Convert relationships into raw triples.
    ///
    /// Confidence defaults to 1.0 when the relationship carries none. Only
    /// `properties.type` becomes the relation label; the relationship type
    /// (`RELATION`, `INFLUENCED_BY`) is a storage label and is ignored.
    pub fn to_triples(&self) -> ExportTriples {
        let names: HashMap<String, String> = self
            .nodes
            .iter()
            .filter_map(|node| Some((id_key(&node.id)?, node_name(node)?)))
            .collect();

        let mut out = ExportTriples::default();
        for rel in &self.relationships {
            let endpoints = id_key(&rel.start)
                .and_then(|s| names.get(&s))
                .zip(id_key(&rel.end).and_then(|e| names.get(&e)));
            let Some((subject, object)) = endpoints else {
                out.skipped += 1;
                continue;
            };

            let confidence = rel
                .properties
                .get("confidence")
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            let relation = rel
                .properties
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string);
            let source_id = rel
                .properties
                .get("source_id")
                .and_then(Value::as_str)
                .map(str::to_string);

            out.triples.push(RawTriple {
                subject: Some(subject.clone()),
                object: Some(object.clone()),
                confidence: Some(confidence),
                source_id,
                relation,
            });
        }

        debug!(
            nodes = self.nodes.len(),
            triples = out.triples.len(),
            skipped = out.skipped,
            "Loaded graph export"
        );
        out
    }
}

fn id_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn node_name(node: &ExportNode) -> Option<String> {
    node.properties
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| id_key(&node.id))
}
