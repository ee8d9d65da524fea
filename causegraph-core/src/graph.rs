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

//! Causal Concept Graph
//!
//! Undirected weighted graph over normalized concepts. Built once per
//! clustering run by [`GraphBuilder`] and immutable afterwards:
//! - Node ids are dense and assigned in first-seen order
//! - Edge weight is the aggregated causal strength of a concept pair
//! - Degrees and total weight `m` are cached at build time
//!
//! Self-loops never come out of ingestion. They only appear on graphs
//! produced by [`Graph::collapse`], where a super-node's self-loop holds the
//! weight internal to the community it stands for. Degrees count a
//! self-loop twice, so `Σ degree == 2m` holds for every graph.

use crate::error::{CauseGraphError, Result};
use crate::ingest::{CanonicalEdge, IngestOutcome};
use crate::louvain::Partition;
use crate::triple::{display_label, normalize_concept};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Dense node index
pub type NodeId = usize;

/// A concept in the causal graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: NodeId,
    /// Normalized name (registry key)
    pub key: String,
    /// First-seen spelling
    pub label: String,
}

/// Aggregated causal relationship between two concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEdge {
    /// First-seen cause
    pub source: NodeId,
    /// First-seen effect
    pub target: NodeId,
    /// Sum of observation confidences (> 0)
    pub weight: f64,
    pub observations: u32,
    /// Observations asserting `source → target`
    pub forward: u32,
    /// Observations asserting `target → source`
    pub backward: u32,
    pub provenance: BTreeSet<String>,
}

impl CausalEdge {
    /// The endpoint opposite `node`
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }

    /// Absorb another observation set for the same pair
    fn absorb(&mut self, other: &CausalEdge) {
        self.weight += other.weight;
        self.observations += other.observations;
        if self.source == other.source {
            self.forward += other.forward;
            self.backward += other.backward;
        } else {
            self.forward += other.backward;
            self.backward += other.forward;
        }
        self.provenance.extend(other.provenance.iter().cloned());
    }
}

/// Immutable clustering input
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<ConceptNode>,
    name_index: HashMap<String, NodeId>,
    edges: Vec<CausalEdge>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

/// Serializable view of a graph, the hand-off format for persistence
#[derive(Debug, Serialize)]
pub struct GraphSnapshot<'a> {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_weight: f64,
    pub nodes: &'a [ConceptNode],
    pub edges: &'a [CausalEdge],
}

impl Graph {
    /// Graph with no nodes and no edges
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a graph straight from ingested edges
    pub fn from_edges(edges: &[CanonicalEdge]) -> Result<Self> {
        let mut builder = GraphBuilder::new();
        for edge in edges {
            builder.add_edge(edge)?;
        }
        Ok(builder.build())
    }

    /// Build from an ingestion outcome plus concepts that must appear even
    /// without edges. Blank concept names are skipped.
    pub fn from_ingest(outcome: &IngestOutcome, concepts: &[String]) -> Result<Self> {
        let mut builder = GraphBuilder::new();
        for edge in &outcome.edges {
            builder.add_edge(edge)?;
        }
        for concept in concepts {
            if !concept.trim().is_empty() {
                builder.add_concept(concept)?;
            }
        }
        Ok(builder.build())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CausalEdge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    /// Look up a concept by any spelling of its name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(&normalize_concept(name)).copied()
    }

    /// Weighted degree (self-loops counted twice)
    pub fn degree(&self, id: NodeId) -> f64 {
        self.degrees.get(id).copied().unwrap_or(0.0)
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Self-loop weight (non-zero only on collapsed graphs)
    pub fn self_loop(&self, id: NodeId) -> f64 {
        self.self_loops.get(id).copied().unwrap_or(0.0)
    }

    /// Total edge weight `m`, self-loops included
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Edge between two nodes, in either orientation
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&CausalEdge> {
        self.edges
            .iter()
            .find(|e| (e.source == a && e.target == b) || (e.source == b && e.target == a))
    }

    /// Adjacency lists sorted by neighbor id, self-loops excluded
    pub fn neighbors(&self) -> Vec<Vec<(NodeId, f64)>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.source].push((edge.target, edge.weight));
            adjacency[edge.target].push((edge.source, edge.weight));
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(n, _)| n);
        }
        adjacency
    }

    pub fn snapshot(&self) -> GraphSnapshot<'_> {
        GraphSnapshot {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            total_weight: self.total_weight,
            nodes: &self.nodes,
            edges: &self.edges,
        }
    }

    /// Collapse every community of `partition` into a super-node.
    ///
    /// Super-node `c` represents community `c` and is labelled
    /// `community-<c>`. Edges between communities are summed; weight inside a
    /// community becomes the super-node's self-loop.
    pub fn collapse(&self, partition: &Partition) -> Result<Graph> {
        if partition.len() != self.node_count() {
            return Err(CauseGraphError::PartitionMismatch {
                expected: self.node_count(),
                actual: partition.len(),
            });
        }

        let count = partition.community_count();
        let assignment = partition.assignment();
        let mut self_loops = vec![0.0; count];
        let mut between: BTreeMap<(NodeId, NodeId), CausalEdge> = BTreeMap::new();

        for (node, &loop_weight) in self.self_loops.iter().enumerate() {
            self_loops[assignment[node]] += loop_weight;
        }

        for edge in &self.edges {
            let (cs, ct) = (assignment[edge.source], assignment[edge.target]);
            if cs == ct {
                self_loops[cs] += edge.weight;
                continue;
            }
            let mapped = CausalEdge {
                source: cs,
                target: ct,
                ..edge.clone()
            };
            let key = (cs.min(ct), cs.max(ct));
            match between.get_mut(&key) {
                Some(existing) => existing.absorb(&mapped),
                None => {
                    between.insert(key, mapped);
                }
            }
        }

        let nodes = (0..count)
            .map(|c| {
                let name = format!("community-{}", c);
                ConceptNode {
                    id: c,
                    key: name.clone(),
                    label: name,
                }
            })
            .collect();

        Ok(Graph::assemble(
            nodes,
            between.into_values().collect(),
            self_loops,
        ))
    }

    fn assemble(nodes: Vec<ConceptNode>, edges: Vec<CausalEdge>, self_loops: Vec<f64>) -> Self {
        let mut degrees = vec![0.0; nodes.len()];
        let mut total_weight = 0.0;

        for edge in &edges {
            degrees[edge.source] += edge.weight;
            degrees[edge.target] += edge.weight;
            total_weight += edge.weight;
        }
        for (node, &loop_weight) in self_loops.iter().enumerate() {
            degrees[node] += 2.0 * loop_weight;
            total_weight += loop_weight;
        }

        let name_index = nodes.iter().map(|n| (n.key.clone(), n.id)).collect();

        Self {
            nodes,
            name_index,
            edges,
            self_loops,
            degrees,
            total_weight,
        }
    }
}

/// Node registry plus edge set under construction
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<ConceptNode>,
    name_index: HashMap<String, NodeId>,
    edges: Vec<CausalEdge>,
    edge_index: HashMap<(NodeId, NodeId), usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concept, returning its id. Existing concepts keep their
    /// first-seen label.
    pub fn add_concept(&mut self, name: &str) -> Result<NodeId> {
        let key = normalize_concept(name);
        if key.is_empty() {
            return Err(CauseGraphError::InvalidConcept(
                "concept name is empty".to_string(),
            ));
        }
        Ok(self.register(key, display_label(name)))
    }

    fn register(&mut self, key: String, label: String) -> NodeId {
        if let Some(&id) = self.name_index.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.name_index.insert(key.clone(), id);
        self.nodes.push(ConceptNode { id, key, label });
        id
    }

    /// Add a canonical edge, registering both endpoints
    pub fn add_edge(&mut self, edge: &CanonicalEdge) -> Result<()> {
        if !edge.weight.is_finite() || edge.weight <= 0.0 {
            return Err(CauseGraphError::InvalidEdge(format!(
                "weight must be positive, got {} for {} -> {}",
                edge.weight, edge.source, edge.target
            )));
        }

        let source_key = normalize_concept(&edge.source);
        let target_key = normalize_concept(&edge.target);
        if source_key.is_empty() || target_key.is_empty() {
            return Err(CauseGraphError::InvalidConcept(
                "edge endpoint name is empty".to_string(),
            ));
        }
        if source_key == target_key {
            return Err(CauseGraphError::InvalidEdge(format!(
                "self-loop on {}",
                source_key
            )));
        }

        let source = self.register(source_key, label_or_key(&edge.source_label, &edge.source));
        let target = self.register(target_key, label_or_key(&edge.target_label, &edge.target));

        let resolved = CausalEdge {
            source,
            target,
            weight: edge.weight,
            observations: edge.observations,
            forward: edge.forward,
            backward: edge.backward,
            provenance: edge.provenance.clone(),
        };

        let key = (source.min(target), source.max(target));
        match self.edge_index.get(&key).copied() {
            Some(idx) => self.edges[idx].absorb(&resolved),
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(resolved);
            }
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Freeze into an immutable graph. An empty builder yields an empty graph.
    pub fn build(self) -> Graph {
        let self_loops = vec![0.0; self.nodes.len()];
        Graph::assemble(self.nodes, self.edges, self_loops)
    }
}

fn label_or_key(label: &str, key: &str) -> String {
    let label = display_label(label);
    if label.is_empty() {
        display_label(key)
    } else {
        label
    }
}
