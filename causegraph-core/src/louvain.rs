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

//! Louvain Community Detection
//!
//! Partitions the causal graph into communities by greedily maximizing
//! modularity over successively coarser graphs.
//!
//! ## Algorithm Overview
//!
//! 1. **Local Moving Phase**: every node starts alone; nodes are visited in
//!    ascending id order and moved to the neighboring community with the
//!    largest strictly positive gain, until a full pass moves nothing
//! 2. **Aggregation Phase**: each community becomes a super-node, edges
//!    between communities are summed, internal weight becomes a self-loop
//! 3. **Repeat** on the coarser graph until a level brings no improvement or
//!    only one node is left
//!
//! ## Modularity
//!
//! Q = (1/2m) * Σij[Aij - γ(ki*kj)/(2m)] * δ(ci, cj)
//!
//! Where:
//! - Aij = edge weight between i and j
//! - ki, kj = degree of nodes i, j
//! - m = total edge weight
//! - γ = resolution (1.0 for the reported score)
//! - δ(ci, cj) = 1 if nodes in same community
//!
//! ## Determinism
//!
//! There is no randomness: visiting order is fixed, candidate communities
//! are scanned in ascending id, ties go to the lowest id, and a node only
//! leaves its community for a strictly better one.

use crate::config::LouvainConfig;
use crate::error::{CauseGraphError, Result};
use crate::graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Gains below this are treated as floating-point noise
const GAIN_EPSILON: f64 = 1e-12;

/// Assignment of every node to exactly one community.
///
/// Community ids are dense and numbered by first appearance in node order,
/// so community 0 always contains node 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PartitionRecord")]
pub struct Partition {
    assignment: Vec<usize>,
    community_count: usize,
}

/// Wire form of a [`Partition`], checked before it is accepted
#[derive(Deserialize)]
struct PartitionRecord {
    assignment: Vec<usize>,
    community_count: usize,
}

impl TryFrom<PartitionRecord> for Partition {
    type Error = CauseGraphError;

    fn try_from(record: PartitionRecord) -> Result<Self> {
        let (canonical, count) = renumber(&record.assignment);
        if canonical != record.assignment || count != record.community_count {
            return Err(CauseGraphError::InvalidPartition(format!(
                "community ids must be dense and numbered by first appearance \
                 ({} communities declared, {} used)",
                record.community_count, count
            )));
        }
        Ok(Self {
            assignment: canonical,
            community_count: count,
        })
    }
}

impl Partition {
    /// Every node in its own community
    pub fn singletons(node_count: usize) -> Self {
        Self {
            assignment: (0..node_count).collect(),
            community_count: node_count,
        }
    }

    /// Build from arbitrary labels; labels are renumbered canonically
    pub fn from_assignment(labels: Vec<usize>) -> Self {
        let (assignment, community_count) = renumber(&labels);
        Self {
            assignment,
            community_count,
        }
    }

    /// Number of nodes covered
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    pub fn community_count(&self) -> usize {
        self.community_count
    }

    /// Community id per node id
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn community_of(&self, node: NodeId) -> Option<usize> {
        self.assignment.get(node).copied()
    }

    /// Members of each community, ascending node ids
    pub fn members(&self) -> Vec<Vec<NodeId>> {
        let mut members = vec![Vec::new(); self.community_count];
        for (node, &community) in self.assignment.iter().enumerate() {
            members[community].push(node);
        }
        members
    }
}

/// Per-community statistics on the input graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: usize,
    pub members: Vec<NodeId>,
    /// Sum of edge weights with both endpoints inside the community
    pub internal_weight: f64,
    /// Sum of member degrees
    pub total_degree: f64,
}

/// Output of one clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    pub partition: Partition,
    /// Standard modularity (γ = 1) of `partition`; 0.0 for graphs without edges
    pub modularity: f64,
    pub communities: Vec<CommunitySummary>,
    /// Aggregation levels that improved the partition
    pub levels: usize,
    /// False when some level hit `max_passes` while nodes were still moving
    pub converged: bool,
}

impl ClusteringResult {
    fn empty() -> Self {
        Self {
            partition: Partition::default(),
            modularity: 0.0,
            communities: Vec::new(),
            levels: 0,
            converged: true,
        }
    }
}

/// Standard modularity of `partition` on `graph`
pub fn modularity(graph: &Graph, partition: &Partition) -> Result<f64> {
    modularity_with_resolution(graph, partition, 1.0)
}

/// Generalized modularity with resolution γ
pub fn modularity_with_resolution(
    graph: &Graph,
    partition: &Partition,
    resolution: f64,
) -> Result<f64> {
    if partition.len() != graph.node_count() {
        return Err(CauseGraphError::PartitionMismatch {
            expected: graph.node_count(),
            actual: partition.len(),
        });
    }
    Ok(score(graph, partition, resolution))
}

fn score(graph: &Graph, partition: &Partition, resolution: f64) -> f64 {
    let m = graph.total_weight();
    if m <= 0.0 {
        return 0.0;
    }
    summarize(graph, partition)
        .iter()
        .map(|c| c.internal_weight / m - resolution * (c.total_degree / (2.0 * m)).powi(2))
        .sum()
}

fn summarize(graph: &Graph, partition: &Partition) -> Vec<CommunitySummary> {
    let assignment = partition.assignment();
    let mut summaries: Vec<CommunitySummary> = partition
        .members()
        .into_iter()
        .enumerate()
        .map(|(id, members)| {
            let internal_weight = members.iter().map(|&n| graph.self_loop(n)).sum();
            let total_degree = members.iter().map(|&n| graph.degree(n)).sum();
            CommunitySummary {
                id,
                members,
                internal_weight,
                total_degree,
            }
        })
        .collect();

    for edge in graph.edges() {
        let community = assignment[edge.source];
        if community == assignment[edge.target] {
            summaries[community].internal_weight += edge.weight;
        }
    }
    summaries
}

/// Renumber labels densely by first appearance
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let renumbered = labels
        .iter()
        .map(|&label| {
            let next = mapping.len();
            *mapping.entry(label).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

/// Working graph for one Louvain level
struct LevelGraph {
    /// Sorted by neighbor, no self entries
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

/// Result of one local moving phase
struct LocalMoves {
    /// Community label per level node (labels are node indices)
    labels: Vec<usize>,
    moves: usize,
    passes: usize,
    converged: bool,
}

impl LevelGraph {
    fn from_graph(graph: &Graph) -> Self {
        Self {
            adjacency: graph.neighbors(),
            self_loops: (0..graph.node_count()).map(|n| graph.self_loop(n)).collect(),
            degrees: graph.degrees().to_vec(),
            total_weight: graph.total_weight(),
        }
    }

    fn len(&self) -> usize {
        self.degrees.len()
    }

    /// Modularity objective of a dense assignment on this level
    fn objective(&self, assignment: &[usize], count: usize, resolution: f64) -> f64 {
        let m = self.total_weight;
        if m <= 0.0 {
            return 0.0;
        }

        let mut internal = vec![0.0; count];
        let mut totals = vec![0.0; count];
        for node in 0..self.len() {
            let community = assignment[node];
            internal[community] += self.self_loops[node];
            totals[community] += self.degrees[node];
            for &(neighbor, weight) in &self.adjacency[node] {
                // each edge is seen from both ends
                if neighbor > node && assignment[neighbor] == community {
                    internal[community] += weight;
                }
            }
        }

        internal
            .iter()
            .zip(&totals)
            .map(|(&w, &tot)| w / m - resolution * (tot / (2.0 * m)).powi(2))
            .sum()
    }

    fn local_moving(&self, resolution: f64, max_passes: usize) -> LocalMoves {
        let n = self.len();
        let mut labels: Vec<usize> = (0..n).collect();
        let mut totals = self.degrees.clone();
        let two_m = 2.0 * self.total_weight;

        if self.total_weight <= 0.0 {
            return LocalMoves {
                labels,
                moves: 0,
                passes: 0,
                converged: true,
            };
        }

        let mut moves = 0;
        let mut passes = 0;
        let mut converged = false;

        while passes < max_passes {
            passes += 1;
            let mut moved = 0;

            for node in 0..n {
                if self.adjacency[node].is_empty() {
                    continue;
                }

                let current = labels[node];
                let degree = self.degrees[node];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(neighbor, weight) in &self.adjacency[node] {
                    *links.entry(labels[neighbor]).or_default() += weight;
                }

                totals[current] -= degree;
                let gain = |community: usize, weight: f64| {
                    weight - resolution * totals[community] * degree / two_m
                };
                let stay_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));

                let mut best = current;
                let mut best_delta = 0.0;
                for (&community, &weight) in &links {
                    if community == current {
                        continue;
                    }
                    let delta = gain(community, weight) - stay_gain;
                    if delta > best_delta + GAIN_EPSILON {
                        best = community;
                        best_delta = delta;
                    }
                }

                totals[best] += degree;
                if best != current {
                    labels[node] = best;
                    moved += 1;
                }
            }

            moves += moved;
            if moved == 0 {
                converged = true;
                break;
            }
        }

        LocalMoves {
            labels,
            moves,
            passes,
            converged,
        }
    }

    /// Collapse communities into super-nodes
    fn aggregate(&self, assignment: &[usize], count: usize) -> LevelGraph {
        let mut self_loops = vec![0.0; count];
        let mut degrees = vec![0.0; count];
        let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for node in 0..self.len() {
            let community = assignment[node];
            self_loops[community] += self.self_loops[node];
            degrees[community] += self.degrees[node];

            for &(neighbor, weight) in &self.adjacency[node] {
                if neighbor <= node {
                    continue;
                }
                let other = assignment[neighbor];
                if other == community {
                    self_loops[community] += weight;
                } else {
                    let key = (community.min(other), community.max(other));
                    *between.entry(key).or_default() += weight;
                }
            }
        }

        let mut adjacency = vec![Vec::new(); count];
        for ((a, b), weight) in between {
            adjacency[a].push((b, weight));
            adjacency[b].push((a, weight));
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(n, _)| n);
        }

        LevelGraph {
            adjacency,
            self_loops,
            degrees,
            total_weight: self.total_weight,
        }
    }
}

/// Multi-level Louvain modularity optimizer
#[derive(Debug, Clone, Default)]
pub struct CommunityDetector {
    config: LouvainConfig,
}

impl CommunityDetector {
    /// Create a detector with default config
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LouvainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LouvainConfig {
        &self.config
    }

    /// Partition `graph` into communities.
    ///
    /// Never fails: an empty graph yields an empty partition with modularity
    /// 0.0, and hitting the pass cap is reported through `converged`.
    pub fn detect(&self, graph: &Graph) -> ClusteringResult {
        let node_count = graph.node_count();
        if node_count == 0 {
            return ClusteringResult::empty();
        }

        let resolution = self.config.resolution;
        let mut level_graph = LevelGraph::from_graph(graph);
        let mut membership: Vec<usize> = (0..node_count).collect();
        let mut objective = level_graph.objective(&membership, node_count, resolution);
        let mut levels = 0;
        let mut converged = true;

        while levels < self.config.max_levels && level_graph.len() > 1 {
            let local = level_graph.local_moving(resolution, self.config.max_passes);
            if !local.converged {
                converged = false;
                warn!(
                    level = levels,
                    passes = local.passes,
                    "Local moving hit the pass limit before stabilizing"
                );
            }
            if local.moves == 0 {
                break;
            }

            let (assignment, count) = renumber(&local.labels);
            let next_objective = level_graph.objective(&assignment, count, resolution);
            let improvement = next_objective - objective;
            if improvement <= 0.0 {
                debug!(level = levels, improvement, "Discarding non-improving level");
                break;
            }

            for community in membership.iter_mut() {
                *community = assignment[*community];
            }
            objective = next_objective;
            levels += 1;

            debug!(
                level = levels,
                nodes = level_graph.len(),
                communities = count,
                passes = local.passes,
                moves = local.moves,
                objective,
                "Completed Louvain level"
            );

            if improvement < self.config.min_improvement || count == 1 {
                break;
            }
            level_graph = level_graph.aggregate(&assignment, count);
        }

        let partition = Partition::from_assignment(membership);
        let modularity = score(graph, &partition, 1.0);
        let communities = summarize(graph, &partition);

        debug!(
            nodes = node_count,
            communities = partition.community_count(),
            levels,
            modularity,
            converged,
            "Community detection finished"
        );

        ClusteringResult {
            partition,
            modularity,
            communities,
            levels,
            converged,
        }
    }
}
