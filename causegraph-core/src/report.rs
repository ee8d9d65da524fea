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

//! Cluster Reports
//!
//! Turns a [`ClusteringResult`] into the record downstream consumers read
//! (visualization, alerting). Pure aggregation, no clustering logic.

use crate::error::Result;
use crate::graph::Graph;
use crate::louvain::ClusteringResult;
use serde::{Deserialize, Serialize};

/// One community in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityReport {
    pub id: usize,
    /// Concept labels, ascending node id
    pub members: Vec<String>,
    pub size: usize,
    /// internal weight / possible internal edges; can exceed 1 since weights
    /// are summed confidences
    pub internal_density: f64,
    pub internal_weight: f64,
    pub total_degree: f64,
}

/// Row of the node → community table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub concept: String,
    pub community: usize,
}

/// Structured clustering report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub communities: Vec<CommunityReport>,
    pub assignments: Vec<Assignment>,
    pub modularity: f64,
    pub node_count: usize,
    pub edge_count: usize,
    pub levels: usize,
    pub converged: bool,
}

impl ClusterReport {
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    /// Community of a concept, by label
    pub fn community_of(&self, concept: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.concept == concept)
            .map(|a| a.community)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Formats clustering results
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterReporter;

impl ClusterReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, graph: &Graph, result: &ClusteringResult) -> ClusterReport {
        let label = |node: usize| {
            graph
                .node(node)
                .map(|n| n.label.clone())
                .unwrap_or_else(|| format!("node-{}", node))
        };

        let communities = result
            .communities
            .iter()
            .map(|c| CommunityReport {
                id: c.id,
                members: c.members.iter().map(|&n| label(n)).collect(),
                size: c.members.len(),
                internal_density: internal_density(c.internal_weight, c.members.len()),
                internal_weight: c.internal_weight,
                total_degree: c.total_degree,
            })
            .collect();

        let assignments = result
            .partition
            .assignment()
            .iter()
            .enumerate()
            .map(|(node, &community)| Assignment {
                concept: label(node),
                community,
            })
            .collect();

        ClusterReport {
            communities,
            assignments,
            modularity: result.modularity,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            levels: result.levels,
            converged: result.converged,
        }
    }
}

/// Internal weight over the number of possible member pairs
pub fn internal_density(internal_weight: f64, size: usize) -> f64 {
    if size < 2 {
        return 0.0;
    }
    let possible = (size * (size - 1)) as f64 / 2.0;
    internal_weight / possible
}
