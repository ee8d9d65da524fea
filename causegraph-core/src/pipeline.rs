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

//! Clustering Pipeline
//!
//! ```text
//! raw triples → RelationIngestor → canonical edges → Graph
//!                                                      ↓
//!                   ClusterReport ← ClusterReporter ← CommunityDetector
//! ```

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::ingest::{IngestOutcome, Rejection, RelationIngestor};
use crate::louvain::{ClusteringResult, CommunityDetector};
use crate::report::{ClusterReport, ClusterReporter};
use crate::triple::RawTriple;
use tracing::info;

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct ClusterRun {
    pub report: ClusterReport,
    /// Triples skipped during ingestion
    pub rejected: Vec<Rejection>,
    pub graph: Graph,
    pub result: ClusteringResult,
}

/// End-to-end clustering of causal triples
#[derive(Debug, Clone)]
pub struct CausalClusterer {
    ingestor: RelationIngestor,
    detector: CommunityDetector,
    reporter: ClusterReporter,
}

impl CausalClusterer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            ingestor: RelationIngestor::with_config(config.ingest),
            detector: CommunityDetector::with_config(config.detection),
            reporter: ClusterReporter::new(),
        }
    }

    pub fn ingestor(&self) -> &RelationIngestor {
        &self.ingestor
    }

    pub fn detector(&self) -> &CommunityDetector {
        &self.detector
    }

    /// Cluster one ordered batch of triples
    pub fn run(&self, triples: &[RawTriple]) -> Result<ClusterRun> {
        let outcome = self.ingestor.ingest(triples);
        self.cluster(outcome, &[])
    }

    /// Cluster independent batches, ingesting them in parallel
    pub fn run_batches(&self, batches: &[Vec<RawTriple>]) -> Result<ClusterRun> {
        let outcome = self.ingestor.ingest_batches(batches);
        self.cluster(outcome, &[])
    }

    /// Cluster triples plus concepts that must appear even without edges
    pub fn run_with_concepts(&self, triples: &[RawTriple], concepts: &[String]) -> Result<ClusterRun> {
        let outcome = self.ingestor.ingest(triples);
        self.cluster(outcome, concepts)
    }

    fn cluster(&self, outcome: IngestOutcome, concepts: &[String]) -> Result<ClusterRun> {
        let graph = Graph::from_ingest(&outcome, concepts)?;

        let result = self.detector.detect(&graph);
        let report = self.reporter.report(&graph, &result);

        info!(
            accepted = outcome.accepted,
            rejected = outcome.rejected.len(),
            nodes = report.node_count,
            edges = report.edge_count,
            communities = report.community_count(),
            modularity = report.modularity,
            "Clustered causal graph"
        );

        Ok(ClusterRun {
            report,
            rejected: outcome.rejected,
            graph,
            result,
        })
    }
}

impl Default for CausalClusterer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_reports_rejections() {
        let clusterer = CausalClusterer::default();
        let run = clusterer
            .run(&[
                RawTriple::new("A", "B", 0.9),
                RawTriple::new("A", "A", 0.7),
                RawTriple::new("C", "D", 0.8),
            ])
            .unwrap();

        assert_eq!(run.rejected.len(), 1);
        assert_eq!(run.report.node_count, 4);
        assert_eq!(run.report.community_count(), 2);
        assert_eq!(run.graph.node_count(), 4);
        assert_eq!(run.result.partition.len(), 4);
    }

    #[test]
    fn test_run_with_isolated_concepts() {
        let clusterer = CausalClusterer::default();
        let run = clusterer
            .run_with_concepts(
                &[RawTriple::new("A", "B", 0.9)],
                &["Gold".to_string(), "a".to_string(), "  ".to_string()],
            )
            .unwrap();

        assert_eq!(run.report.node_count, 3);
        assert_eq!(run.report.community_count(), 2);
        assert_eq!(run.report.community_of("Gold"), Some(1));
    }

    #[test]
    fn test_run_batches_matches_run() {
        let clusterer = CausalClusterer::default();
        let batches = vec![
            vec![RawTriple::new("A", "B", 0.9), RawTriple::new("B", "C", 0.4)],
            vec![RawTriple::new("D", "E", 0.8), RawTriple::new("C", "A", 0.3)],
        ];
        let flat: Vec<RawTriple> = batches.iter().flatten().cloned().collect();

        let batched = clusterer.run_batches(&batches).unwrap();
        let sequential = clusterer.run(&flat).unwrap();
        assert_eq!(batched.report, sequential.report);
    }

    #[test]
    fn test_empty_run() {
        let run = CausalClusterer::default().run(&[]).unwrap();
        assert!(run.graph.is_empty());
        assert_eq!(run.report.community_count(), 0);
        assert_eq!(run.report.modularity, 0.0);
    }
}
