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

//! Causegraph Core
//!
//! Groups concepts extracted from text into clusters of causally related
//! ideas. Extracted (subject, object, confidence) triples are validated and
//! merged into an undirected weighted concept graph, which is partitioned
//! with Louvain modularity optimization.
//!
//! ```no_run
//! use causegraph_core::{CausalClusterer, RawTriple};
//!
//! let run = CausalClusterer::default()
//!     .run(&[
//!         RawTriple::new("Oil Price", "Inflation", 0.9),
//!         RawTriple::new("Inflation", "Interest Rates", 0.8),
//!     ])
//!     .unwrap();
//! println!("{}", run.report.to_json_pretty().unwrap());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod ingest;
pub mod louvain;
pub mod pipeline;
pub mod report;
pub mod triple;

pub use config::{EngineConfig, IngestConfig, LouvainConfig, DEFAULT_CAUSAL_KEYWORDS};
pub use error::{CauseGraphError, Result};
pub use export::{ExportNode, ExportRelationship, ExportTriples, GraphExport};
pub use graph::{CausalEdge, ConceptNode, Graph, GraphBuilder, GraphSnapshot, NodeId};
pub use ingest::{CanonicalEdge, IngestOutcome, Rejection, RelationIngestor, ValidationError};
pub use louvain::{
    modularity, modularity_with_resolution, ClusteringResult, CommunityDetector,
    CommunitySummary, Partition,
};
pub use pipeline::{CausalClusterer, ClusterRun};
pub use report::{internal_density, Assignment, ClusterReport, ClusterReporter, CommunityReport};
pub use triple::{display_label, normalize_concept, RawTriple};
