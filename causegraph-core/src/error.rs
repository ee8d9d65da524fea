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

//! Error types for the clustering engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, CauseGraphError>;

/// Errors that abort an operation.
///
/// Per-triple problems are not errors at this level; they are reported as
/// [`crate::ingest::Rejection`] diagnostics and the batch keeps going.
#[derive(Debug, Error)]
pub enum CauseGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid concept: {0}")]
    InvalidConcept(String),

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Invalid partition: {0}")]
    InvalidPartition(String),

    #[error("Partition covers {actual} nodes, graph has {expected}")]
    PartitionMismatch { expected: usize, actual: usize },

    #[error("Invalid graph export: {0}")]
    Export(String),
}
