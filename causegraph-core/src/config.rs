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

//! Engine configuration
//!
//! Two sections: `[ingest]` controls triple validation and `[detection]`
//! controls the Louvain optimizer. Every field has a default, so an empty
//! TOML file is a valid configuration.
//!
//! ```toml
//! [ingest]
//! filter_relations = true
//! causal_keywords = ["has cause", "has effect"]
//!
//! [detection]
//! resolution = 1.0
//! max_passes = 100
//! ```

use crate::error::{CauseGraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Relation labels treated as causal when `filter_relations` is on.
pub const DEFAULT_CAUSAL_KEYWORDS: &[&str] = &[
    "encodes",
    "use",
    "uses",
    "based on",
    "connects with",
    "endemic to",
    "influenced by",
    "followed by",
    "follows",
    "has cause",
    "has effect",
    "inception",
];

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub detection: LouvainConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Substrings (case-insensitive) that mark a relation label as causal
    #[serde(default = "default_causal_keywords")]
    pub causal_keywords: Vec<String>,

    /// Reject labelled triples whose relation matches no causal keyword.
    /// Triples without a relation label are always accepted.
    #[serde(default = "default_filter_relations")]
    pub filter_relations: bool,

    /// Reject triples that carry no provenance id
    #[serde(default)]
    pub require_source: bool,
}

/// Louvain optimizer settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LouvainConfig {
    /// Resolution parameter (higher = more, smaller communities)
    #[serde(default = "default_resolution")]
    pub resolution: f64,

    /// Maximum local-moving passes per level
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// Maximum aggregation levels
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Minimum objective improvement for another level to run
    #[serde(default = "default_min_improvement")]
    pub min_improvement: f64,
}

fn default_causal_keywords() -> Vec<String> {
    DEFAULT_CAUSAL_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_filter_relations() -> bool {
    true
}

fn default_resolution() -> f64 {
    1.0
}

fn default_max_passes() -> usize {
    100
}

fn default_max_levels() -> usize {
    32
}

fn default_min_improvement() -> f64 {
    1e-9
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            causal_keywords: default_causal_keywords(),
            filter_relations: default_filter_relations(),
            require_source: false,
        }
    }
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            max_passes: default_max_passes(),
            max_levels: default_max_levels(),
            min_improvement: default_min_improvement(),
        }
    }
}

impl LouvainConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(CauseGraphError::InvalidConfig(format!(
                "resolution must be a positive finite number, got {}",
                self.resolution
            )));
        }
        if self.max_passes == 0 {
            return Err(CauseGraphError::InvalidConfig(
                "max_passes must be at least 1".to_string(),
            ));
        }
        if self.max_levels == 0 {
            return Err(CauseGraphError::InvalidConfig(
                "max_levels must be at least 1".to_string(),
            ));
        }
        if !self.min_improvement.is_finite() || self.min_improvement < 0.0 {
            return Err(CauseGraphError::InvalidConfig(format!(
                "min_improvement must be non-negative, got {}",
                self.min_improvement
            )));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - CAUSEGRAPH_RESOLUTION: Louvain resolution (default: 1.0)
    /// - CAUSEGRAPH_MAX_PASSES: Local moving passes per level (default: 100)
    /// - CAUSEGRAPH_MAX_LEVELS: Aggregation levels (default: 32)
    /// - CAUSEGRAPH_MIN_IMPROVEMENT: Minimum gain per level (default: 1e-9)
    /// - CAUSEGRAPH_FILTER_RELATIONS: Filter relation labels by keyword (default: true)
    /// - CAUSEGRAPH_REQUIRE_SOURCE: Reject triples without provenance (default: false)
    pub fn from_env() -> Self {
        Self::default().merge_with_env()
    }

    /// Load configuration with priority: file > env > defaults
    ///
    /// Env vars only override fields they explicitly set.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            }
            Some(path) => {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        let config = config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    fn merge_with_env(self) -> Self {
        self.merge_with(|key| std::env::var(key).ok())
    }

    /// Apply `CAUSEGRAPH_*` overrides read through `lookup`
    fn merge_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|raw| (key.to_string(), raw));
        if let Some(val) = var("CAUSEGRAPH_RESOLUTION").and_then(parse_override) {
            self.detection.resolution = val;
        }
        if let Some(val) = var("CAUSEGRAPH_MAX_PASSES").and_then(parse_override) {
            self.detection.max_passes = val;
        }
        if let Some(val) = var("CAUSEGRAPH_MAX_LEVELS").and_then(parse_override) {
            self.detection.max_levels = val;
        }
        if let Some(val) = var("CAUSEGRAPH_MIN_IMPROVEMENT").and_then(parse_override) {
            self.detection.min_improvement = val;
        }
        if let Some(val) = var("CAUSEGRAPH_FILTER_RELATIONS").and_then(parse_override) {
            self.ingest.filter_relations = val;
        }
        if let Some(val) = var("CAUSEGRAPH_REQUIRE_SOURCE").and_then(parse_override) {
            self.ingest.require_source = val;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        if self.ingest.filter_relations
            && self.ingest.causal_keywords.iter().all(|k| k.trim().is_empty())
        {
            return Err(CauseGraphError::InvalidConfig(
                "filter_relations is enabled but no causal keywords are configured".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>((key, raw): (String, String)) -> Option<T> {
    match raw.trim().parse() {
        Ok(val) => Some(val),
        Err(_) => {
            tracing::warn!(key = %key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.detection.resolution, 1.0);
        assert_eq!(config.detection.max_passes, 100);
        assert!(config.ingest.filter_relations);
        assert!(config.ingest.causal_keywords.contains(&"has effect".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [detection]
            resolution = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.detection.resolution, 0.5);
        assert_eq!(config.detection.max_levels, 32);
        assert_eq!(config.ingest, IngestConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingest]\nrequire_source = true\n").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert!(config.ingest.require_source);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load(Some(PathBuf::from("/nonexistent/causegraph.toml")));
        assert!(config.is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("CAUSEGRAPH_MAX_LEVELS", "7"),
            ("CAUSEGRAPH_RESOLUTION", " 0.5 "),
            ("CAUSEGRAPH_REQUIRE_SOURCE", "not-a-bool"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::default()
            .merge_with(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.detection.max_levels, 7);
        assert_eq!(config.detection.resolution, 0.5);
        assert!(!config.ingest.require_source);
        assert_eq!(config.detection.max_passes, 100);
    }

    #[test]
    fn test_validate_rejects_bad_detection() {
        let mut config = EngineConfig::default();
        config.detection.resolution = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.detection.max_passes = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.detection.min_improvement = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_keyword_filter() {
        let mut config = EngineConfig::default();
        config.ingest.causal_keywords.clear();
        assert!(config.validate().is_err());

        config.ingest.filter_relations = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineConfig::from_toml_str("[detection\nresolution = ").unwrap_err();
        assert!(matches!(err, CauseGraphError::Toml(_)));
    }
}
