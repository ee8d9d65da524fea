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

//! End-to-end clustering behavior over the public API

use causegraph_core::{
    modularity, CausalClusterer, CommunityDetector, EngineConfig, GraphExport, RawTriple,
    ValidationError,
};

fn two_clusters() -> Vec<RawTriple> {
    vec![
        RawTriple::new("Oil Price", "Inflation", 0.9),
        RawTriple::new("Inflation", "Interest Rates", 0.8),
        RawTriple::new("Interest Rates", "Oil Price", 0.7),
        RawTriple::new("Drought", "Crop Yield", 0.9),
        RawTriple::new("Crop Yield", "Food Prices", 0.8),
        RawTriple::new("Food Prices", "Drought", 0.6),
        RawTriple::new("Food Prices", "Inflation", 0.1),
    ]
}

#[test]
fn test_two_causal_clusters() {
    let run = CausalClusterer::default().run(&two_clusters()).unwrap();
    let report = &run.report;

    assert_eq!(report.node_count, 6);
    assert_eq!(report.edge_count, 7);
    assert_eq!(report.community_count(), 2);
    assert!(report.modularity > 0.3);
    assert!(report.converged);

    let economy = report.community_of("Oil Price").unwrap();
    assert_eq!(report.community_of("Inflation"), Some(economy));
    assert_eq!(report.community_of("Interest Rates"), Some(economy));

    let agriculture = report.community_of("Drought").unwrap();
    assert_ne!(economy, agriculture);
    assert_eq!(report.community_of("Crop Yield"), Some(agriculture));
    assert_eq!(report.community_of("Food Prices"), Some(agriculture));
}

#[test]
fn test_case_and_whitespace_variants_merge() {
    let run = CausalClusterer::default()
        .run(&[
            RawTriple::new("Oil  Price", "inflation", 0.5),
            RawTriple::new("oil price", " Inflation ", 0.25),
        ])
        .unwrap();

    assert_eq!(run.graph.node_count(), 2);
    assert_eq!(run.graph.edge_count(), 1);
    let edge = &run.graph.edges()[0];
    assert_eq!(edge.weight, 0.75);
    assert_eq!(edge.observations, 2);
}

#[test]
fn test_reverse_direction_merges_into_one_edge() {
    let run = CausalClusterer::default()
        .run(&[
            RawTriple::new("A", "B", 0.5),
            RawTriple::new("B", "A", 0.5),
            RawTriple::new("A", "B", 0.5),
        ])
        .unwrap();

    assert_eq!(run.graph.edge_count(), 1);
    let edge = &run.graph.edges()[0];
    assert_eq!(edge.weight, 1.5);
    assert_eq!(edge.forward, 2);
    assert_eq!(edge.backward, 1);
}

#[test]
fn test_invalid_triples_are_skipped_not_fatal() {
    let mut triples = two_clusters();
    triples.push(RawTriple::new("Inflation", "inflation", 0.9));
    triples.push(RawTriple::new("Gold", "Silver", 1.5));
    triples.push(RawTriple::new("", "Silver", 0.5));

    let run = CausalClusterer::default().run(&triples).unwrap();

    assert_eq!(run.rejected.len(), 3);
    assert!(matches!(run.rejected[0].reason, ValidationError::SelfLoop(_)));
    assert!(matches!(
        run.rejected[1].reason,
        ValidationError::InvalidConfidence(_)
    ));
    assert_eq!(run.rejected[2].reason, ValidationError::MissingSubject);
    assert_eq!(run.rejected[2].index, 9);
    assert_eq!(run.report.node_count, 6);
}

#[test]
fn test_disconnected_components_never_share_a_community() {
    let run = CausalClusterer::default()
        .run(&[
            RawTriple::new("A", "B", 0.9),
            RawTriple::new("C", "D", 0.9),
            RawTriple::new("E", "F", 0.9),
        ])
        .unwrap();

    let report = &run.report;
    assert_eq!(report.community_count(), 3);
    assert_eq!(report.community_of("A"), report.community_of("B"));
    assert_ne!(report.community_of("A"), report.community_of("C"));
    assert_ne!(report.community_of("C"), report.community_of("E"));
}

#[test]
fn test_empty_input() {
    let run = CausalClusterer::default().run(&[]).unwrap();
    assert_eq!(run.report.node_count, 0);
    assert_eq!(run.report.modularity, 0.0);
    assert!(run.report.communities.is_empty());
    assert!(run.report.assignments.is_empty());
}

#[test]
fn test_reported_modularity_matches_partition() {
    let run = CausalClusterer::default().run(&two_clusters()).unwrap();
    let recomputed = modularity(&run.graph, &run.result.partition).unwrap();
    assert!((recomputed - run.report.modularity).abs() < 1e-12);
}

#[test]
fn test_repeated_runs_are_identical() {
    let clusterer = CausalClusterer::default();
    let first = clusterer.run(&two_clusters()).unwrap();
    let second = clusterer.run(&two_clusters()).unwrap();

    assert_eq!(first.report, second.report);
    assert_eq!(
        first.report.modularity.to_bits(),
        second.report.modularity.to_bits()
    );
    assert_eq!(
        first.report.to_json().unwrap(),
        second.report.to_json().unwrap()
    );
}

#[test]
fn test_clustering_collapsed_graph_is_stable() {
    let run = CausalClusterer::default().run(&two_clusters()).unwrap();
    let collapsed = run.graph.collapse(&run.result.partition).unwrap();
    assert_eq!(collapsed.node_count(), run.report.community_count());

    let again = CommunityDetector::new().detect(&collapsed);
    assert!(
        again.partition.community_count() == 1
            || again.modularity <= run.report.modularity + 1e-9
    );
}

#[test]
fn test_report_serializes_communities() {
    let run = CausalClusterer::default().run(&two_clusters()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&run.report.to_json().unwrap()).unwrap();

    assert_eq!(json["communities"].as_array().unwrap().len(), 2);
    assert_eq!(json["assignments"].as_array().unwrap().len(), 6);
    assert_eq!(json["communities"][0]["members"][0], "Oil Price");
    assert_eq!(json["communities"][0]["size"], 3);
}

#[test]
fn test_relation_filter_from_config() {
    let config = EngineConfig::from_toml_str(
        r#"
        [ingest]
        causal_keywords = ["causes"]
        "#,
    )
    .unwrap();
    let run = CausalClusterer::new(config)
        .run(&[
            RawTriple::new("Smoking", "Cancer", 0.9).with_relation("Causes"),
            RawTriple::new("Paris", "France", 0.9).with_relation("capital of"),
            RawTriple::new("Rain", "Flooding", 0.9),
        ])
        .unwrap();

    assert_eq!(run.rejected.len(), 1);
    assert!(matches!(
        run.rejected[0].reason,
        ValidationError::NonCausalRelation(_)
    ));
    assert_eq!(run.report.node_count, 4);
}

#[test]
fn test_cluster_graph_export() {
    let export: GraphExport = r#"{
        "nodes": [
            {"id": "1", "labels": ["Entity"], "properties": {"name": "Deforestation"}},
            {"id": "2", "labels": ["Entity"], "properties": {"name": "Soil Erosion"}},
            {"id": "3", "labels": ["Entity"], "properties": {"name": "Flooding"}},
            {"id": "4", "labels": ["Entity"], "properties": {"name": "Tourism"}}
        ],
        "relationships": [
            {"start": "1", "end": "2", "type": "RELATION", "properties": {"type": "has effect"}},
            {"start": "2", "end": "3", "type": "RELATION", "properties": {"type": "has effect"}},
            {"start": "3", "end": "7", "type": "RELATION", "properties": {"type": "has effect"}}
        ]
    }"#
    .parse()
    .unwrap();

    let loaded = export.to_triples();
    assert_eq!(loaded.skipped, 1);

    let run = CausalClusterer::default()
        .run_with_concepts(&loaded.triples, &export.concepts())
        .unwrap();

    assert_eq!(run.report.node_count, 4);
    assert_eq!(run.report.edge_count, 2);
    assert_eq!(run.report.community_count(), 2);
    assert_eq!(
        run.report.community_of("Deforestation"),
        run.report.community_of("Flooding")
    );
    assert_ne!(
        run.report.community_of("Deforestation"),
        run.report.community_of("Tourism")
    );
}
