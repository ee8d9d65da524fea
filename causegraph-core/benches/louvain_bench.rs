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

use causegraph_core::{CommunityDetector, Graph, RawTriple, RelationIngestor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Ring of dense clusters joined by weak links
fn clustered_triples(clusters: usize, cluster_size: usize) -> Vec<RawTriple> {
    let mut triples = Vec::new();
    for c in 0..clusters {
        for i in 0..cluster_size {
            for j in (i + 1)..cluster_size {
                triples.push(RawTriple::new(
                    format!("concept-{}-{}", c, i),
                    format!("concept-{}-{}", c, j),
                    0.5 + ((i + j) % 5) as f64 / 10.0,
                ));
            }
        }
        let next = (c + 1) % clusters;
        triples.push(RawTriple::new(
            format!("concept-{}-0", c),
            format!("concept-{}-0", next),
            0.1,
        ));
    }
    triples
}

fn bench_ingest(c: &mut Criterion) {
    let ingestor = RelationIngestor::new();
    let mut group = c.benchmark_group("ingest");

    for clusters in [10, 100, 500].iter() {
        let triples = clustered_triples(*clusters, 8);
        group.throughput(Throughput::Elements(triples.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(clusters), &triples, |b, triples| {
            b.iter(|| ingestor.ingest(black_box(triples)));
        });
    }

    group.finish();
}

fn bench_ingest_batches(c: &mut Criterion) {
    let ingestor = RelationIngestor::new();
    let triples = clustered_triples(500, 8);
    let batches: Vec<Vec<RawTriple>> = triples.chunks(256).map(|chunk| chunk.to_vec()).collect();

    c.bench_function("ingest_batches_500", |b| {
        b.iter(|| ingestor.ingest_batches(black_box(&batches)));
    });
}

fn bench_louvain(c: &mut Criterion) {
    let ingestor = RelationIngestor::new();
    let detector = CommunityDetector::new();
    let mut group = c.benchmark_group("louvain");

    for clusters in [10, 100, 500].iter() {
        let outcome = ingestor.ingest(&clustered_triples(*clusters, 8));
        let graph = Graph::from_edges(&outcome.edges).unwrap();

        group.throughput(Throughput::Elements(graph.edge_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(clusters), &graph, |b, graph| {
            b.iter(|| detector.detect(black_box(graph)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_ingest_batches, bench_louvain);
criterion_main!(benches);
