//! Benchmarks for the dense store's brute-force k-NN and the hybrid
//! searcher's BM25 + RRF fusion hot paths.
//!
//! # Dataset size
//!
//! Uses 1,000 chunks for CI-friendly runtimes. Set `BENCH_FULL_SCALE=1` to
//! run against 100,000 chunks instead.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use qa_core::config::SearchConfig;
use qa_core::ports::{DenseStore, Filter};
use qa_core::types::DocumentChunk;
use qa_vector::embedding::{EmbeddingService, MockEmbedding};
use qa_vector::{Bm25Index, HybridSearcher, InMemoryVectorStore};

const CI_CHUNK_COUNT: usize = 1_000;
const FULL_SCALE_CHUNK_COUNT: usize = 100_000;

fn chunk_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_CHUNK_COUNT
    } else {
        CI_CHUNK_COUNT
    }
}

fn generate_chunk_text(index: usize) -> String {
    format!(
        "서울시는 창업 기업을 위한 지원금 사업을 공고하였으며, 신청 대상은 \
         중소기업 및 예비 창업자이다. 지원 내용은 사업화 자금, 멘토링, \
         R&D 연계 지원을 포함한다. 공고 식별자: {}",
        index
    )
}

fn build_chunks(count: usize) -> Vec<DocumentChunk> {
    (0..count as i64)
        .map(|i| DocumentChunk {
            chunk_id: i,
            policy_id: i % 200,
            chunk_index: (i % 5) as u32,
            content: generate_chunk_text(i as usize),
            doc_type: "support".to_string(),
            embedding: None,
        })
        .collect()
}

fn bench_dense_search(c: &mut Criterion) {
    let count = chunk_count();
    let chunks = build_chunks(count);
    let embedder = MockEmbedding::new();
    let store = InMemoryVectorStore::new();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    for chunk in &chunks {
        let embedding = rt.block_on(embedder.embed(&chunk.content)).expect("embed failed");
        store.insert(chunk.clone(), embedding).expect("insert failed");
    }

    let query_vec = rt
        .block_on(embedder.embed("창업 지원금 신청 대상"))
        .expect("query embed failed");

    let mut group = c.benchmark_group("dense_search");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function(format!("knn_top10_{count}chunks"), |b| {
        b.iter(|| {
            let hits = rt
                .block_on(store.dense_search(&query_vec, 10, &Filter::new(), 0.0))
                .expect("dense_search failed");
            assert!(!hits.is_empty());
            hits
        });
    });

    group.finish();
}

fn bench_hybrid_search(c: &mut Criterion) {
    let count = chunk_count();
    let chunks = build_chunks(count);
    let embedder = MockEmbedding::new();
    let store = Arc::new(InMemoryVectorStore::new());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    for chunk in &chunks {
        let embedding = rt.block_on(embedder.embed(&chunk.content)).expect("embed failed");
        store.insert(chunk.clone(), embedding).expect("insert failed");
    }

    let bm25 = Arc::new(Bm25Index::new());
    rt.block_on(bm25.warm_up(&chunks)).expect("bm25 warm_up failed");

    let searcher = HybridSearcher::new(Box::new(embedder), store, bm25, &chunks);
    let config = SearchConfig::default();

    let mut group = c.benchmark_group("hybrid_search");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function(format!("rrf_fused_top10_{count}chunks"), |b| {
        b.iter(|| {
            let hits = rt
                .block_on(searcher.search("창업 지원금 신청 대상", &Filter::new(), &config, 0.0))
                .expect("hybrid search failed");
            hits
        });
    });

    group.finish();
}

criterion_group!(benches, bench_dense_search, bench_hybrid_search);
criterion_main!(benches);
