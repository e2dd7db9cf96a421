//! # Moodtune Performance Benchmarks
//!
//! Benchmarks for the hot paths of a capture: aggregation, recommendation
//! lookup and history writes.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench aggregation
//! cargo bench history
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use moodtune::aggregator;
use moodtune::history::{decode_history, encode_history, HistoryEntry, MoodHistory};
use moodtune::mood::{AggregatedMood, Emotion, Observation};
use moodtune::recommend::{CatalogRecommender, RecommendationSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// Helper producing a reproducible batch of observations
fn create_observations(count: usize) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let label = Emotion::ALL[rng.gen_range(0..Emotion::ALL.len())];
            Observation::new(label, rng.gen::<f64>())
        })
        .collect()
}

fn create_entries(count: usize) -> Vec<HistoryEntry> {
    create_observations(count)
        .iter()
        .map(|o| HistoryEntry::new(&AggregatedMood::new(o.label, o.confidence), chrono::Utc::now()))
        .collect()
}

/// Benchmark majority-vote aggregation
fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for size in [3, 10, 100, 1000].iter() {
        let observations = create_observations(*size);

        group.bench_with_input(
            BenchmarkId::new("aggregate", size),
            &observations,
            |b, observations| b.iter(|| aggregator::aggregate(black_box(observations))),
        );
        group.bench_with_input(
            BenchmarkId::new("tally", size),
            &observations,
            |b, observations| b.iter(|| aggregator::tally(black_box(observations))),
        );
    }

    group.finish();
}

/// Benchmark catalog lookups
fn benchmark_recommendation(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommendation");
    let recommender = CatalogRecommender::seeded(7);

    group.bench_function("recommend_happy", |b| {
        b.iter(|| recommender.recommend(black_box(Emotion::Happy)))
    });
    group.bench_function("recommend_unknown_label", |b| {
        b.iter(|| recommender.recommend_label(black_box("bored")))
    });

    group.finish();
}

/// Benchmark history persistence
fn benchmark_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");
    let mood = AggregatedMood::new(Emotion::Sad, 0.4);

    group.bench_function("record_into_empty", |b| {
        b.iter_batched(
            || MoodHistory::open_in_memory().expect("Failed to open history"),
            |mut history| history.record(black_box(&mood)),
            BatchSize::SmallInput,
        )
    });

    for size in [10, 100, 1000].iter() {
        let encoded = encode_history(&create_entries(*size)).expect("Failed to encode history");

        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, encoded| {
            b.iter(|| decode_history(black_box(encoded)))
        });
    }

    group.finish();
}

// Group all benchmarks
criterion_group!(
    benches,
    benchmark_aggregation,
    benchmark_recommendation,
    benchmark_history
);

criterion_main!(benches);
