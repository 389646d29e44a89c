use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use motifmine::{enrich, EnrichConfig, Feature, InputMap};

/// Corpus of `sequences` ordinary sequences, `len` features each, mixing a
/// recurring core with per-sequence noise.
fn ordinary_corpus(sequences: i32, len: usize) -> InputMap {
    let mut map = InputMap::new();
    for key in 0..sequences {
        let features = (0..len)
            .map(|slot| {
                let id = if slot < 3 {
                    10 + slot as i32
                } else {
                    100 + (key * 31 + slot as i32 * 7) % 400
                };
                Feature::Ordinary {
                    id,
                    contribution: 1.0,
                }
            })
            .collect();
        map.insert(key, features);
    }
    map
}

fn convolution_corpus(sequences: i32) -> InputMap {
    let mut map = InputMap::new();
    for key in 0..sequences {
        let features = (0..8)
            .map(|slot| Feature::Convolution {
                filter_id: 1 + (key * 13 + slot * 5) % 50,
                contribution: 1.0,
                position: slot * 12,
            })
            .collect();
        map.insert(key, features);
    }
    map
}

fn enrich_ordinary_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("enrich_ordinary");
    let cfg = EnrichConfig::new().with_motif_size(3).with_min_count(2);

    for sequences in [50, 200] {
        let map = ordinary_corpus(sequences, 12);
        group.throughput(Throughput::Elements(sequences as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(sequences),
            &map,
            |b, map| {
                b.iter(|| {
                    let table = enrich(black_box(map.clone()), &cfg).expect("bench enrich");
                    black_box(table);
                });
            },
        );
    }
    group.finish();
}

fn enrich_convolution_bench(c: &mut Criterion) {
    let cfg = EnrichConfig::new()
        .with_motif_size(3)
        .with_filter_len(8)
        .with_min_count(2);
    let map = convolution_corpus(100);

    c.bench_function("enrich_convolution_100", |b| {
        b.iter(|| {
            let table = enrich(black_box(map.clone()), &cfg).expect("bench enrich");
            black_box(table);
        });
    });
}

fn sequential_vs_parallel_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("enrich_parallelism");
    let map = ordinary_corpus(200, 12);

    for use_parallel in [false, true] {
        let cfg = EnrichConfig::new()
            .with_motif_size(3)
            .with_min_count(2)
            .with_parallel(use_parallel);
        let label = if use_parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &map, |b, map| {
            b.iter(|| {
                let table = enrich(black_box(map.clone()), &cfg).expect("bench enrich");
                black_box(table);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    enrich_ordinary_bench,
    enrich_convolution_bench,
    sequential_vs_parallel_bench
);
criterion_main!(benches);
