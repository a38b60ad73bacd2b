use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::num::NonZeroUsize;
use wordfreq::backend::ThreadBackend;
use wordfreq::count::{merge, rank_all, top_k, FrequencyTable};
use wordfreq::{count_with, Corpus, CountConfig};

fn create_corpus(lines: usize) -> Corpus {
    let mut text = String::with_capacity(lines * 64);
    for i in 0..lines {
        text.push_str(&format!(
            "Line {} lorem ipsum dolor{} sit amet consectetur{} adipiscing elit\n",
            i,
            i % 101,
            i % 997
        ));
    }
    Corpus::from_bytes(text)
}

fn create_table(words: usize, seed: usize) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for i in 0..words {
        let word = format!("word{}", (i * 7 + seed) % (words / 2 + 1));
        table.record(word.as_bytes()).unwrap();
    }
    table
}

fn bench_worker_scaling(c: &mut Criterion) {
    let corpus = create_corpus(50_000);
    let mut group = c.benchmark_group("Worker Scaling");
    for workers in [1usize, 2, 4, 8] {
        let config = CountConfig::new("bench.txt", NonZeroUsize::new(workers).unwrap());
        group.bench_function(format!("threads_{}", workers), |b| {
            b.iter(|| black_box(count_with(&config, &corpus, &ThreadBackend::new()).unwrap()));
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let tables: Vec<FrequencyTable> = (0..8).map(|i| create_table(20_000, i)).collect();
    c.bench_function("merge_8_tables", |b| {
        b.iter_batched(
            || tables.clone(),
            |tables| black_box(merge(tables).unwrap()),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_ranking(c: &mut Criterion) {
    let table = create_table(200_000, 3);
    let mut group = c.benchmark_group("Ranking");
    group.bench_function("top_10_heap", |b| {
        b.iter(|| black_box(top_k(&table, 10)));
    });
    group.bench_function("full_sort", |b| {
        b.iter(|| black_box(rank_all(&table)));
    });
    group.finish();
}

criterion_group!(benches, bench_worker_scaling, bench_merge, bench_ranking);
criterion_main!(benches);
