//! Benchmarks for block-list membership lookup.
//!
//! Measures how quickly a query name can be classified as sinkholed.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};

use mercury::filter::Blocklist;

fn synthetic_list(entries: usize) -> Blocklist {
    let mut content = String::new();
    for i in 0..entries {
        content.push_str(&format!("ads-{i}.example.com.\n"));
    }
    Blocklist::from_lines(&content)
}

fn bench_is_blocked(c: &mut Criterion) {
    let blocklist = synthetic_list(100_000);

    let mut group = c.benchmark_group("blocklist");
    group.throughput(Throughput::Elements(1));

    group.bench_function(BenchmarkId::new("is_blocked", "hit"), |b| {
        b.iter(|| blocklist.is_blocked(black_box("ads-50000.example.com.")))
    });

    group.bench_function(BenchmarkId::new("is_blocked", "miss"), |b| {
        b.iter(|| blocklist.is_blocked(black_box("www.example.org.")))
    });

    group.finish();
}

fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    bench_is_blocked(&mut criterion);
    criterion.final_summary();
}
