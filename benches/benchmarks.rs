use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rate_history::calendar::snapshot_filename;
use rate_history::data::{FileIndex, FileIndexEntry, InMemorySnapshotReader};
use rate_history::retention::{default_periods, sample, Aggregator};

const CURRENCIES: [&str; 8] = ["AUD", "CAD", "CHF", "CNY", "EUR", "GBP", "JPY", "SEK"];

/// Five years of daily snapshots with a handful of currencies each
fn archive() -> (FileIndex, InMemorySnapshotReader, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let days = 5 * 365;
    let mut reader = InMemorySnapshotReader::new();
    let mut entries = Vec::with_capacity(days);

    for i in 0..days {
        let date = start + Duration::days(i as i64);
        let rates: Vec<String> = CURRENCIES
            .iter()
            .enumerate()
            .map(|(c, code)| format!("\"{}\":{}", code, 1.0 + c as f64 * 0.1 + i as f64 * 1e-4))
            .collect();
        let name = snapshot_filename(date);
        reader.insert(
            name.clone(),
            format!(
                r#"{{"timestamp":{},"base":"USD","rates":{{{}}}}}"#,
                1_546_300_800 + i as i64 * 86_400,
                rates.join(",")
            ),
        );
        entries.push(FileIndexEntry::new(name, date));
    }

    let reference = start + Duration::days(days as i64 - 1);
    (FileIndex::from_entries(entries), reader, reference)
}

fn benchmark_index(c: &mut Criterion) {
    let names: Vec<String> = (0..5 * 365)
        .rev()
        .map(|i| snapshot_filename(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap() + Duration::days(i)))
        .collect();

    c.bench_function("index_5y_filenames", |b| {
        b.iter(|| FileIndex::from_filenames(black_box(names.clone())));
    });
}

fn benchmark_sampling(c: &mut Criterion) {
    let (index, _, reference) = archive();
    let periods = default_periods();

    c.bench_function("sample_all_periods", |b| {
        b.iter(|| {
            for period in &periods {
                black_box(sample(&index, period.lookback_days, &period.rule, reference));
            }
        });
    });
}

fn benchmark_aggregation(c: &mut Criterion) {
    let (index, reader, reference) = archive();
    let periods = default_periods();

    for parallel in [false, true] {
        let name = if parallel {
            "aggregate_all_periods_parallel"
        } else {
            "aggregate_all_periods"
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                for period in &periods {
                    let picked = sample(&index, period.lookback_days, &period.rule, reference);
                    let result = Aggregator::new(&reader, "USD")
                        .with_parallel_reads(parallel)
                        .aggregate(&picked.selected);
                    black_box(result.artifact.map(|a| a.to_json_bytes()));
                }
            });
        });
    }
}

criterion_group!(
    benches,
    benchmark_index,
    benchmark_sampling,
    benchmark_aggregation
);
criterion_main!(benches);
