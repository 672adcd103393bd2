//! Filename parsing and catalogue row throughput.
//!
//! Run with: `cargo bench --bench catalogue`

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use cordex_prep::catalogue::{CatalogueConstants, CatalogueRow};
use cordex_prep::filename::{merged_date_range, FilenameRecord};

const MODELS: [&str; 4] = ["ACCESS1-0", "CNRM-CM5", "MPI-ESM-LR", "NorESM1-M"];
const INSTITUTES: [&str; 3] = ["CSIRO-CCAM-2008", "CLMcom-HZG-CCLM5-0-15", "UNSW-WRF360J"];

fn sample_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let model = MODELS[i % MODELS.len()];
            let institute = INSTITUTES[i % INSTITUTES.len()];
            let start = 1950 + (i % 50) * 5;
            format!(
                "pr_AUS-44i_{model}_rcp85_r1i1p1_{institute}_v1_day_{start}0101-{}1231.nc",
                start + 4
            )
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let names = sample_names(1_000);
    let mut group = c.benchmark_group("filename");
    group.throughput(Throughput::Elements(names.len() as u64));

    group.bench_function("parse_1000", |b| {
        b.iter(|| {
            for name in &names {
                black_box(FilenameRecord::parse(black_box(name)).ok());
            }
        })
    });

    group.bench_function("merged_date_range_1000", |b| {
        b.iter(|| black_box(merged_date_range(black_box(&names)).ok()))
    });

    group.finish();
}

fn bench_rows(c: &mut Criterion) {
    let names = sample_names(1_000);
    let records: Vec<FilenameRecord> = names
        .iter()
        .filter_map(|name| FilenameRecord::parse(name).ok())
        .collect();
    let constants = CatalogueConstants {
        project: "CORDEX".to_string(),
        product: "output".to_string(),
        version: "v1".to_string(),
    };
    let dir = PathBuf::from("scratch/step2_regrid_AUS-44i/rcp85");

    let mut group = c.benchmark_group("catalogue");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("rows_1000", |b| {
        b.iter(|| {
            let rows: Vec<CatalogueRow> = records
                .iter()
                .map(|record| {
                    CatalogueRow::from_record(record, &dir.join(record.file_name()), &constants)
                })
                .collect();
            black_box(rows)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_rows);
criterion_main!(benches);
