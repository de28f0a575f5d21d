use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fabmaster::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bench_tokenize(c: &mut Criterion) {
    let text = std::fs::read_to_string(fixture_path("minimal_board.txt")).unwrap_or_default();

    c.bench_function("tokenize", |b| {
        b.iter(|| fabmaster::parser::tokenize(black_box(&text)));
    });
}

fn bench_import(c: &mut Criterion) {
    let options = ImportOptions::default();

    c.bench_function("import_board", |b| {
        b.iter(|| {
            FabmasterImporter::load(
                black_box(&fixture_path("minimal_board.txt")),
                None,
                black_box(&options),
                None,
            )
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_import);
criterion_main!(benches);
