use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use synckit_ot::{compose_all, protocol, DocOp, TextDocument};

/// A document of `lines` lines of 40 characters
fn document(lines: usize) -> TextDocument {
    let line = format!("{}\n", "x".repeat(40));
    TextDocument::from_text(&line.repeat(lines))
}

/// Operations produced by typing `count` characters at the start of line 0
fn typing_ops(doc: &mut TextDocument, count: usize) -> Vec<DocOp> {
    (0..count)
        .map(|i| doc.insert_op(0, i, "a").unwrap())
        .collect()
}

/// Benchmark capturing a single keystroke as an operation
fn bench_capture_insert(c: &mut Criterion) {
    c.bench_function("ot_capture_insert", |b| {
        b.iter_batched(
            || document(1000),
            |mut doc| {
                black_box(doc.insert_op(500, 20, "a").unwrap());
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// Benchmark composing a run of keystrokes into one operation
fn bench_compose_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ot_compose_typing");

    for size in [10, 100, 1000].iter() {
        let ops = typing_ops(&mut document(100), *size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &ops, |b, ops| {
            b.iter(|| black_box(compose_all(ops).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark transforming concurrent edits on different lines
fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("ot_transform");

    for lines in [10, 1000, 100000].iter() {
        let base = document(*lines);
        let client = base.clone().insert_op(lines / 3, 5, "client").unwrap();
        let server = base.clone().delete_op(lines / 2, 0, 41).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(lines),
            &(client, server),
            |b, (client, server)| {
                b.iter(|| black_box(client.transform(server).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark applying a remote operation to a large document
fn bench_apply(c: &mut Criterion) {
    let base = document(10000);
    let op = base.clone().insert_op(5000, 10, "remote edit\n").unwrap();

    c.bench_function("ot_apply_10k_lines", |b| {
        b.iter_batched(
            || base.clone(),
            |mut doc| {
                doc.apply(&op).unwrap();
                black_box(doc);
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// Benchmark JSON encoding and decoding
fn bench_json(c: &mut Criterion) {
    let ops = typing_ops(&mut document(100), 200);
    let op = compose_all(&ops).unwrap().unwrap();
    let json = protocol::encode_json(&op).unwrap();

    c.bench_function("ot_json_encode", |b| {
        b.iter(|| black_box(protocol::encode_json(&op).unwrap()));
    });
    c.bench_function("ot_json_decode", |b| {
        b.iter(|| black_box(protocol::decode_json(&json).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_capture_insert,
    bench_compose_typing,
    bench_transform,
    bench_apply,
    bench_json
);
criterion_main!(benches);
