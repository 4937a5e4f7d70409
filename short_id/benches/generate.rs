use criterion::{black_box, criterion_group, criterion_main, Criterion};
use short_id::{generate_short_id, ShortIdGenerator};

fn bench_default_generator(c: &mut Criterion) {
    c.bench_function("generate_short_id", |b| {
        b.iter(|| black_box(generate_short_id()));
    });
}

fn bench_worker_generator(c: &mut Criterion) {
    let generator = ShortIdGenerator::new(7).expect("valid worker id");

    c.bench_function("ShortIdGenerator::generate", |b| {
        b.iter(|| black_box(generator.generate()));
    });
}

criterion_group!(benches, bench_default_generator, bench_worker_generator);
criterion_main!(benches);
