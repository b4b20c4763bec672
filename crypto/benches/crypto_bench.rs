use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dailyread_crypto::{numeric_code, open, seal, sha256, KeyBytes};

fn seal_bench(c: &mut Criterion) {
    let key = KeyBytes::generate();
    let credential = [42u8; 64];

    c.bench_function("aes256gcm_seal_64B", |b| {
        b.iter(|| seal(&key, black_box(&credential)))
    });
}

fn open_bench(c: &mut Criterion) {
    let key = KeyBytes::generate();
    let envelope = seal(&key, &[42u8; 64]).unwrap();

    c.bench_function("aes256gcm_open_64B", |b| {
        b.iter(|| open(&key, black_box(&envelope)))
    });
}

fn sha256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("sha256_256B", |b| b.iter(|| sha256(black_box(&data))));
}

fn numeric_code_bench(c: &mut Criterion) {
    c.bench_function("numeric_code_6", |b| b.iter(|| numeric_code(black_box(6))));
}

criterion_group!(benches, seal_bench, open_bench, sha256_bench, numeric_code_bench);
criterion_main!(benches);
