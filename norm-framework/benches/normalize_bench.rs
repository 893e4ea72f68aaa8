use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use norm_framework::Form;
use transform_core::Transformer;

fn ascii_input(len: usize) -> String {
    "the quick brown fox jumps over the lazy dog "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

fn accented_input(len: usize) -> String {
    "de\u{301}ja\u{300} vu q\u{E0}\u{323} \u{1100}\u{1161}\u{11A8} "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

fn bench_quick_span(c: &mut Criterion) {
    let input = ascii_input(16 * 1024);
    let bytes = input.as_bytes();
    let mut group = c.benchmark_group("quick_span");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("ascii_nfc", |b| {
        b.iter(|| black_box(Form::Nfc.quick_span(black_box(bytes))))
    });
    group.bench_function("ascii_nfkd", |b| {
        b.iter(|| black_box(Form::Nfkd.quick_span(black_box(bytes))))
    });
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let ascii = ascii_input(4096);
    let accented = accented_input(4096);
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Bytes(ascii.len() as u64));
    group.bench_function("ascii_nfc", |b| {
        b.iter(|| black_box(Form::Nfc.normalize(black_box(&ascii))))
    });
    group.bench_function("accented_nfc", |b| {
        b.iter(|| black_box(Form::Nfc.normalize(black_box(&accented))))
    });
    group.bench_function("accented_nfd", |b| {
        b.iter(|| black_box(Form::Nfd.normalize(black_box(&accented))))
    });
    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let input = accented_input(4096);
    let bytes = input.as_bytes();
    let mut group = c.benchmark_group("streaming");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("transform_nfc", |b| {
        let mut dst = vec![0u8; 8192];
        b.iter(|| {
            let mut t = Form::Nfc.normalizer();
            let mut consumed = 0;
            while consumed < bytes.len() {
                match t.transform(&mut dst, &bytes[consumed..], true) {
                    Ok((_, r)) => consumed += r,
                    Err(e) => consumed += e.progress().1,
                }
            }
            black_box(consumed)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_quick_span, bench_normalize, bench_streaming);
criterion_main!(benches);
