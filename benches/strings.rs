use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use mzlayout::config::StringsConfig;
use mzlayout::strings::{extract_ascii, extract_strings, extract_unicode};

/// Mixed content: ASCII words, UTF-16LE words and binary noise.
fn synthetic(len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    let mut state = 0x2545_f491_4f6c_dd1du64;
    while data.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        match state % 4 {
            0 => data.extend_from_slice(b"GetProcAddress\0"),
            1 => data.extend("kernel32".bytes().flat_map(|b| [b, 0])),
            _ => data.extend_from_slice(&state.to_le_bytes()),
        }
    }
    data.truncate(len);
    data
}

fn bench_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");
    let cfg = StringsConfig::default();
    for size in [64 * 1024, 1024 * 1024] {
        let data = synthetic(size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("ascii/{}", size), |b| {
            b.iter(|| extract_ascii(black_box(&data), 4).count())
        });
        group.bench_function(format!("unicode/{}", size), |b| {
            b.iter(|| extract_unicode(black_box(&data), 4).count())
        });
        group.bench_function(format!("merged/{}", size), |b| {
            b.iter(|| extract_strings(black_box(&data), &cfg).len())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_strings);
criterion_main!(benches);
