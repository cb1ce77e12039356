use std::hint::black_box;
use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use xvc_protocol::Message;

fn shift_message(num_bytes: usize) -> Message {
    Message::Shift {
        num_bits: (num_bytes * 8) as u32,
        tms: vec![0xAA; num_bytes].into_boxed_slice(),
        tdi: vec![0x55; num_bytes].into_boxed_slice(),
    }
}

fn encode_shift(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_shift");
    for num_bytes in [1, 64, 1024] {
        let message = shift_message(num_bytes);
        group.bench_with_input(BenchmarkId::from_parameter(num_bytes), &message, |b, m| {
            let mut out = Vec::with_capacity(10 + 2 * num_bytes);
            b.iter(|| {
                out.clear();
                black_box(m).write_to(&mut out).unwrap();
            })
        });
    }
    group.finish();
}

fn decode_shift(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_shift");
    for num_bytes in [1, 64, 1024] {
        let mut encoded = Vec::new();
        shift_message(num_bytes).write_to(&mut encoded).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(num_bytes), &encoded, |b, e| {
            b.iter(|| Message::from_reader(&mut Cursor::new(black_box(e)), 1024).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, encode_shift, decode_shift);
criterion_main!(benches);
