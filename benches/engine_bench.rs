// tcplite engine benchmarks using criterion.
//
// Measures:
//   - Segment/ACK frame encode/decode throughput
//   - Tahoe/Reno congestion window update throughput
//   - Reorder buffer insert/drain throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use bytes::Bytes;
use tcplite::config::Algorithm;
use tcplite::congestion::tahoe_reno::TahoeReno;
use tcplite::congestion::CongestionController;
use tcplite::frame::{Ack, Segment};
use tcplite::reorder::ReorderBuffer;

fn bench_segment_encode(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 1024, 5120];

    let mut group = c.benchmark_group("segment_encode");
    for &size in sizes {
        let payload = Bytes::from(vec![0xABu8; size]);
        let segment = Segment::data(42, payload);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}B")),
            &segment,
            |b, seg| {
                b.iter(|| {
                    black_box(seg.encode());
                });
            },
        );
    }
    group.finish();
}

fn bench_segment_decode(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 1024, 5120];

    let mut group = c.benchmark_group("segment_decode");
    for &size in sizes {
        let payload = Bytes::from(vec![0xABu8; size]);
        let encoded = Segment::data(42, payload).encode();
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}B")),
            &encoded,
            |b, data| {
                b.iter(|| {
                    black_box(Segment::decode(black_box(data)).unwrap());
                });
            },
        );
    }
    group.finish();
}

fn bench_ack_frame(c: &mut Criterion) {
    let ack = Ack::new(999, 131_072);

    c.bench_function("ack_frame_encode", |b| {
        b.iter(|| {
            black_box(ack.encode());
        });
    });

    let encoded = ack.encode();
    c.bench_function("ack_frame_decode", |b| {
        b.iter(|| {
            black_box(Ack::decode(black_box(&encoded)).unwrap());
        });
    });
}

fn bench_congestion_window(c: &mut Criterion) {
    c.bench_function("reno_slow_start_20_acks", |b| {
        b.iter(|| {
            let mut reno = TahoeReno::new(Algorithm::Reno, 128);
            for seq in 0..20 {
                reno.on_new_ack(seq, 1);
            }
            black_box(reno.cwnd());
        });
    });

    c.bench_function("reno_fast_retransmit_recovery_cycle", |b| {
        b.iter(|| {
            let mut reno = TahoeReno::new(Algorithm::Reno, 128);
            for seq in 0..20 {
                reno.on_new_ack(seq, 1);
            }
            reno.on_duplicate_ack(10);
            reno.on_duplicate_ack(10);
            reno.on_duplicate_ack(10);
            reno.on_new_ack(11, 1);
            black_box(reno.cwnd());
        });
    });
}

fn bench_reorder_buffer(c: &mut Criterion) {
    c.bench_function("reorder_insert_reverse_then_drain", |b| {
        b.iter(|| {
            let mut buf = ReorderBuffer::new();
            for seq in (1..=128).rev() {
                buf.try_insert(seq, Bytes::from_static(b"x"), 1_000_000);
            }
            black_box(buf.drain_contiguous(1));
        });
    });
}

criterion_group!(
    benches,
    bench_segment_encode,
    bench_segment_decode,
    bench_ack_frame,
    bench_congestion_window,
    bench_reorder_buffer
);
criterion_main!(benches);
