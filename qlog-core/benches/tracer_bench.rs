//! Benchmarks for the qlog tracer
//!
//! Measures the intake hot path and export at a few buffer sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::Utc;
use qlog_core::{ConnectionId, Frame, Header, Perspective, Tracer};

fn short_header(pn: u64) -> Header {
    Header::short(ConnectionId::from([1, 2, 3, 4, 5, 6, 7, 8]), pn)
}

fn data_frames() -> Vec<Frame> {
    vec![
        Frame::Stream {
            stream_id: 4,
            offset: 1200,
            data: vec![0; 1100],
            fin: false,
        },
        Frame::MaxStreamData {
            stream_id: 4,
            maximum: 1 << 20,
        },
        Frame::Ping,
    ]
}

fn filled_tracer(events: u64) -> Tracer {
    let mut tracer = Tracer::new(Perspective::Server, ConnectionId::from([0xde, 0xad]));
    let frames = data_frames();
    for pn in 0..events {
        tracer.record_sent(Utc::now(), &short_header(pn), &frames).unwrap();
    }
    tracer
}

fn bench_record_sent(c: &mut Criterion) {
    let frames = data_frames();
    let header = short_header(1);
    let now = Utc::now();

    c.bench_function("record_sent", |b| {
        let mut tracer = Tracer::new(Perspective::Server, ConnectionId::from([0xde, 0xad]));
        b.iter(|| {
            tracer
                .record_sent(black_box(now), black_box(&header), black_box(&frames))
                .unwrap()
        })
    });
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");

    for size in [10u64, 1_000, 10_000] {
        let tracer = filled_tracer(size);
        let mut buf = Vec::with_capacity(1 << 20);

        group.bench_with_input(BenchmarkId::from_parameter(size), &tracer, |b, tracer| {
            b.iter(|| {
                buf.clear();
                tracer.export(&mut buf).unwrap();
                black_box(buf.len())
            })
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let tracer = filled_tracer(1_000);

    c.bench_function("snapshot_1000", |b| {
        b.iter(|| black_box(tracer.snapshot().event_count()))
    });
}

criterion_group!(benches, bench_record_sent, bench_export, bench_snapshot);
criterion_main!(benches);
