//! Benchmarks for the segment decoder.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use iex_feed::gap::GapTracker;
use iex_feed::parser::{parse_segment, SegmentDecoder};
use iex_feed::quote::QuoteMessage;
use iex_feed::sniffer::sniff;
use iex_feed::synthetic::{SyntheticConfig, SyntheticGenerator};

fn feed(n: usize) -> Vec<Vec<u8>> {
    let config = SyntheticConfig {
        heartbeat_rate: 0.0,
        ..SyntheticConfig::default()
    };
    SyntheticGenerator::new(config)
        .and_then(|mut gen| gen.generate_n(n))
        .unwrap_or_default()
}

fn bench_segment_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");
    let datagrams = feed(1_000);
    let bytes: usize = datagrams.iter().map(Vec::len).sum();

    group.bench_function("sniff", |b| {
        b.iter(|| black_box(sniff(black_box(&datagrams[0]))));
    });

    group.bench_function("parse_header", |b| {
        b.iter(|| black_box(parse_segment(black_box(&datagrams[0])).map(|s| s.header)));
    });

    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("decode_1000", |b| {
        let decoder = SegmentDecoder::with_defaults();
        b.iter(|| {
            let mut tracker = GapTracker::new();
            for d in &datagrams {
                let _ = black_box(decoder.decode(&mut tracker, d));
            }
        });
    });

    group.finish();
}

fn bench_quote(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote");
    let mut gen = SyntheticGenerator::new(SyntheticConfig::default()).expect("default config");
    let encoded = gen.next_quote().encode();

    group.bench_function("decode", |b| {
        b.iter(|| black_box(QuoteMessage::decode(black_box(&encoded))));
    });

    group.bench_function("generate", |b| {
        b.iter(|| black_box(gen.next_quote()));
    });

    group.finish();
}

criterion_group!(benches, bench_segment_decoding, bench_quote);
criterion_main!(benches);
