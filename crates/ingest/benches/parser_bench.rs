//! 수집 파이프라인 벤치마크
//!
//! 스트리밍 파서와 평탄화 변환기의 처리량을 측정합니다.

use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use warden_core::types::JsonFormat;
use warden_ingest::parser::{EventStream, ParserLimits};
use warden_ingest::transform::EventTransformer;

/// 짧은 보안 이벤트 한 건
const EVENT_SHORT: &str = r#"{"timestamp":"2024-01-15T12:00:00Z","source":"auth","user":"root","message":"Failed password"}"#;

/// 중첩 구조를 포함한 긴 이벤트 한 건
const EVENT_LONG: &str = r#"{"timestamp":"2024-01-15T12:00:00.123456Z","source":"sysmon","host":"prod-web-01","process":{"image":"/usr/sbin/sshd","command_line":"sshd: root [priv]","pid":4312},"network":{"src_ip":"203.0.113.45","dst_port":22,"protocol":"tcp"},"tags":["auth","remote","bruteforce"],"severity":"high"}"#;

fn limits() -> ParserLimits {
    ParserLimits {
        max_events_per_file: 1_000_000,
        max_parse_errors: 1_000,
        continue_on_parse_errors: true,
    }
}

fn ndjson_fixture(line: &str, count: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for _ in 0..count {
        file.write_all(line.as_bytes()).unwrap();
        file.write_all(b"\n").unwrap();
    }
    file.flush().unwrap();
    file
}

fn array_fixture(element: &str, count: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let elements: Vec<&str> = std::iter::repeat(element).take(count).collect();
    file.write_all(format!("[{}]", elements.join(",")).as_bytes())
        .unwrap();
    file.flush().unwrap();
    file
}

fn bench_ndjson_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndjson_stream");

    let short = ndjson_fixture(EVENT_SHORT, 1000);
    group.throughput(Throughput::Elements(1000));
    group.bench_function("short_1000", |b| {
        b.iter(|| {
            let stream =
                EventStream::open(black_box(short.path()), JsonFormat::Ndjson, limits()).unwrap();
            stream.count()
        })
    });

    let long = ndjson_fixture(EVENT_LONG, 1000);
    group.bench_function("long_nested_1000", |b| {
        b.iter(|| {
            let stream =
                EventStream::open(black_box(long.path()), JsonFormat::Ndjson, limits()).unwrap();
            stream.count()
        })
    });

    group.finish();
}

fn bench_array_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_stream");

    let fixture = array_fixture(EVENT_SHORT, 1000);
    group.throughput(Throughput::Elements(1000));
    group.bench_function("short_1000", |b| {
        b.iter(|| {
            let stream =
                EventStream::open(black_box(fixture.path()), JsonFormat::JsonArray, limits())
                    .unwrap();
            stream.count()
        })
    });

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let transformer = EventTransformer::new();
    let short: serde_json::Value = serde_json::from_str(EVENT_SHORT).unwrap();
    let long: serde_json::Value = serde_json::from_str(EVENT_LONG).unwrap();

    let mut group = c.benchmark_group("transform");

    group.throughput(Throughput::Elements(1));
    group.bench_function("flat_event", |b| {
        b.iter(|| transformer.transform(black_box(&short), "tenant-01", "auth"))
    });

    group.bench_function("nested_event", |b| {
        b.iter(|| transformer.transform(black_box(&long), "tenant-01", "sysmon"))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ndjson_stream,
    bench_array_stream,
    bench_transform
);
criterion_main!(benches);
