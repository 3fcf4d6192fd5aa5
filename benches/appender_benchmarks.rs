//! Criterion benchmarks for kafka_log_appender

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kafka_log_appender::prelude::*;
use kafka_log_appender::producer::{DeliveryCallback, RecordMetadata};
use kafka_log_appender::BOOTSTRAP_SERVERS;

/// Acknowledges every record immediately without keeping it
struct DiscardProducer;

impl Producer for DiscardProducer {
    fn send(&self, record: ProducerRecord, callback: DeliveryCallback) -> Result<()> {
        callback(Ok(RecordMetadata {
            topic: record.topic,
            partition: 0,
            offset: 0,
        }));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

fn sample_event() -> LogEvent {
    LogEvent::new(LogLevel::Info, "order 4711 shipped")
        .with_logger("orders")
        .with_context_field("request_id", "a1b2c3")
}

fn appender(layout: LayoutConfig) -> KafkaAppender<DiscardProducer> {
    let config = KafkaAppenderConfig::new()
        .name("bench")
        .topic("bench-logs")
        .layout(layout)
        .property(BOOTSTRAP_SERVERS, "localhost:9092");
    KafkaAppender::create_with(config, StatusLogger::silent(), |_| Ok(DiscardProducer))
        .expect("bench appender")
}

// ============================================================================
// Layout Benchmarks
// ============================================================================

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("layouts");
    group.throughput(Throughput::Elements(1));
    let event = sample_event();

    let default = PatternLayout::default();
    group.bench_function("pattern_default", |b| {
        b.iter(|| black_box(default.to_bytes(black_box(&event))));
    });

    let detailed = PatternLayout::new("%d{ISO8601} [%t] %-5p %c - %m %X{request_id}%n")
        .expect("valid pattern");
    group.bench_function("pattern_detailed", |b| {
        b.iter(|| black_box(detailed.to_bytes(black_box(&event))));
    });

    let json = JsonLayout::new();
    group.bench_function("json", |b| {
        b.iter(|| black_box(json.to_bytes(black_box(&event))));
    });

    group.finish();
}

// ============================================================================
// Append Benchmarks
// ============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    group.throughput(Throughput::Elements(1));
    let event = sample_event();

    let pattern = appender(LayoutConfig::pattern("%-5p %c - %m%n"));
    group.bench_function("pattern_layout", |b| {
        b.iter(|| pattern.append(black_box(&event)));
    });

    let json = appender(LayoutConfig::json());
    group.bench_function("json_layout", |b| {
        b.iter(|| json.append(black_box(&event)));
    });

    group.finish();
}

fn bench_logger_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("logger_dispatch");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder()
        .name("bench")
        .min_level(LogLevel::Info)
        .status_logger(StatusLogger::silent())
        .appender(appender(LayoutConfig::pattern("%m%n")))
        .build();

    group.bench_function("enabled", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.bench_function("below_threshold", |b| {
        b.iter(|| logger.debug(black_box("Debug message")));
    });

    group.finish();
}

criterion_group!(benches, bench_layouts, bench_append, bench_logger_dispatch);
criterion_main!(benches);
