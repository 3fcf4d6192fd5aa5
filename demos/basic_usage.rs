//! Basic usage example
//!
//! Wires a Kafka appender to an in-memory producer so it runs without a
//! broker, then prints what would have been published.
//!
//! Run with: cargo run --example basic_usage

use kafka_log_appender::prelude::*;
use kafka_log_appender::{info, warn, BOOTSTRAP_SERVERS};

fn main() {
    println!("=== Kafka Log Appender - Basic Usage Example ===\n");

    let status = StatusLogger::new();
    let producer = MemoryProducer::new();
    let handle = producer.handle();

    let config = KafkaAppenderConfig::new()
        .name("kafka")
        .topic("app-logs")
        .layout(LayoutConfig::pattern("%d{ISO8601} %-5p [%t] %c - %m%n"))
        .property(BOOTSTRAP_SERVERS, "localhost:9092");

    let Some(appender) = KafkaAppender::create_with(config, status.clone(), |_| Ok(producer)) else {
        eprintln!("appender configuration rejected");
        return;
    };

    let logger = Logger::builder()
        .name("checkout")
        .min_level(LogLevel::Debug)
        .status_logger(status)
        .appender(appender)
        .build();

    logger.debug("Cart loaded");
    info!(logger, "Order {} placed", 4711);
    warn!(logger, "Payment provider slow: {}ms", 850);

    // Drains the producer before reading what it received
    logger.stop();

    println!("Published {} records to app-logs:", handle.records().len());
    for message in handle.messages() {
        print!("  {}", message);
    }
}
