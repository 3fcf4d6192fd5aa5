//! Kafka logging example
//!
//! Publishes a few JSON log lines to a real broker. Delivery failures are
//! printed by the status logger and never interrupt the program.
//!
//! Run with: cargo run --example kafka_logging -- localhost:9092 app-logs

use kafka_log_appender::prelude::*;
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let servers = args.next().unwrap_or_else(|| "localhost:9092".to_string());
    let topic = args.next().unwrap_or_else(|| "app-logs".to_string());

    let config = KafkaAppenderConfig::new()
        .name("kafka")
        .topic(topic.as_str())
        .layout(LayoutConfig::json())
        .bootstrap_servers(servers.as_str())
        .property("linger.ms", "5")
        .property("message.timeout.ms", "5000");

    let Some(appender) = KafkaAppender::create(config) else {
        eprintln!("appender configuration rejected, see status output above");
        return;
    };

    let logger = Logger::builder().name("kafka-demo").appender(appender).build();

    for i in 0..10 {
        logger.log_event(
            &logger
                .event(LogLevel::Info, format!("demo message {}", i))
                .with_context_field("sequence", i),
        );
    }

    logger.stop();
    println!("Sent 10 records to {} on {}", topic, servers);
}
