//! # Kafka Log Appender
//!
//! A logging appender that publishes formatted log events to a Kafka topic.
//!
//! ## Features
//!
//! - **Non-blocking**: `append` only enqueues; delivery is acknowledged on the
//!   producer's own thread
//! - **Best effort**: delivery failures are reported on the status log and
//!   never reach the application
//! - **Configurable**: JSON or builder configuration with pattern and JSON
//!   layouts, threshold filters and arbitrary client properties
//! - **Clean shutdown**: stopping the appender drains every in-flight record

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;
pub mod producer;

pub mod prelude {
    pub use crate::appenders::KafkaAppender;
    pub use crate::config::{KafkaAppenderConfig, ProducerProperties, Property};
    pub use crate::core::{
        Appender, AppenderError, AppenderMetrics, Filter, FilterConfig, FilterResult, JsonLayout,
        Layout, LayoutConfig, LifeCycleState, LogEvent, LogLevel, Logger, LoggerBuilder,
        PatternLayout, Result, StatusLogger, ThresholdFilter, TimestampFormat,
    };
    pub use crate::producer::{MemoryProducer, Producer, ProducerRecord};
}

pub use appenders::KafkaAppender;
pub use config::{
    KafkaAppenderConfig, PayloadEncoding, ProducerProperties, Property, BOOTSTRAP_SERVERS,
    KEY_SERIALIZER, VALUE_SERIALIZER,
};
pub use core::{
    Appender, AppenderError, AppenderMetrics, Filter, FilterConfig, FilterResult, JsonLayout,
    Layout, LayoutConfig, LifeCycleState, LogEvent, LogLevel, Logger, LoggerBuilder,
    PatternLayout, Result, StatusEntry, StatusLogger, ThresholdFilter, TimestampFormat,
    DEFAULT_CONVERSION_PATTERN,
};
